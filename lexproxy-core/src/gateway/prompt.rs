//! Task-specific instruction building
//!
//! Every call sends one user turn holding the whole instruction. Generation
//! parameters come from the task profile; callers cannot override them.

use crate::config::TaskProfile;
use crate::protocol::{
    GatewayRequest, GenerateContentRequest, GenerationConfig, Payload, Speaker, Task,
};

/// Preamble placed before every legal-assistant question
pub const CHAT_PREAMBLE: &str = "You are a helpful legal assistant.";

/// Returned when a chat response carries no text
pub const CHAT_PLACEHOLDER: &str = "Sorry, no response from AI.";

/// Returned when a translation response carries no text
pub const TRANSLATE_PLACEHOLDER: &str = "No translation available.";

/// Text substituted for a successful response without a candidate text
pub fn placeholder(task: Task) -> &'static str {
    match task {
        Task::Chat => CHAT_PLACEHOLDER,
        Task::Translate => TRANSLATE_PLACEHOLDER,
    }
}

/// Render the instruction string for a request
pub fn instruction(request: &GatewayRequest) -> String {
    match request.payload() {
        Payload::Chat { message, history } if history.is_empty() => {
            format!("{} Answer this question concisely: {}", CHAT_PREAMBLE, message)
        }
        Payload::Chat { message, history } => {
            let mut text = format!("{} Conversation so far:\n", CHAT_PREAMBLE);
            for turn in history {
                let speaker = match turn.speaker {
                    Speaker::User => "User",
                    Speaker::Assistant => "Assistant",
                };
                text.push_str(speaker);
                text.push_str(": ");
                text.push_str(&turn.text);
                text.push('\n');
            }
            text.push_str("Answer this question concisely: ");
            text.push_str(message);
            text
        }
        Payload::Translate {
            text,
            target_language,
        } => format!("Translate this into {}: {}", target_language, text),
    }
}

/// Build the `generateContent` body for a request
pub fn build_body(request: &GatewayRequest, profile: &TaskProfile) -> GenerateContentRequest {
    GenerateContentRequest::user_instruction(
        instruction(request),
        GenerationConfig {
            temperature: profile.temperature,
            candidate_count: 1,
            max_output_tokens: profile.max_output_tokens,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Turn;

    #[test]
    fn test_chat_instruction() {
        let request = GatewayRequest::chat("What is consideration in contract law?");
        assert_eq!(
            instruction(&request),
            "You are a helpful legal assistant. Answer this question concisely: What is consideration in contract law?"
        );
    }

    #[test]
    fn test_translate_instruction() {
        let request = GatewayRequest::translate("Know your rights", "Hindi");
        assert_eq!(instruction(&request), "Translate this into Hindi: Know your rights");
    }

    #[test]
    fn test_history_rendered_in_order() {
        let request = GatewayRequest::chat_with_history(
            "And in India?",
            vec![
                Turn::user("What is bail?"),
                Turn::assistant("Bail is temporary release."),
            ],
        );
        assert_eq!(
            instruction(&request),
            "You are a helpful legal assistant. Conversation so far:\n\
             User: What is bail?\n\
             Assistant: Bail is temporary release.\n\
             Answer this question concisely: And in India?"
        );
    }

    #[test]
    fn test_body_uses_task_profile() {
        let body = build_body(&GatewayRequest::translate("Hi", "fr"), &TaskProfile::translate());
        assert_eq!(body.generation_config.max_output_tokens, 250);
        assert_eq!(body.generation_config.candidate_count, 1);
        assert_eq!(body.contents[0].role.as_deref(), Some("user"));
    }
}
