//! Core protocol types for the gateway
//!
//! Two families live here:
//! - Domain types: the caller's request (`GatewayRequest`) and the replies
//!   returned by the caller-facing operations
//! - Wire types for the upstream `generateContent` endpoint
//!
//! Wire types are deliberately narrow: only the fields this gateway sends
//! or reads are modelled, everything else in an upstream response is
//! ignored during deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of work a request asks the upstream model to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Legal-assistant question answering
    Chat,
    /// Translation of a text into a target language
    Translate,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Chat => "chat",
            Task::Translate => "translate",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One prior turn of a caller-maintained conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Task-specific request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "lowercase")]
pub enum Payload {
    Chat {
        message: String,
        /// Earlier turns, oldest first. The gateway keeps no state of its own.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        history: Vec<Turn>,
    },
    Translate {
        text: String,
        #[serde(rename = "targetLanguage")]
        target_language: String,
    },
}

/// Input rejected before any upstream call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InputError {
    /// Offending field (`message`, `text`, `targetLanguage`)
    pub field: &'static str,
    pub message: String,
}

impl InputError {
    fn missing(task: Task, field: &'static str) -> Self {
        Self {
            field,
            message: format!("{} request requires a non-empty '{}'", task, field),
        }
    }
}

/// A single caller invocation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
    #[serde(flatten)]
    payload: Payload,
}

impl GatewayRequest {
    /// Chat request for a single question
    pub fn chat(message: impl Into<String>) -> Self {
        Self {
            payload: Payload::Chat {
                message: message.into(),
                history: Vec::new(),
            },
        }
    }

    /// Chat request continuing a caller-supplied transcript
    pub fn chat_with_history(message: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            payload: Payload::Chat {
                message: message.into(),
                history,
            },
        }
    }

    /// Translation request
    pub fn translate(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            payload: Payload::Translate {
                text: text.into(),
                target_language: target_language.into(),
            },
        }
    }

    pub fn task(&self) -> Task {
        match self.payload {
            Payload::Chat { .. } => Task::Chat,
            Payload::Translate { .. } => Task::Translate,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Check the payload fields required by the task
    pub fn validate(&self) -> Result<(), InputError> {
        match &self.payload {
            Payload::Chat { message, .. } => {
                if message.trim().is_empty() {
                    return Err(InputError::missing(Task::Chat, "message"));
                }
            }
            Payload::Translate {
                text,
                target_language,
            } => {
                if text.trim().is_empty() {
                    return Err(InputError::missing(Task::Translate, "text"));
                }
                if target_language.trim().is_empty() {
                    return Err(InputError::missing(Task::Translate, "targetLanguage"));
                }
            }
        }
        Ok(())
    }
}

/// Reply of the caller-facing `chat` operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    /// Name of the model that produced the response
    pub model: String,
}

/// Reply of the caller-facing `translate` operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateReply {
    pub translation: String,
}

// ---------------------------------------------------------------------------
// generateContent wire format
// ---------------------------------------------------------------------------

/// Body of `POST {base}/models/{model}:generateContent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Single user turn carrying the whole instruction
    pub fn user_instruction(instruction: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(instruction.into()),
                }],
            }],
            generation_config: config,
        }
    }
}

/// A role-tagged list of parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Content part; only text parts are used
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Sampling parameters sent with every call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub candidate_count: u32,
    pub max_output_tokens: u32,
}

/// Successful `generateContent` response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated response option
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Result of looking for the generated text in a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedText {
    Parsed(String),
    Missing,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate
    pub fn first_text(&self) -> ParsedText {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.clone())
            .map(ParsedText::Parsed)
            .unwrap_or(ParsedText::Missing)
    }

    /// Parse a raw body; anything that is not a well-formed response has no text
    pub fn parse_text(body: &str) -> ParsedText {
        match serde_json::from_str::<GenerateContentResponse>(body) {
            Ok(response) => response.first_text(),
            Err(_) => ParsedText::Missing,
        }
    }
}
