//! Protocol module for gateway request/response structures
//!
//! Defines the caller-side request and reply types, plus the subset of the
//! upstream `generateContent` wire format the gateway speaks.

pub mod types;

pub use types::{
    Candidate, ChatReply, Content, GatewayRequest, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, InputError, Part, ParsedText, Payload, Speaker,
    Task, TranslateReply, Turn,
};
