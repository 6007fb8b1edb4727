pub mod gigachat;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::report::ErrorKind;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Chat API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status or a body without `choices[0].message.content`.
    #[error("Unexpected chat API response: {0}")]
    UnexpectedResponse(String),
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Request(e) if e.is_decode() => ErrorKind::Protocol,
            LlmError::Request(_) => ErrorKind::Transport,
            LlmError::UnexpectedResponse(_) => ErrorKind::Protocol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat-completion endpoint.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send the conversation and return the generated text.
    async fn complete(&self, messages: &[ChatMessage], temperature: f64)
        -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::system("hi")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hi");
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
    }

    #[test]
    fn test_unexpected_response_is_protocol_error() {
        assert_eq!(
            LlmError::UnexpectedResponse("{}".to_string()).kind(),
            ErrorKind::Protocol
        );
    }
}
