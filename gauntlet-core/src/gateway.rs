//! The LLM gateway boundary.
//!
//! The gateway is the external service that executes model calls. This
//! module defines the trait the orchestration engine consumes and the
//! normalized shapes that cross the boundary: [`ChatMessage`] in,
//! [`ParsedResponse`] or [`GatewayError`] out. Transport implementations
//! (HTTP clients, vendor SDKs) live outside this workspace and translate
//! their own failures into [`GatewayError`] so that nothing downstream
//! depends on a specific library's error hierarchy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of the prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A normalized, fully-buffered model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResponse {
    /// The generated text.
    pub content: String,

    /// Optional structured payload (e.g. from JSON-mode generation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<serde_json::Value>,
}

impl ParsedResponse {
    /// Create a plain-text response.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            structured_data: None,
        }
    }

    /// Attach a structured payload.
    #[must_use]
    pub fn with_structured_data(mut self, data: serde_json::Value) -> Self {
        self.structured_data = Some(data);
        self
    }
}

/// Normalized transport error raised by gateway implementations.
///
/// Failure classification dispatches on this shape, so implementations
/// must map their library's failures here faithfully: connect/read
/// timeouts to [`Timeout`](GatewayError::Timeout), DNS and socket
/// problems to [`Network`](GatewayError::Network), non-2xx responses to
/// [`Status`](GatewayError::Status) with the body preserved when
/// available, and malformed payloads to [`Decode`](GatewayError::Decode).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The request did not complete within the transport's deadline
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// Connection-level failure before an HTTP status was received
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success HTTP status
    #[error("HTTP {code}: {message}")]
    Status {
        code: u16,
        message: String,
        body: Option<String>,
    },

    /// The response arrived but could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Anything the transport could not classify
    #[error("{0}")]
    Other(String),
}

/// The external boundary that executes model calls.
///
/// One call answers one prompt; retries, connection pooling, and rate
/// shaping belong to the implementation behind this trait.
///
/// # Example
///
/// ```
/// use gauntlet_core::{ChatMessage, GatewayError, LlmGateway, ParsedResponse};
/// use async_trait::async_trait;
/// use std::collections::HashMap;
///
/// struct EchoGateway;
///
/// #[async_trait]
/// impl LlmGateway for EchoGateway {
///     async fn answer(
///         &self,
///         _model: &str,
///         messages: &[ChatMessage],
///         _parameters: &HashMap<String, serde_json::Value>,
///     ) -> Result<ParsedResponse, GatewayError> {
///         let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Ok(ParsedResponse::text(last))
///     }
/// }
/// ```
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Execute one model call and return the normalized response.
    async fn answer(
        &self,
        model: &str,
        messages: &[ChatMessage],
        parameters: &HashMap<String, serde_json::Value>,
    ) -> Result<ParsedResponse, GatewayError>;
}
