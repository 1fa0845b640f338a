//! Failure taxonomy and classification.
//!
//! Every per-question failure is classified into a closed set of
//! [`FailureCategory`] values and carried as an immutable
//! [`FailureReason`] with a recoverability tag, a timestamp, and enough
//! technical detail to reconstruct the original cause without holding the
//! original error across the domain boundary.

use crate::agent::AgentServiceError;
use crate::benchmark::InvariantViolation;
use crate::gateway::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Phrase groups for classifying HTTP 400 bodies, checked in order.
const TOKEN_LIMIT_PHRASES: &[&str] = &[
    "maximum context length",
    "context length exceeded",
    "context_length_exceeded",
    "token limit",
    "too many tokens",
    "prompt is too long",
];

const GUARDRAIL_PHRASES: &[&str] = &[
    "content policy",
    "content filter",
    "safety system",
    "blocked by safety",
    "flagged as potentially violating",
];

const REFUSAL_PHRASES: &[&str] = &[
    "cannot provide",
    "unable to assist",
    "cannot assist",
    "decline",
    "i cannot help",
];

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// The model response could not be parsed or decoded
    ParsingError,
    /// The request exceeded the model's context window
    TokenLimitExceeded,
    /// The backend's safety layer blocked the request or response
    ContentGuardrail,
    /// The model declined to answer
    ModelRefusal,
    /// The request timed out or never reached the backend
    NetworkTimeout,
    /// The backend throttled the request
    RateLimitExceeded,
    /// The account has no remaining credit
    CreditLimitExceeded,
    /// The credentials were rejected
    AuthenticationError,
    /// Nothing else matched
    Unknown,
}

impl FailureCategory {
    /// Stable snake_case identifier, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::ParsingError => "parsing_error",
            FailureCategory::TokenLimitExceeded => "token_limit_exceeded",
            FailureCategory::ContentGuardrail => "content_guardrail",
            FailureCategory::ModelRefusal => "model_refusal",
            FailureCategory::NetworkTimeout => "network_timeout",
            FailureCategory::RateLimitExceeded => "rate_limit_exceeded",
            FailureCategory::CreditLimitExceeded => "credit_limit_exceeded",
            FailureCategory::AuthenticationError => "authentication_error",
            FailureCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, recoverability-tagged description of a failure.
///
/// Immutable once constructed. `recoverable` marks failures that do not
/// indicate a structural problem with the request and could succeed on a
/// retry (timeouts, rate limits, transient server errors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReason {
    category: FailureCategory,
    description: String,
    technical_details: String,
    occurred_at: SystemTime,
    recoverable: bool,
}

impl FailureReason {
    /// Create a failure reason, rejecting an empty or whitespace-only
    /// description.
    pub fn new(
        category: FailureCategory,
        description: impl Into<String>,
        technical_details: impl Into<String>,
        recoverable: bool,
    ) -> Result<Self, InvariantViolation> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(InvariantViolation::EmptyField("description"));
        }

        Ok(Self {
            category,
            description,
            technical_details: technical_details.into(),
            occurred_at: SystemTime::now(),
            recoverable,
        })
    }

    /// Classify a normalized transport error.
    ///
    /// First match wins, in this order: transport timeouts, other
    /// network failures, HTTP status dispatch, decode failures, and an
    /// unknown fallback that names the original error.
    pub fn from_gateway_error(error: &GatewayError) -> Self {
        match error {
            GatewayError::Timeout(ms) => Self::build(
                FailureCategory::NetworkTimeout,
                "The model request timed out",
                format!("gateway timeout after {}ms", ms),
                true,
            ),
            GatewayError::Network(message) => Self::build(
                FailureCategory::NetworkTimeout,
                "A network error prevented the model request",
                format!("network error: {}", message),
                true,
            ),
            GatewayError::Status {
                code,
                message,
                body,
            } => Self::from_status(*code, message, body.as_deref()),
            GatewayError::Decode(message) => Self::build(
                FailureCategory::ParsingError,
                "The model response could not be decoded",
                format!("decode error: {}", message),
                false,
            ),
            other => Self::build(
                FailureCategory::Unknown,
                "The model request failed for an unclassified reason",
                format!("unclassified gateway error: {}", other),
                false,
            ),
        }
    }

    /// Classify a strategy-level error (transport errors are delegated to
    /// [`from_gateway_error`](Self::from_gateway_error)).
    pub fn from_service_error(error: &AgentServiceError) -> Self {
        match error {
            AgentServiceError::Gateway(gateway_error) => Self::from_gateway_error(gateway_error),
            AgentServiceError::ResponseParse(message) => Self::build(
                FailureCategory::ParsingError,
                "The model response could not be interpreted as an answer",
                format!("response parse error: {}", message),
                false,
            ),
            other => Self::build(
                FailureCategory::Unknown,
                "The reasoning strategy failed for an unclassified reason",
                format!("unclassified strategy error ({})", other),
                false,
            ),
        }
    }

    /// Category from the closed taxonomy.
    pub fn category(&self) -> FailureCategory {
        self.category
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Detail sufficient to reconstruct the original cause.
    pub fn technical_details(&self) -> &str {
        &self.technical_details
    }

    /// When the failure was classified.
    pub fn occurred_at(&self) -> SystemTime {
        self.occurred_at
    }

    /// Whether a retry of the same request could succeed.
    pub fn recoverable(&self) -> bool {
        self.recoverable
    }

    /// HTTP status dispatch. 400 bodies are inspected against ordered
    /// keyword groups; unknown 4xx are terminal, 5xx are transient.
    fn from_status(code: u16, message: &str, body: Option<&str>) -> Self {
        let technical = match body {
            Some(body) => format!("HTTP {}: {} | body: {}", code, message, body),
            None => format!("HTTP {}: {}", code, message),
        };

        match code {
            429 => Self::build(
                FailureCategory::RateLimitExceeded,
                "The model backend rate-limited the request",
                technical,
                true,
            ),
            401 => Self::build(
                FailureCategory::AuthenticationError,
                "The model backend rejected the credentials",
                technical,
                false,
            ),
            402 => Self::build(
                FailureCategory::CreditLimitExceeded,
                "The model backend reported an exhausted credit balance",
                technical,
                false,
            ),
            400 => {
                let haystack = match body {
                    Some(body) => format!("{} {}", message, body).to_lowercase(),
                    None => message.to_lowercase(),
                };
                let (category, description) = if contains_any(&haystack, TOKEN_LIMIT_PHRASES) {
                    (
                        FailureCategory::TokenLimitExceeded,
                        "The request exceeded the model's context window",
                    )
                } else if contains_any(&haystack, GUARDRAIL_PHRASES) {
                    (
                        FailureCategory::ContentGuardrail,
                        "The backend's safety layer blocked the request",
                    )
                } else if contains_any(&haystack, REFUSAL_PHRASES) {
                    (
                        FailureCategory::ModelRefusal,
                        "The model declined to answer the question",
                    )
                } else {
                    (
                        FailureCategory::Unknown,
                        "The model backend rejected the request",
                    )
                };
                Self::build(category, description, technical, false)
            }
            500..=599 => Self::build(
                FailureCategory::Unknown,
                "The model backend reported a server error",
                technical,
                true,
            ),
            _ => Self::build(
                FailureCategory::Unknown,
                "The model backend rejected the request",
                technical,
                false,
            ),
        }
    }

    /// Internal constructor for descriptions known to be non-empty.
    fn build(
        category: FailureCategory,
        description: &str,
        technical_details: String,
        recoverable: bool,
    ) -> Self {
        Self {
            category,
            description: description.to_string(),
            technical_details,
            occurred_at: SystemTime::now(),
            recoverable,
        }
    }
}

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| haystack.contains(phrase))
}
