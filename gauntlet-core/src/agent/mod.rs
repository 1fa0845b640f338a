//! Reasoning-strategy abstraction.
//!
//! A [`ReasoningAgentService`] turns a [`Question`] into an [`Answer`]
//! through the LLM gateway. The contract is split into two pure phases -
//! [`process_question`](ReasoningAgentService::process_question) builds the
//! prompt and [`process_response`](ReasoningAgentService::process_response)
//! interprets the raw response - so that parsing failures can be attributed
//! separately from transport failures. The gateway call between the phases
//! is driven by the orchestration engine, which keeps strategies free of
//! I/O and trivially testable.
//!
//! ## Available strategies
//!
//! - [`DirectService`] ("none"): single prompt, no intermediate reasoning
//! - [`ChainOfThoughtService`]: single-pass reasoning trace before a marked
//!   final answer
//!
//! Further strategies register at runtime through
//! [`AgentServiceRegistry::register_service`](registry::AgentServiceRegistry::register_service).

mod chain_of_thought;
mod direct;
pub mod registry;

pub use chain_of_thought::{ChainOfThoughtService, CHAIN_OF_THOUGHT_AGENT_TYPE};
pub use direct::{DirectService, DIRECT_AGENT_TYPE};

use crate::benchmark::Question;
use crate::config::AgentConfig;
use crate::gateway::{ChatMessage, GatewayError, ParsedResponse};
use thiserror::Error;

/// Errors raised by reasoning strategies.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgentServiceError {
    /// The gateway call failed
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The raw response could not be interpreted as an answer
    #[error("failed to parse response: {0}")]
    ResponseParse(String),

    /// The configuration is not usable by this strategy
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Prompt materials produced by a strategy for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPrompt {
    /// Messages in conversation order.
    pub messages: Vec<ChatMessage>,
}

impl PreparedPrompt {
    /// Create a prompt from an ordered message list.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}

/// A strategy's interpretation of one model response.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// The extracted final answer, ready for comparison.
    pub text: String,

    /// Intermediate reasoning, when the strategy produces one.
    pub reasoning_trace: Option<String>,
}

impl Answer {
    /// Create an answer without a reasoning trace.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reasoning_trace: None,
        }
    }

    /// Attach the reasoning that led to the answer.
    #[must_use]
    pub fn with_reasoning_trace(mut self, trace: impl Into<String>) -> Self {
        self.reasoning_trace = Some(trace.into());
        self
    }
}

/// A pluggable algorithm that answers benchmark questions via the gateway.
///
/// Implementations must be stateless across questions, or tolerate being
/// rebuilt per evaluation run: the engine creates a fresh instance set for
/// every execution.
pub trait ReasoningAgentService: Send + Sync {
    /// Stable identifier used as the registry key.
    fn agent_type(&self) -> &str;

    /// Strategy-specific acceptance check for a configuration.
    ///
    /// Runs after the generic rules in
    /// [`AgentConfig::validate_configuration`], typically to require the
    /// strategy's own `agent_parameters`.
    fn validate_config(&self, config: &AgentConfig) -> bool;

    /// Build the prompt for one question.
    fn process_question(&self, question: &Question, config: &AgentConfig) -> PreparedPrompt;

    /// Interpret the raw response into an [`Answer`].
    fn process_response(
        &self,
        response: &ParsedResponse,
        question: &Question,
    ) -> Result<Answer, AgentServiceError>;

    /// Decide whether an extracted answer matches the expectation.
    ///
    /// The baseline comparator is exact string equality; strategies that
    /// need something looser should refine their extraction in
    /// [`process_response`](Self::process_response) rather than weaken the
    /// comparison.
    fn judge(&self, actual: &str, expected: &str) -> bool {
        actual == expected
    }
}
