//! # Gauntlet Core
//!
//! Core abstractions for benchmarking reasoning agents against question
//! corpora through a language-model backend.
//!
//! This crate carries the pieces an evaluation engine composes:
//!
//! - **Corpus records**: immutable [`Question`] and [`Benchmark`] value
//!   objects
//! - **Configuration**: [`AgentConfig`] with an explicit, non-throwing
//!   [`validate_configuration`](AgentConfig::validate_configuration) step
//! - **Strategies**: the [`ReasoningAgentService`] trait, the built-in
//!   direct and chain-of-thought implementations, and a rebuildable
//!   [`AgentServiceRegistry`]
//! - **Gateway boundary**: the [`LlmGateway`] trait with normalized
//!   request/response/error shapes, plus a [`ScriptedGateway`] for
//!   offline testing
//! - **Failure taxonomy**: the closed [`FailureCategory`] set and the
//!   classification rules that turn gateway and strategy errors into
//!   [`FailureReason`] records
//!
//! The evaluation lifecycle itself (aggregates, repositories, the
//! orchestrator) lives in `gauntlet-eval`.
//!
//! ## Example
//!
//! ```
//! use gauntlet_core::{
//!     AgentConfig, AgentServiceRegistry, ChatMessage, ParsedResponse, Question,
//! };
//!
//! let question = Question::new("q1", "What is 2+2?", "4").unwrap();
//! let config = AgentConfig::new("chain_of_thought", "google", "gemini-3-flash-preview");
//!
//! let registry = AgentServiceRegistry::default();
//! let service = registry.create_service(config.agent_type()).unwrap();
//!
//! let prompt = service.process_question(&question, &config);
//! assert_eq!(prompt.messages.len(), 2);
//!
//! // The gateway call happens between the two phases; here we fake it.
//! let response = ParsedResponse::text("2+2 makes 4.\nAnswer: 4");
//! let answer = service.process_response(&response, &question).unwrap();
//! assert!(service.judge(&answer.text, question.expected_answer()));
//! ```

pub mod agent;
pub mod benchmark;
pub mod config;
pub mod failure;
pub mod gateway;
pub mod mock_gateway;

// Re-export public API
pub use agent::registry::{AgentServiceRegistry, ServiceFactory, UnknownAgentType};
pub use agent::{
    AgentServiceError, Answer, ChainOfThoughtService, DirectService, PreparedPrompt,
    ReasoningAgentService, CHAIN_OF_THOUGHT_AGENT_TYPE, DIRECT_AGENT_TYPE,
};
pub use benchmark::{Benchmark, InvariantViolation, Question};
pub use config::{AgentConfig, ValidationResult};
pub use failure::{FailureCategory, FailureReason};
pub use gateway::{ChatMessage, GatewayError, LlmGateway, ParsedResponse, Role};
pub use mock_gateway::ScriptedGateway;
