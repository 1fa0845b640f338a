//! # Gauntlet Eval
//!
//! Evaluation lifecycle for reasoning agents: measure how well a
//! configured agent answers a fixed benchmark of questions, tolerating the
//! partial and heterogeneous failures of third-party model APIs.
//!
//! ## Architecture
//!
//! ```text
//! gauntlet-core (strategies, registry, gateway boundary, failure taxonomy)
//!     |
//! gauntlet-eval (evaluation aggregate, repositories, orchestrator)  <- this crate
//! ```
//!
//! The [`EvaluationOrchestrator`] owns one run end to end:
//!
//! - `create_evaluation` validates the agent configuration, resolves the
//!   benchmark, and persists a pending [`Evaluation`]
//! - `execute_evaluation` walks the questions strictly sequentially,
//!   classifying every failure into the closed taxonomy and recording one
//!   [`EvaluationQuestionResult`] per question, then aggregates
//!   [`EvaluationResults`] and completes the run
//! - per-question failures never abort a run; only load and persistence
//!   failures do
//!
//! ## Quick start
//!
//! ```
//! use gauntlet_core::{AgentConfig, Benchmark, Question, ScriptedGateway};
//! use gauntlet_eval::{
//!     EvaluationOrchestrator, EvaluationStatus, InMemoryBenchmarkRepository,
//!     InMemoryEvaluationRepository, InMemoryQuestionResultRepository,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let benchmarks = Arc::new(InMemoryBenchmarkRepository::new());
//! benchmarks.insert(Benchmark::new(
//!     "bench-1",
//!     "GPQA",
//!     "Graduate-level QA",
//!     vec![
//!         Question::new("q1", "What is 2+2?", "4")?,
//!         Question::new("q2", "Capital of France?", "Paris")?,
//!     ],
//! )?)?;
//!
//! let orchestrator = EvaluationOrchestrator::new(
//!     benchmarks,
//!     Arc::new(InMemoryEvaluationRepository::new()),
//!     Arc::new(InMemoryQuestionResultRepository::new()),
//!     Arc::new(ScriptedGateway::answering(["4", "Paris"])),
//! );
//!
//! let config = AgentConfig::new("none", "google", "gemini-3-flash-preview");
//! let id = orchestrator.create_evaluation(config, "GPQA").await?;
//! orchestrator.execute_evaluation(id).await?;
//!
//! assert_eq!(orchestrator.get_evaluation_status(id).await?, EvaluationStatus::Completed);
//! let results = orchestrator.get_evaluation_results(id).await?;
//! assert_eq!(results.accuracy(), 100.0);
//! # Ok(())
//! # }
//! ```

pub mod evaluation;
pub mod memory;
pub mod orchestrator;
pub mod repository;
pub mod results;

// Re-export public API
pub use evaluation::{Evaluation, EvaluationStatus, StateTransitionError};
pub use memory::{
    InMemoryBenchmarkRepository, InMemoryEvaluationRepository, InMemoryQuestionResultRepository,
};
pub use orchestrator::{
    EvaluationInfo, EvaluationOrchestrator, OrchestratorConfig, OrchestratorError, ProgressInfo,
};
pub use repository::{
    BenchmarkRepository, EvaluationRepository, QuestionResultRepository, RepositoryError,
};
pub use results::{EvaluationQuestionResult, EvaluationResults, ResultShapeError};
