//! Repository contracts.
//!
//! The repositories are the system of record; the orchestration engine
//! treats them as request/response collaborators and never caches across
//! calls. Implementations decide durability and atomicity - each persisted
//! transition must be atomic from the engine's point of view.
//!
//! In-memory implementations for tests and embedded use live in
//! [`crate::memory`].

use crate::evaluation::{Evaluation, EvaluationStatus};
use crate::results::EvaluationQuestionResult;
use async_trait::async_trait;
use gauntlet_core::Benchmark;
use thiserror::Error;
use uuid::Uuid;

/// Failures raised by repository implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RepositoryError {
    /// No entity matched the given key
    #[error("entity not found: {0}")]
    NotFound(String),

    /// An entity with the given key already exists
    #[error("duplicate entity: {0}")]
    Duplicate(String),

    /// The backing store failed
    #[error("storage error: {0}")]
    Storage(String),
}

/// Read access to ingested benchmarks.
#[async_trait]
pub trait BenchmarkRepository: Send + Sync {
    /// Look a benchmark up by its human-facing name.
    async fn get_by_name(&self, name: &str) -> Result<Benchmark, RepositoryError>;

    /// Look a benchmark up by its identifier.
    async fn get_by_id(&self, id: &str) -> Result<Benchmark, RepositoryError>;

    /// All benchmarks, in ingestion order.
    async fn list_all(&self) -> Result<Vec<Benchmark>, RepositoryError>;
}

/// Persistence for evaluation aggregates.
#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// Persist a new evaluation; fails with
    /// [`RepositoryError::Duplicate`] if the id already exists.
    async fn save(&self, evaluation: &Evaluation) -> Result<(), RepositoryError>;

    /// Persist a state change to an existing evaluation; fails with
    /// [`RepositoryError::NotFound`] if it was never saved.
    async fn update(&self, evaluation: &Evaluation) -> Result<(), RepositoryError>;

    /// Load an evaluation by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Evaluation, RepositoryError>;

    /// All evaluations, in creation order.
    async fn list_all(&self) -> Result<Vec<Evaluation>, RepositoryError>;

    /// Evaluations currently in the given state, in creation order.
    async fn list_by_status(
        &self,
        status: EvaluationStatus,
    ) -> Result<Vec<Evaluation>, RepositoryError>;
}

/// Persistence for per-question results, keyed by
/// `(evaluation_id, question_id)`.
#[async_trait]
pub trait QuestionResultRepository: Send + Sync {
    /// Persist one question result; fails with
    /// [`RepositoryError::Duplicate`] if the key already exists.
    async fn save(&self, result: &EvaluationQuestionResult) -> Result<(), RepositoryError>;

    /// All results for an evaluation, in the order they were saved.
    async fn list_by_evaluation(
        &self,
        evaluation_id: Uuid,
    ) -> Result<Vec<EvaluationQuestionResult>, RepositoryError>;
}
