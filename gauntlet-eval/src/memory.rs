//! In-memory repository implementations.
//!
//! Back the integration suite and embedded single-process use. Insertion
//! order is preserved for listings, and every write is atomic under an
//! `RwLock`. A poisoned lock is recovered rather than propagated - the
//! stores hold plain data that stays consistent even if a writer panicked
//! mid-call.

use crate::evaluation::{Evaluation, EvaluationStatus};
use crate::repository::{
    BenchmarkRepository, EvaluationRepository, QuestionResultRepository, RepositoryError,
};
use crate::results::EvaluationQuestionResult;
use async_trait::async_trait;
use gauntlet_core::Benchmark;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

fn read_store<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("{} store lock poisoned while reading - recovering", what);
            poisoned.into_inner()
        }
    }
}

fn write_store<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("{} store lock poisoned while writing - recovering", what);
            poisoned.into_inner()
        }
    }
}

/// Benchmark store over a vector in ingestion order.
#[derive(Debug, Default)]
pub struct InMemoryBenchmarkRepository {
    benchmarks: RwLock<Vec<Benchmark>>,
}

impl InMemoryBenchmarkRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a benchmark; fails with [`RepositoryError::Duplicate`] when the
    /// id or name is already taken.
    pub fn insert(&self, benchmark: Benchmark) -> Result<(), RepositoryError> {
        let mut benchmarks = write_store(&self.benchmarks, "benchmark");
        if benchmarks
            .iter()
            .any(|b| b.id() == benchmark.id() || b.name() == benchmark.name())
        {
            return Err(RepositoryError::Duplicate(format!(
                "benchmark {}",
                benchmark.id()
            )));
        }
        benchmarks.push(benchmark);
        Ok(())
    }
}

#[async_trait]
impl BenchmarkRepository for InMemoryBenchmarkRepository {
    async fn get_by_name(&self, name: &str) -> Result<Benchmark, RepositoryError> {
        read_store(&self.benchmarks, "benchmark")
            .iter()
            .find(|b| b.name() == name)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("benchmark named '{}'", name)))
    }

    async fn get_by_id(&self, id: &str) -> Result<Benchmark, RepositoryError> {
        read_store(&self.benchmarks, "benchmark")
            .iter()
            .find(|b| b.id() == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("benchmark {}", id)))
    }

    async fn list_all(&self) -> Result<Vec<Benchmark>, RepositoryError> {
        Ok(read_store(&self.benchmarks, "benchmark").clone())
    }
}

/// Evaluation store over a vector in creation order.
#[derive(Debug, Default)]
pub struct InMemoryEvaluationRepository {
    evaluations: RwLock<Vec<Evaluation>>,
}

impl InMemoryEvaluationRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored evaluations.
    pub fn len(&self) -> usize {
        read_store(&self.evaluations, "evaluation").len()
    }

    /// Check whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EvaluationRepository for InMemoryEvaluationRepository {
    async fn save(&self, evaluation: &Evaluation) -> Result<(), RepositoryError> {
        let mut evaluations = write_store(&self.evaluations, "evaluation");
        if evaluations
            .iter()
            .any(|e| e.evaluation_id() == evaluation.evaluation_id())
        {
            return Err(RepositoryError::Duplicate(format!(
                "evaluation {}",
                evaluation.evaluation_id()
            )));
        }
        evaluations.push(evaluation.clone());
        Ok(())
    }

    async fn update(&self, evaluation: &Evaluation) -> Result<(), RepositoryError> {
        let mut evaluations = write_store(&self.evaluations, "evaluation");
        match evaluations
            .iter_mut()
            .find(|e| e.evaluation_id() == evaluation.evaluation_id())
        {
            Some(stored) => {
                *stored = evaluation.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!(
                "evaluation {}",
                evaluation.evaluation_id()
            ))),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Evaluation, RepositoryError> {
        read_store(&self.evaluations, "evaluation")
            .iter()
            .find(|e| e.evaluation_id() == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("evaluation {}", id)))
    }

    async fn list_all(&self) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(read_store(&self.evaluations, "evaluation").clone())
    }

    async fn list_by_status(
        &self,
        status: EvaluationStatus,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(read_store(&self.evaluations, "evaluation")
            .iter()
            .filter(|e| e.status() == status)
            .cloned()
            .collect())
    }
}

/// Question-result store preserving save order.
#[derive(Debug, Default)]
pub struct InMemoryQuestionResultRepository {
    results: RwLock<Vec<EvaluationQuestionResult>>,
}

impl InMemoryQuestionResultRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionResultRepository for InMemoryQuestionResultRepository {
    async fn save(&self, result: &EvaluationQuestionResult) -> Result<(), RepositoryError> {
        let mut results = write_store(&self.results, "question-result");
        if results.iter().any(|r| {
            r.evaluation_id() == result.evaluation_id() && r.question_id() == result.question_id()
        }) {
            return Err(RepositoryError::Duplicate(format!(
                "result for evaluation {} question {}",
                result.evaluation_id(),
                result.question_id()
            )));
        }
        results.push(result.clone());
        Ok(())
    }

    async fn list_by_evaluation(
        &self,
        evaluation_id: Uuid,
    ) -> Result<Vec<EvaluationQuestionResult>, RepositoryError> {
        Ok(read_store(&self.results, "question-result")
            .iter()
            .filter(|r| r.evaluation_id() == evaluation_id)
            .cloned()
            .collect())
    }
}
