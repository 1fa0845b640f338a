//! Evaluation orchestration engine.
//!
//! The [`EvaluationOrchestrator`] owns the life-cycle of one evaluation
//! run: it creates the aggregate, dispatches each question through the
//! configured reasoning strategy, classifies failures, aggregates results,
//! and drives every state transition through the repositories.
//!
//! Per-question failures are expected and recovered locally - they become
//! [`EvaluationQuestionResult`] records and never abort the run. Only
//! load-time and persistence failures are fatal.
//!
//! The question loop is strictly sequential: each gateway call is awaited
//! to completion before the next begins, so one running evaluation holds
//! at most one in-flight model call. Callers may run independent
//! evaluations concurrently, bounded by whatever budget they enforce; a
//! single `evaluation_id` must not be executed twice at once.

use crate::evaluation::{Evaluation, EvaluationStatus, StateTransitionError};
use crate::repository::{
    BenchmarkRepository, EvaluationRepository, QuestionResultRepository, RepositoryError,
};
use crate::results::{EvaluationQuestionResult, EvaluationResults};
use gauntlet_core::{
    AgentConfig, AgentServiceRegistry, FailureCategory, FailureReason, LlmGateway, Question,
    ReasoningAgentService, UnknownAgentType,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrchestratorError {
    /// No benchmark matched the given name or id
    #[error("benchmark not found: {0}")]
    BenchmarkNotFound(String),

    /// No evaluation matched the given id
    #[error("evaluation not found: {0}")]
    EvaluationNotFound(Uuid),

    /// The agent configuration failed validation
    #[error("invalid agent configuration: {errors}", errors = .0.join("; "))]
    InvalidConfiguration(Vec<String>),

    /// Results were requested before the evaluation completed
    #[error("evaluation {id} is not completed (status: {status})")]
    NotCompleted {
        id: Uuid,
        status: EvaluationStatus,
    },

    /// The configured agent type vanished between creation and execution
    #[error("agent type no longer registered: {0}")]
    UnsupportedAgentType(#[from] UnknownAgentType),

    /// A repository call failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A state transition was rejected (e.g. executing a terminal run)
    #[error(transparent)]
    State(#[from] StateTransitionError),
}

/// Tuning knobs for the orchestration engine.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OrchestratorConfig {
    /// Additional attempts per question after the initial try, taken only
    /// when the classified failure is recoverable (default: 0).
    ///
    /// `max_retries = 1` means up to 2 total attempts per question.
    pub max_retries: usize,

    /// When set, a run whose failed fraction exceeds this threshold ends
    /// `Failed` instead of `Completed` (default: `None`, meaning
    /// accumulated per-question failures never fail a run).
    ///
    /// Expressed as a fraction in `(0, 1]`.
    pub failure_rate_threshold: Option<f64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            failure_rate_threshold: None,
        }
    }
}

impl OrchestratorConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of additional attempts per question.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the failure-rate threshold that forces a `Failed` outcome.
    #[must_use]
    pub fn with_failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.failure_rate_threshold = Some(threshold);
        self
    }
}

/// Advisory progress snapshot passed to the execution callback.
///
/// `current_question` increases monotonically in benchmark order. The
/// callback never affects control flow.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ProgressInfo {
    /// 1-based index of the question that just finished.
    pub current_question: usize,

    /// Total number of questions in the benchmark.
    pub total_questions: usize,

    /// Questions answered successfully so far.
    pub succeeded: usize,

    /// Questions failed so far.
    pub failed: usize,

    /// Wall-clock time since the loop started.
    pub elapsed: Duration,
}

/// Read-only projection joining evaluation and benchmark data.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EvaluationInfo {
    /// Evaluation identifier.
    pub evaluation_id: Uuid,

    /// Identifier of the benchmark being run.
    pub benchmark_id: String,

    /// Benchmark name, when the benchmark still resolves.
    pub benchmark_name: Option<String>,

    /// Configured strategy identifier.
    pub agent_type: String,

    /// Configured model identifier.
    pub model_name: String,

    /// Current lifecycle state.
    pub status: EvaluationStatus,

    /// When the evaluation was created.
    pub created_at: SystemTime,

    /// When the run reached a terminal state, if it has.
    pub completed_at: Option<SystemTime>,

    /// Accuracy percentage, present once completed.
    pub accuracy: Option<f64>,

    /// Failed-question count, present once completed.
    pub error_count: Option<usize>,
}

/// Composes repositories, gateway, and the strategy registry to drive one
/// evaluation from creation to completion.
///
/// Stateless with respect to other evaluations: every operation loads what
/// it needs and persists what it changed.
///
/// # Example
///
/// ```no_run
/// use gauntlet_eval::{EvaluationOrchestrator, InMemoryBenchmarkRepository,
///     InMemoryEvaluationRepository, InMemoryQuestionResultRepository};
/// use gauntlet_core::{AgentConfig, ScriptedGateway};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let benchmarks = Arc::new(InMemoryBenchmarkRepository::new());
/// let gateway = Arc::new(ScriptedGateway::answering(["4", "Paris"]));
///
/// let orchestrator = EvaluationOrchestrator::new(
///     benchmarks,
///     Arc::new(InMemoryEvaluationRepository::new()),
///     Arc::new(InMemoryQuestionResultRepository::new()),
///     gateway,
/// );
///
/// let config = AgentConfig::new("none", "google", "gemini-3-flash-preview");
/// let id = orchestrator.create_evaluation(config, "GPQA").await?;
/// orchestrator.execute_evaluation(id).await?;
///
/// let results = orchestrator.get_evaluation_results(id).await?;
/// println!("accuracy: {:.1}%", results.accuracy());
/// # Ok(())
/// # }
/// ```
pub struct EvaluationOrchestrator {
    benchmarks: Arc<dyn BenchmarkRepository>,
    evaluations: Arc<dyn EvaluationRepository>,
    question_results: Arc<dyn QuestionResultRepository>,
    gateway: Arc<dyn LlmGateway>,
    registry: AgentServiceRegistry,
    config: OrchestratorConfig,
}

impl EvaluationOrchestrator {
    /// Create an orchestrator with the built-in strategy registry and
    /// default configuration.
    pub fn new(
        benchmarks: Arc<dyn BenchmarkRepository>,
        evaluations: Arc<dyn EvaluationRepository>,
        question_results: Arc<dyn QuestionResultRepository>,
        gateway: Arc<dyn LlmGateway>,
    ) -> Self {
        Self {
            benchmarks,
            evaluations,
            question_results,
            gateway,
            registry: AgentServiceRegistry::default(),
            config: OrchestratorConfig::default(),
        }
    }

    /// Replace the strategy registry (e.g. to add custom strategies).
    #[must_use]
    pub fn with_registry(mut self, registry: AgentServiceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the orchestration configuration.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate a configuration, resolve the benchmark, and persist a new
    /// pending evaluation.
    ///
    /// Nothing is persisted when validation or benchmark resolution fails.
    pub async fn create_evaluation(
        &self,
        agent_config: AgentConfig,
        benchmark_name: &str,
    ) -> Result<Uuid, OrchestratorError> {
        let validation = agent_config.validate_configuration(&self.registry.supported_types());
        let mut errors = validation.errors;

        if errors.is_empty() {
            // Generic rules passed, so the type resolves; ask the strategy
            // itself whether it accepts this configuration.
            if let Ok(service) = self.registry.create_service(agent_config.agent_type()) {
                if !service.validate_config(&agent_config) {
                    errors.push(format!(
                        "agent type '{}' rejected the configuration",
                        agent_config.agent_type()
                    ));
                }
            }
        }

        if !errors.is_empty() {
            return Err(OrchestratorError::InvalidConfiguration(errors));
        }
        for warning in &validation.warnings {
            log::warn!("agent configuration warning: {}", warning);
        }

        let benchmark = match self.benchmarks.get_by_name(benchmark_name).await {
            Ok(benchmark) => benchmark,
            Err(RepositoryError::NotFound(_)) => {
                return Err(OrchestratorError::BenchmarkNotFound(
                    benchmark_name.to_string(),
                ))
            }
            Err(other) => return Err(other.into()),
        };

        let evaluation = Evaluation::new(agent_config, benchmark.id());
        self.evaluations.save(&evaluation).await?;

        log::info!(
            "created evaluation {} for benchmark '{}' ({} questions)",
            evaluation.evaluation_id(),
            benchmark.name(),
            benchmark.question_count()
        );
        Ok(evaluation.evaluation_id())
    }

    /// Execute an evaluation to completion.
    pub async fn execute_evaluation(&self, evaluation_id: Uuid) -> Result<(), OrchestratorError> {
        self.execute_evaluation_with_progress(evaluation_id, |_| {})
            .await
    }

    /// Execute an evaluation, reporting progress after each question.
    ///
    /// The callback is advisory: it observes the run but cannot influence
    /// it. Events arrive in benchmark order with a monotonically
    /// increasing `current_question`.
    pub async fn execute_evaluation_with_progress<F>(
        &self,
        evaluation_id: Uuid,
        on_progress: F,
    ) -> Result<(), OrchestratorError>
    where
        F: Fn(ProgressInfo) + Send + Sync,
    {
        let mut evaluation = self.load_evaluation(evaluation_id).await?;

        let benchmark = match self.benchmarks.get_by_id(evaluation.benchmark_id()).await {
            Ok(benchmark) => benchmark,
            Err(RepositoryError::NotFound(_)) => {
                return Err(OrchestratorError::BenchmarkNotFound(
                    evaluation.benchmark_id().to_string(),
                ))
            }
            Err(other) => return Err(other.into()),
        };

        evaluation.start()?;
        self.evaluations.update(&evaluation).await?;
        log::info!(
            "evaluation {} running against benchmark '{}' ({} questions)",
            evaluation_id,
            benchmark.name(),
            benchmark.question_count()
        );

        // Fresh instances per run: strategy state never leaks across runs.
        let services = self.registry.create_registry();
        let agent_config = evaluation.agent_config().clone();

        let run_started = Instant::now();
        let total_questions = benchmark.question_count();
        let mut detailed = Vec::with_capacity(total_questions);
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut failures_by_category: HashMap<&'static str, u64> = HashMap::new();

        for (index, question) in benchmark.questions().iter().enumerate() {
            let service = match services.get(agent_config.agent_type()) {
                Some(service) => service.as_ref(),
                None => {
                    // Creation-time validation should make this impossible;
                    // treat it as fatal rather than a per-question failure.
                    let unknown = UnknownAgentType {
                        requested: agent_config.agent_type().to_string(),
                        supported: self.registry.supported_types(),
                    };
                    let reason = FailureReason::from_service_error(
                        &gauntlet_core::AgentServiceError::InvalidConfig(unknown.to_string()),
                    );
                    self.abort(&mut evaluation, reason).await;
                    return Err(unknown.into());
                }
            };

            let (result, failure_category) = self
                .run_question(evaluation_id, service, question, &agent_config)
                .await;

            if let Err(error) = self.question_results.save(&result).await {
                let reason = persistence_failure(&error);
                self.abort(&mut evaluation, reason).await;
                return Err(error.into());
            }

            if result.is_successful() {
                succeeded += 1;
            } else {
                failed += 1;
            }
            if let Some(category) = failure_category {
                *failures_by_category.entry(category.as_str()).or_insert(0) += 1;
            }

            on_progress(ProgressInfo {
                current_question: index + 1,
                total_questions,
                succeeded,
                failed,
                elapsed: run_started.elapsed(),
            });
            detailed.push(result);
        }

        let results = EvaluationResults::from_results(detailed)
            .with_statistic("failures_by_category", serde_json::json!(failures_by_category));

        if let Some(threshold) = self.config.failure_rate_threshold {
            let failure_rate = if total_questions == 0 {
                0.0
            } else {
                failed as f64 / total_questions as f64
            };
            if failure_rate > threshold {
                log::warn!(
                    "evaluation {} failed: failure rate {:.1}% exceeded threshold {:.1}%",
                    evaluation_id,
                    failure_rate * 100.0,
                    threshold * 100.0
                );
                let reason = threshold_failure(failure_rate, threshold);
                evaluation.fail(reason)?;
                self.evaluations.update(&evaluation).await?;
                return Ok(());
            }
        }

        evaluation.complete(results)?;
        self.evaluations.update(&evaluation).await?;

        log::info!(
            "evaluation {} completed: {}/{} correct, {} errors",
            evaluation_id,
            succeeded,
            total_questions,
            failed
        );
        Ok(())
    }

    /// Current lifecycle state of an evaluation.
    pub async fn get_evaluation_status(
        &self,
        evaluation_id: Uuid,
    ) -> Result<EvaluationStatus, OrchestratorError> {
        Ok(self.load_evaluation(evaluation_id).await?.status())
    }

    /// Aggregated results of a completed evaluation.
    pub async fn get_evaluation_results(
        &self,
        evaluation_id: Uuid,
    ) -> Result<EvaluationResults, OrchestratorError> {
        let evaluation = self.load_evaluation(evaluation_id).await?;

        match evaluation.results() {
            Some(results) => Ok(results.clone()),
            None => Err(OrchestratorError::NotCompleted {
                id: evaluation_id,
                status: evaluation.status(),
            }),
        }
    }

    /// All evaluations joined with their benchmark data, in creation order.
    pub async fn list_evaluations(&self) -> Result<Vec<EvaluationInfo>, OrchestratorError> {
        let evaluations = self.evaluations.list_all().await?;
        let mut infos = Vec::with_capacity(evaluations.len());

        for evaluation in evaluations {
            let benchmark_name = match self.benchmarks.get_by_id(evaluation.benchmark_id()).await {
                Ok(benchmark) => Some(benchmark.name().to_string()),
                Err(RepositoryError::NotFound(_)) => {
                    log::warn!(
                        "benchmark {} for evaluation {} no longer resolves",
                        evaluation.benchmark_id(),
                        evaluation.evaluation_id()
                    );
                    None
                }
                Err(other) => return Err(other.into()),
            };

            infos.push(EvaluationInfo {
                evaluation_id: evaluation.evaluation_id(),
                benchmark_id: evaluation.benchmark_id().to_string(),
                benchmark_name,
                agent_type: evaluation.agent_config().agent_type().to_string(),
                model_name: evaluation.agent_config().model_name().to_string(),
                status: evaluation.status(),
                created_at: evaluation.created_at(),
                completed_at: evaluation.completed_at(),
                accuracy: evaluation.results().map(|r| r.accuracy()),
                error_count: evaluation.results().map(|r| r.error_count()),
            });
        }

        Ok(infos)
    }

    /// Process one question: prompt, gateway call, parse, judge. Failures
    /// are classified and recoverable ones retried up to the configured
    /// budget; the returned record carries the outcome either way.
    async fn run_question(
        &self,
        evaluation_id: Uuid,
        service: &dyn ReasoningAgentService,
        question: &Question,
        agent_config: &AgentConfig,
    ) -> (EvaluationQuestionResult, Option<FailureCategory>) {
        let started = Instant::now();
        let mut attempt = 0;

        let reason = loop {
            let prompt = service.process_question(question, agent_config);

            let failure = match self
                .gateway
                .answer(
                    agent_config.model_name(),
                    &prompt.messages,
                    agent_config.model_parameters(),
                )
                .await
            {
                Ok(raw) => match service.process_response(&raw, question) {
                    Ok(answer) => {
                        let is_correct = service.judge(&answer.text, question.expected_answer());
                        return (
                            EvaluationQuestionResult::success(
                                evaluation_id,
                                question,
                                answer,
                                is_correct,
                                started.elapsed(),
                            ),
                            None,
                        );
                    }
                    Err(parse_error) => FailureReason::from_service_error(&parse_error),
                },
                Err(gateway_error) => FailureReason::from_gateway_error(&gateway_error),
            };

            if attempt < self.config.max_retries && failure.recoverable() {
                log::warn!(
                    "question {} attempt {}/{} failed: {}; retrying",
                    question.id(),
                    attempt + 1,
                    self.config.max_retries + 1,
                    failure.description()
                );
                attempt += 1;
                continue;
            }

            break failure;
        };

        log::debug!(
            "question {} failed ({}): {}",
            question.id(),
            reason.category(),
            reason.description()
        );
        let category = reason.category();
        (
            EvaluationQuestionResult::failure(evaluation_id, question, &reason, started.elapsed()),
            Some(category),
        )
    }

    async fn load_evaluation(&self, evaluation_id: Uuid) -> Result<Evaluation, OrchestratorError> {
        match self.evaluations.get_by_id(evaluation_id).await {
            Ok(evaluation) => Ok(evaluation),
            Err(RepositoryError::NotFound(_)) => {
                Err(OrchestratorError::EvaluationNotFound(evaluation_id))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Best-effort transition to `Failed` before surfacing a fatal error.
    async fn abort(&self, evaluation: &mut Evaluation, reason: FailureReason) {
        if let Err(error) = evaluation.fail(reason) {
            log::warn!(
                "could not mark evaluation {} failed: {}",
                evaluation.evaluation_id(),
                error
            );
            return;
        }
        if let Err(error) = self.evaluations.update(evaluation).await {
            log::warn!(
                "could not persist failed state for evaluation {}: {}",
                evaluation.evaluation_id(),
                error
            );
        }
    }
}

fn persistence_failure(error: &RepositoryError) -> FailureReason {
    fatal_reason(
        "A question result could not be persisted",
        format!("repository error: {}", error),
    )
}

fn threshold_failure(failure_rate: f64, threshold: f64) -> FailureReason {
    fatal_reason(
        &format!(
            "Failure rate {:.1}% exceeded the configured threshold of {:.1}%",
            failure_rate * 100.0,
            threshold * 100.0
        ),
        format!(
            "failure_rate={:.4}, failure_rate_threshold={:.4}",
            failure_rate, threshold
        ),
    )
}

/// Build a non-recoverable `unknown` reason from a non-empty description.
fn fatal_reason(description: &str, technical: String) -> FailureReason {
    FailureReason::new(FailureCategory::Unknown, description, technical, false).unwrap_or_else(
        |_| {
            FailureReason::from_gateway_error(&gauntlet_core::GatewayError::Other(
                description.to_string(),
            ))
        },
    )
}
