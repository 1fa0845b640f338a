//! The evaluation aggregate and its lifecycle state machine.
//!
//! An [`Evaluation`] is one run of an agent configuration against one
//! benchmark. It moves through `Pending -> Running -> Completed | Failed`
//! strictly in that order; skipping `Running` or leaving a terminal state
//! is a programming error and is rejected with a typed
//! [`StateTransitionError`].

use crate::results::EvaluationResults;
use gauntlet_core::{AgentConfig, FailureReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle states of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    /// Created and persisted, not yet started
    Pending,
    /// The question loop is in progress
    Running,
    /// All questions processed and results aggregated
    Completed,
    /// A fatal condition aborted the run
    Failed,
}

impl EvaluationStatus {
    /// Stable snake_case identifier, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Running => "running",
            EvaluationStatus::Completed => "completed",
            EvaluationStatus::Failed => "failed",
        }
    }

    /// Whether no further transition is defined out of this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EvaluationStatus::Completed | EvaluationStatus::Failed)
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid evaluation state transition: {from} -> {to}")]
pub struct StateTransitionError {
    /// State the evaluation was in.
    pub from: EvaluationStatus,
    /// State the transition asked for.
    pub to: EvaluationStatus,
}

/// One run of an agent configuration against one benchmark.
///
/// The aggregate root: identity, configuration, lifecycle state, and -
/// once terminal - either results or a failure reason. Mutation happens
/// only through the explicit transition methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    evaluation_id: Uuid,
    agent_config: AgentConfig,
    benchmark_id: String,
    status: EvaluationStatus,
    created_at: SystemTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<EvaluationResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_reason: Option<FailureReason>,
}

impl Evaluation {
    /// Create a pending evaluation bound to a benchmark.
    pub fn new(agent_config: AgentConfig, benchmark_id: impl Into<String>) -> Self {
        Self {
            evaluation_id: Uuid::new_v4(),
            agent_config,
            benchmark_id: benchmark_id.into(),
            status: EvaluationStatus::Pending,
            created_at: SystemTime::now(),
            started_at: None,
            completed_at: None,
            results: None,
            failure_reason: None,
        }
    }

    /// Transition `Pending -> Running`, stamping `started_at`.
    pub fn start(&mut self) -> Result<(), StateTransitionError> {
        self.transition(EvaluationStatus::Running)?;
        self.started_at = Some(SystemTime::now());
        Ok(())
    }

    /// Transition `Running -> Completed`, attaching the aggregated results
    /// and stamping `completed_at`.
    pub fn complete(&mut self, results: EvaluationResults) -> Result<(), StateTransitionError> {
        self.transition(EvaluationStatus::Completed)?;
        self.completed_at = Some(SystemTime::now());
        self.results = Some(results);
        Ok(())
    }

    /// Transition `Running -> Failed`, attaching the fatal reason and
    /// stamping `completed_at`.
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), StateTransitionError> {
        self.transition(EvaluationStatus::Failed)?;
        self.completed_at = Some(SystemTime::now());
        self.failure_reason = Some(reason);
        Ok(())
    }

    fn transition(&mut self, to: EvaluationStatus) -> Result<(), StateTransitionError> {
        let allowed = matches!(
            (self.status, to),
            (EvaluationStatus::Pending, EvaluationStatus::Running)
                | (EvaluationStatus::Running, EvaluationStatus::Completed)
                | (EvaluationStatus::Running, EvaluationStatus::Failed)
        );

        if !allowed {
            return Err(StateTransitionError {
                from: self.status,
                to,
            });
        }

        self.status = to;
        Ok(())
    }

    /// Unique identifier.
    pub fn evaluation_id(&self) -> Uuid {
        self.evaluation_id
    }

    /// The agent configuration this run evaluates.
    pub fn agent_config(&self) -> &AgentConfig {
        &self.agent_config
    }

    /// Identifier of the benchmark being run.
    pub fn benchmark_id(&self) -> &str {
        &self.benchmark_id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> EvaluationStatus {
        self.status
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// When execution started, if it has.
    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    /// When the run reached a terminal state, if it has.
    pub fn completed_at(&self) -> Option<SystemTime> {
        self.completed_at
    }

    /// Aggregated results, present only when `Completed`.
    pub fn results(&self) -> Option<&EvaluationResults> {
        self.results.as_ref()
    }

    /// Fatal failure reason, present only when `Failed`.
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        self.failure_reason.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_core::{FailureCategory, GatewayError};
    use rstest::rstest;

    fn evaluation() -> Evaluation {
        Evaluation::new(
            AgentConfig::new("none", "google", "gemini-3-flash-preview"),
            "b1",
        )
    }

    fn results() -> EvaluationResults {
        EvaluationResults::from_results(vec![])
    }

    fn reason() -> FailureReason {
        FailureReason::from_gateway_error(&GatewayError::Network("unreachable".into()))
    }

    #[test]
    fn test_new_evaluation_is_pending() {
        let evaluation = evaluation();

        assert_eq!(evaluation.status(), EvaluationStatus::Pending);
        assert!(evaluation.started_at().is_none());
        assert!(evaluation.completed_at().is_none());
        assert!(evaluation.results().is_none());
        assert!(evaluation.failure_reason().is_none());
    }

    #[test]
    fn test_happy_path_to_completed() {
        let mut evaluation = evaluation();

        evaluation.start().unwrap();
        assert_eq!(evaluation.status(), EvaluationStatus::Running);
        assert!(evaluation.started_at().is_some());

        evaluation.complete(results()).unwrap();
        assert_eq!(evaluation.status(), EvaluationStatus::Completed);
        assert!(evaluation.completed_at().is_some());
        assert!(evaluation.results().is_some());
    }

    #[test]
    fn test_running_to_failed() {
        let mut evaluation = evaluation();
        evaluation.start().unwrap();

        evaluation.fail(reason()).unwrap();

        assert_eq!(evaluation.status(), EvaluationStatus::Failed);
        assert_eq!(
            evaluation.failure_reason().unwrap().category(),
            FailureCategory::NetworkTimeout
        );
        assert!(evaluation.completed_at().is_some());
    }

    #[test]
    fn test_cannot_skip_running() {
        let mut evaluation = evaluation();

        let err = evaluation.complete(results()).unwrap_err();
        assert_eq!(err.from, EvaluationStatus::Pending);
        assert_eq!(err.to, EvaluationStatus::Completed);

        assert!(evaluation.fail(reason()).is_err());
        assert_eq!(evaluation.status(), EvaluationStatus::Pending);
    }

    #[rstest]
    #[case::completed(true)]
    #[case::failed(false)]
    fn test_terminal_states_reject_transitions(#[case] complete_first: bool) {
        let mut evaluation = evaluation();
        evaluation.start().unwrap();

        if complete_first {
            evaluation.complete(results()).unwrap();
        } else {
            evaluation.fail(reason()).unwrap();
        }

        assert!(evaluation.status().is_terminal());
        assert!(evaluation.start().is_err());
        assert!(evaluation.complete(results()).is_err());
        assert!(evaluation.fail(reason()).is_err());
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut evaluation = evaluation();
        evaluation.start().unwrap();

        let err = evaluation.start().unwrap_err();
        assert_eq!(err.from, EvaluationStatus::Running);
        assert_eq!(err.to, EvaluationStatus::Running);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EvaluationStatus::Pending.to_string(), "pending");
        assert_eq!(EvaluationStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut evaluation = evaluation();
        evaluation.start().unwrap();
        evaluation.complete(results()).unwrap();

        let json = serde_json::to_string(&evaluation).unwrap();
        let parsed: Evaluation = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, evaluation);
    }
}
