//! Integration tests for the evaluation orchestration engine.
//!
//! These drive full create/execute/read cycles against in-memory
//! repositories and a scripted gateway, so every scenario runs offline
//! and deterministically.

mod common;

use common::{direct_config, fixture, fixture_answering_correctly};
use gauntlet_core::{
    AgentConfig, AgentServiceError, AgentServiceRegistry, Answer, ChatMessage, GatewayError,
    ParsedResponse, PreparedPrompt, Question, ReasoningAgentService,
};
use gauntlet_eval::{
    EvaluationOrchestrator, EvaluationRepository, EvaluationStatus, OrchestratorConfig,
    OrchestratorError, ProgressInfo, QuestionResultRepository,
};
use std::sync::Mutex;
use uuid::Uuid;

/// Rebuild an orchestrator over a fixture's collaborators, so tests can
/// swap the registry or configuration while keeping the same stores.
fn rebuild(f: &common::Fixture) -> EvaluationOrchestrator {
    EvaluationOrchestrator::new(
        f.benchmarks.clone(),
        f.evaluations.clone(),
        f.question_results.clone(),
        f.gateway.clone(),
    )
}

fn orchestrator_with_retries(f: &common::Fixture, max_retries: usize) -> EvaluationOrchestrator {
    rebuild(f).with_config(OrchestratorConfig::new().with_max_retries(max_retries))
}

#[tokio::test]
async fn test_all_questions_correct() {
    let f = fixture_answering_correctly();

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    f.orchestrator.execute_evaluation(id).await.unwrap();

    assert_eq!(
        f.orchestrator.get_evaluation_status(id).await.unwrap(),
        EvaluationStatus::Completed
    );

    let results = f.orchestrator.get_evaluation_results(id).await.unwrap();
    assert_eq!(results.total_questions(), 2);
    assert_eq!(results.correct_answers(), 2);
    assert_eq!(results.accuracy(), 100.0);
    assert_eq!(results.error_count(), 0);
}

#[tokio::test]
async fn test_timeout_on_first_question_does_not_abort_the_run() {
    let f = fixture(vec![
        Err(GatewayError::Timeout(30_000)),
        Ok(ParsedResponse::text("Paris")),
    ]);

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    f.orchestrator.execute_evaluation(id).await.unwrap();

    // Timeouts are per-question recoverable failures, not fatal.
    assert_eq!(
        f.orchestrator.get_evaluation_status(id).await.unwrap(),
        EvaluationStatus::Completed
    );

    let results = f.orchestrator.get_evaluation_results(id).await.unwrap();
    assert_eq!(results.total_questions(), 2);
    assert_eq!(results.correct_answers(), 1);
    assert_eq!(results.accuracy(), 50.0);
    assert_eq!(results.error_count(), 1);

    let detailed = results.detailed_results();
    assert!(!detailed[0].is_successful());
    assert!(detailed[0].error_message().unwrap().contains("timed out"));
    assert!(detailed[1].is_successful());
    assert_eq!(detailed[1].actual_answer(), Some("Paris"));
}

#[tokio::test]
async fn test_wrong_answer_is_successful_but_incorrect() {
    let f = fixture(vec![
        Ok(ParsedResponse::text("5")),
        Ok(ParsedResponse::text("Paris")),
    ]);

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    f.orchestrator.execute_evaluation(id).await.unwrap();

    let results = f.orchestrator.get_evaluation_results(id).await.unwrap();
    assert_eq!(results.accuracy(), 50.0);
    assert_eq!(results.error_count(), 0);
    assert_eq!(results.detailed_results()[0].is_correct(), Some(false));
}

#[tokio::test]
async fn test_question_results_persisted_in_benchmark_order() {
    let f = fixture_answering_correctly();

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    f.orchestrator.execute_evaluation(id).await.unwrap();

    let saved = f
        .question_results
        .list_by_evaluation(id)
        .await
        .unwrap();
    let question_ids: Vec<_> = saved.iter().map(|r| r.question_id()).collect();
    assert_eq!(question_ids, vec!["q1", "q2"]);
}

#[tokio::test]
async fn test_missing_benchmark_persists_nothing() {
    let f = fixture_answering_correctly();

    let result = f
        .orchestrator
        .create_evaluation(direct_config(), "MMLU")
        .await;

    match result {
        Err(OrchestratorError::BenchmarkNotFound(name)) => assert_eq!(name, "MMLU"),
        other => panic!("expected BenchmarkNotFound, got {:?}", other.map(|_| ())),
    }
    assert!(f.evaluations.is_empty());
}

#[tokio::test]
async fn test_invalid_config_persists_nothing() {
    let f = fixture_answering_correctly();
    let config = AgentConfig::new("tree_of_thought", "google", "gemini-3-flash-preview");

    let result = f.orchestrator.create_evaluation(config, "GPQA").await;

    match result {
        Err(OrchestratorError::InvalidConfiguration(errors)) => {
            assert!(errors[0].contains("tree_of_thought"));
            assert!(errors[0].contains("none"));
        }
        other => panic!("expected InvalidConfiguration, got {:?}", other.map(|_| ())),
    }
    assert!(f.evaluations.is_empty());
}

#[tokio::test]
async fn test_unknown_evaluation_id() {
    let f = fixture_answering_correctly();
    let missing = Uuid::new_v4();

    assert!(matches!(
        f.orchestrator.execute_evaluation(missing).await,
        Err(OrchestratorError::EvaluationNotFound(id)) if id == missing
    ));
    assert!(matches!(
        f.orchestrator.get_evaluation_status(missing).await,
        Err(OrchestratorError::EvaluationNotFound(_))
    ));
}

#[tokio::test]
async fn test_results_require_completion() {
    let f = fixture_answering_correctly();

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();

    match f.orchestrator.get_evaluation_results(id).await {
        Err(OrchestratorError::NotCompleted { status, .. }) => {
            assert_eq!(status, EvaluationStatus::Pending);
        }
        other => panic!("expected NotCompleted, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_terminal_evaluation_cannot_be_executed_again() {
    let f = fixture_answering_correctly();

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    f.orchestrator.execute_evaluation(id).await.unwrap();

    assert!(matches!(
        f.orchestrator.execute_evaluation(id).await,
        Err(OrchestratorError::State(_))
    ));
}

#[tokio::test]
async fn test_progress_fires_in_order_and_never_alters_the_run() {
    let f = fixture(vec![
        Err(GatewayError::Timeout(30_000)),
        Ok(ParsedResponse::text("Paris")),
    ]);

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();

    let snapshots: Mutex<Vec<ProgressInfo>> = Mutex::new(Vec::new());
    f.orchestrator
        .execute_evaluation_with_progress(id, |progress| {
            snapshots.lock().unwrap().push(progress);
        })
        .await
        .unwrap();

    let snapshots = snapshots.into_inner().unwrap();
    assert_eq!(snapshots.len(), 2);

    assert_eq!(snapshots[0].current_question, 1);
    assert_eq!(snapshots[0].total_questions, 2);
    assert_eq!(snapshots[0].succeeded, 0);
    assert_eq!(snapshots[0].failed, 1);

    assert_eq!(snapshots[1].current_question, 2);
    assert_eq!(snapshots[1].succeeded, 1);
    assert_eq!(snapshots[1].failed, 1);
    assert!(snapshots[1].elapsed >= snapshots[0].elapsed);
}

#[tokio::test]
async fn test_recoverable_failure_is_retried_within_budget() {
    let f = fixture(vec![
        Err(GatewayError::Timeout(30_000)),
        Ok(ParsedResponse::text("4")),
        Ok(ParsedResponse::text("Paris")),
    ]);
    let orchestrator = orchestrator_with_retries(&f, 1);

    let id = orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    orchestrator.execute_evaluation(id).await.unwrap();

    let results = orchestrator.get_evaluation_results(id).await.unwrap();
    assert_eq!(results.accuracy(), 100.0);
    assert_eq!(results.error_count(), 0);
    // q1 took two gateway calls, q2 one.
    assert_eq!(f.gateway.calls_made(), 3);
}

#[tokio::test]
async fn test_non_recoverable_failure_is_not_retried() {
    let f = fixture(vec![
        Err(GatewayError::Status {
            code: 401,
            message: "Unauthorized".to_string(),
            body: None,
        }),
        Ok(ParsedResponse::text("Paris")),
    ]);
    let orchestrator = orchestrator_with_retries(&f, 2);

    let id = orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    orchestrator.execute_evaluation(id).await.unwrap();

    let results = orchestrator.get_evaluation_results(id).await.unwrap();
    assert_eq!(results.error_count(), 1);
    // The 401 burns exactly one call; no retry budget is spent on it.
    assert_eq!(f.gateway.calls_made(), 2);
}

#[tokio::test]
async fn test_failure_rate_threshold_forces_failed_outcome() {
    let f = fixture(vec![
        Err(GatewayError::Timeout(30_000)),
        Err(GatewayError::Timeout(30_000)),
    ]);
    let orchestrator = rebuild(&f)
        .with_config(OrchestratorConfig::new().with_failure_rate_threshold(0.5));

    let id = orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    orchestrator.execute_evaluation(id).await.unwrap();

    assert_eq!(
        orchestrator.get_evaluation_status(id).await.unwrap(),
        EvaluationStatus::Failed
    );

    let evaluation = f.evaluations.get_by_id(id).await.unwrap();
    let reason = evaluation.failure_reason().unwrap();
    assert!(reason.description().contains("threshold"));

    // A failed run never exposes aggregate results.
    assert!(matches!(
        orchestrator.get_evaluation_results(id).await,
        Err(OrchestratorError::NotCompleted { .. })
    ));
}

#[tokio::test]
async fn test_chain_of_thought_records_reasoning_traces() {
    let f = fixture(vec![
        Ok(ParsedResponse::text("2+2 means adding two twice.\nAnswer: 4")),
        Ok(ParsedResponse::text(
            "France's capital has been Paris for centuries.\nAnswer: Paris",
        )),
    ]);
    let config = AgentConfig::new("chain_of_thought", "google", "gemini-3-flash-preview");

    let id = f
        .orchestrator
        .create_evaluation(config, "GPQA")
        .await
        .unwrap();
    f.orchestrator.execute_evaluation(id).await.unwrap();

    let results = f.orchestrator.get_evaluation_results(id).await.unwrap();
    assert_eq!(results.accuracy(), 100.0);

    let first = &results.detailed_results()[0];
    assert_eq!(first.actual_answer(), Some("4"));
    assert!(first.reasoning_trace().unwrap().contains("adding two twice"));
}

#[tokio::test]
async fn test_list_evaluations_joins_benchmark_data() {
    let f = fixture_answering_correctly();

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    f.orchestrator.execute_evaluation(id).await.unwrap();

    let infos = f.orchestrator.list_evaluations().await.unwrap();
    assert_eq!(infos.len(), 1);

    let info = &infos[0];
    assert_eq!(info.evaluation_id, id);
    assert_eq!(info.benchmark_name.as_deref(), Some("GPQA"));
    assert_eq!(info.agent_type, "none");
    assert_eq!(info.status, EvaluationStatus::Completed);
    assert_eq!(info.accuracy, Some(100.0));
    assert_eq!(info.error_count, Some(0));
}

#[tokio::test]
async fn test_summary_statistics_histogram_failures() {
    let f = fixture(vec![
        Err(GatewayError::Status {
            code: 429,
            message: "Too Many Requests".to_string(),
            body: None,
        }),
        Ok(ParsedResponse::text("Paris")),
    ]);

    let id = f
        .orchestrator
        .create_evaluation(direct_config(), "GPQA")
        .await
        .unwrap();
    f.orchestrator.execute_evaluation(id).await.unwrap();

    let results = f.orchestrator.get_evaluation_results(id).await.unwrap();
    let histogram = &results.summary_statistics()["failures_by_category"];
    assert_eq!(histogram["rate_limit_exceeded"], 1);
}

// ----------------------------------------------------------------------------
// Runtime-registered strategy
// ----------------------------------------------------------------------------

/// A tree-of-thought stand-in that requires its own parameters.
struct TreeOfThoughtService;

impl ReasoningAgentService for TreeOfThoughtService {
    fn agent_type(&self) -> &str {
        "tree_of_thought"
    }

    fn validate_config(&self, config: &AgentConfig) -> bool {
        config.agent_parameters().contains_key("tree_depth")
            && config.agent_parameters().contains_key("branches_per_step")
    }

    fn process_question(&self, question: &Question, _config: &AgentConfig) -> PreparedPrompt {
        PreparedPrompt::new(vec![ChatMessage::user(question.text())])
    }

    fn process_response(
        &self,
        response: &ParsedResponse,
        _question: &Question,
    ) -> Result<Answer, AgentServiceError> {
        Ok(Answer::new(response.content.trim()))
    }
}

#[tokio::test]
async fn test_runtime_registered_strategy() {
    let f = fixture_answering_correctly();

    let mut registry = AgentServiceRegistry::default();
    registry.register_service("tree_of_thought", || Box::new(TreeOfThoughtService));
    let orchestrator = rebuild(&f).with_registry(registry);

    // Missing strategy parameters: the strategy rejects the configuration.
    let bare = AgentConfig::new("tree_of_thought", "google", "gemini-3-flash-preview");
    match orchestrator.create_evaluation(bare, "GPQA").await {
        Err(OrchestratorError::InvalidConfiguration(errors)) => {
            assert!(errors[0].contains("rejected"));
        }
        other => panic!("expected InvalidConfiguration, got {:?}", other.map(|_| ())),
    }

    // With the required parameters the run goes through.
    let config = AgentConfig::new("tree_of_thought", "google", "gemini-3-flash-preview")
        .with_agent_parameter("tree_depth", serde_json::json!(3))
        .with_agent_parameter("branches_per_step", serde_json::json!(2));
    let id = orchestrator.create_evaluation(config, "GPQA").await.unwrap();
    orchestrator.execute_evaluation(id).await.unwrap();

    let results = orchestrator.get_evaluation_results(id).await.unwrap();
    assert_eq!(results.accuracy(), 100.0);
}

