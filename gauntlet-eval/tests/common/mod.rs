//! Shared fixtures for orchestrator integration tests.

use gauntlet_core::{
    AgentConfig, Benchmark, GatewayError, ParsedResponse, Question, ScriptedGateway,
};
use gauntlet_eval::{
    EvaluationOrchestrator, InMemoryBenchmarkRepository, InMemoryEvaluationRepository,
    InMemoryQuestionResultRepository,
};
use std::sync::Arc;

/// Everything a test needs to drive one orchestrator, with handles to the
/// collaborators for assertions.
pub struct Fixture {
    pub benchmarks: Arc<InMemoryBenchmarkRepository>,
    pub evaluations: Arc<InMemoryEvaluationRepository>,
    pub question_results: Arc<InMemoryQuestionResultRepository>,
    pub gateway: Arc<ScriptedGateway>,
    pub orchestrator: EvaluationOrchestrator,
}

/// Two-question GPQA-style benchmark: "4" and "Paris" are the expected
/// answers, in that order.
pub fn gpqa_benchmark() -> Benchmark {
    Benchmark::new(
        "bench-gpqa",
        "GPQA",
        "Graduate-level QA",
        vec![
            Question::new("q1", "What is 2+2?", "4").unwrap(),
            Question::new("q2", "What is the capital of France?", "Paris").unwrap(),
        ],
    )
    .unwrap()
}

/// Build a fixture around a scripted gateway.
pub fn fixture(turns: Vec<Result<ParsedResponse, GatewayError>>) -> Fixture {
    let benchmarks = Arc::new(InMemoryBenchmarkRepository::new());
    benchmarks.insert(gpqa_benchmark()).unwrap();

    let evaluations = Arc::new(InMemoryEvaluationRepository::new());
    let question_results = Arc::new(InMemoryQuestionResultRepository::new());
    let gateway = Arc::new(ScriptedGateway::new(turns));

    let orchestrator = EvaluationOrchestrator::new(
        benchmarks.clone(),
        evaluations.clone(),
        question_results.clone(),
        gateway.clone(),
    );

    Fixture {
        benchmarks,
        evaluations,
        question_results,
        gateway,
        orchestrator,
    }
}

/// Fixture whose gateway answers every question correctly.
pub fn fixture_answering_correctly() -> Fixture {
    fixture(vec![
        Ok(ParsedResponse::text("4")),
        Ok(ParsedResponse::text("Paris")),
    ])
}

/// Direct-prompting configuration against the scripted model.
pub fn direct_config() -> AgentConfig {
    AgentConfig::new("none", "google", "gemini-3-flash-preview")
}
