//! Per-question and aggregate result types.
//!
//! An [`EvaluationQuestionResult`] records the outcome of processing
//! exactly one question and is never mutated after creation. A completed
//! run derives one immutable [`EvaluationResults`] from the full ordered
//! sequence.

use gauntlet_core::{Answer, FailureReason, Question};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use uuid::Uuid;

/// Violations of the success-xor-failure shape of a question result.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultShapeError {
    /// An answer was supplied without a correctness judgment
    #[error("a result with an answer requires a correctness judgment")]
    AnswerWithoutJudgment,

    /// A correctness judgment was supplied without an answer
    #[error("a result without an answer cannot carry a correctness judgment")]
    JudgmentWithoutAnswer,

    /// Both an answer and an error message were supplied
    #[error("a result cannot carry both an answer and an error message")]
    BothAnswerAndError,

    /// Neither an answer nor an error message was supplied
    #[error("a result must carry either an answer or an error message")]
    NeitherAnswerNorError,
}

/// Outcome of processing one benchmark question.
///
/// Exactly one of two shapes holds:
///
/// - **success**: `actual_answer` and `is_correct` are set, `error_message`
///   is absent
/// - **failure**: `error_message` is set, `actual_answer` and `is_correct`
///   are absent
///
/// The [`success`](Self::success) and [`failure`](Self::failure)
/// constructors produce these shapes directly; [`try_new`](Self::try_new)
/// validates arbitrary field combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationQuestionResult {
    id: Uuid,
    evaluation_id: Uuid,
    question_id: String,
    question_text: String,
    expected_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_correct: Option<bool>,
    #[serde(with = "duration_serde")]
    execution_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    technical_details: Option<String>,
    processed_at: SystemTime,
}

impl EvaluationQuestionResult {
    /// Create a successful result from an extracted answer and its
    /// correctness judgment.
    pub fn success(
        evaluation_id: Uuid,
        question: &Question,
        answer: Answer,
        is_correct: bool,
        execution_time: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            evaluation_id,
            question_id: question.id().to_string(),
            question_text: question.text().to_string(),
            expected_answer: question.expected_answer().to_string(),
            actual_answer: Some(answer.text),
            is_correct: Some(is_correct),
            execution_time,
            reasoning_trace: answer.reasoning_trace,
            error_message: None,
            technical_details: None,
            processed_at: SystemTime::now(),
        }
    }

    /// Create a failed result from a classified failure.
    pub fn failure(
        evaluation_id: Uuid,
        question: &Question,
        reason: &FailureReason,
        execution_time: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            evaluation_id,
            question_id: question.id().to_string(),
            question_text: question.text().to_string(),
            expected_answer: question.expected_answer().to_string(),
            actual_answer: None,
            is_correct: None,
            execution_time,
            reasoning_trace: None,
            error_message: Some(reason.description().to_string()),
            technical_details: Some(reason.technical_details().to_string()),
            processed_at: SystemTime::now(),
        }
    }

    /// Validate an arbitrary field combination into a result.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        evaluation_id: Uuid,
        question: &Question,
        actual_answer: Option<String>,
        is_correct: Option<bool>,
        error_message: Option<String>,
        technical_details: Option<String>,
        reasoning_trace: Option<String>,
        execution_time: Duration,
    ) -> Result<Self, ResultShapeError> {
        match (&actual_answer, &is_correct, &error_message) {
            (Some(_), None, _) => return Err(ResultShapeError::AnswerWithoutJudgment),
            (None, Some(_), _) => return Err(ResultShapeError::JudgmentWithoutAnswer),
            (Some(_), Some(_), Some(_)) => return Err(ResultShapeError::BothAnswerAndError),
            (None, None, None) => return Err(ResultShapeError::NeitherAnswerNorError),
            _ => {}
        }

        Ok(Self {
            id: Uuid::new_v4(),
            evaluation_id,
            question_id: question.id().to_string(),
            question_text: question.text().to_string(),
            expected_answer: question.expected_answer().to_string(),
            actual_answer,
            is_correct,
            execution_time,
            reasoning_trace,
            error_message,
            technical_details,
            processed_at: SystemTime::now(),
        })
    }

    /// Whether this result represents a successfully answered question.
    pub fn is_successful(&self) -> bool {
        self.error_message.is_none() && self.actual_answer.is_some()
    }

    /// Unique identifier of this record.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The evaluation this result belongs to.
    pub fn evaluation_id(&self) -> Uuid {
        self.evaluation_id
    }

    /// The question that was processed.
    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    /// The question text, denormalized for reporting.
    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    /// The ground-truth answer.
    pub fn expected_answer(&self) -> &str {
        &self.expected_answer
    }

    /// The agent's answer, present only on the success path.
    pub fn actual_answer(&self) -> Option<&str> {
        self.actual_answer.as_deref()
    }

    /// Correctness judgment, present only on the success path.
    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    /// Wall-clock time spent on this question, retries included.
    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Intermediate reasoning, when the strategy produced one.
    pub fn reasoning_trace(&self) -> Option<&str> {
        self.reasoning_trace.as_deref()
    }

    /// Failure description, present only on the failure path.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Technical failure detail, present only on the failure path.
    pub fn technical_details(&self) -> Option<&str> {
        self.technical_details.as_deref()
    }

    /// When this question finished processing.
    pub fn processed_at(&self) -> SystemTime {
        self.processed_at
    }
}

/// Aggregate statistics over a completed evaluation.
///
/// Derived once from the full ordered result sequence and immutable
/// afterwards. `accuracy` is a percentage in `[0, 100]`, `0` for an empty
/// run; `average_execution_time` averages over all results, successes and
/// failures alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResults {
    total_questions: usize,
    correct_answers: usize,
    accuracy: f64,
    #[serde(with = "duration_serde")]
    average_execution_time: Duration,
    error_count: usize,
    detailed_results: Vec<EvaluationQuestionResult>,
    #[serde(default)]
    summary_statistics: HashMap<String, serde_json::Value>,
}

impl EvaluationResults {
    /// Aggregate an ordered result sequence.
    pub fn from_results(results: Vec<EvaluationQuestionResult>) -> Self {
        let total_questions = results.len();
        let correct_answers = results
            .iter()
            .filter(|r| r.is_correct() == Some(true))
            .count();
        let error_count = results.iter().filter(|r| !r.is_successful()).count();

        let accuracy = if total_questions == 0 {
            0.0
        } else {
            correct_answers as f64 / total_questions as f64 * 100.0
        };

        let average_execution_time = if total_questions == 0 {
            Duration::ZERO
        } else {
            results.iter().map(|r| r.execution_time()).sum::<Duration>() / total_questions as u32
        };

        let mut summary_statistics = HashMap::new();
        summary_statistics.insert(
            "succeeded".to_string(),
            serde_json::json!(total_questions - error_count),
        );
        summary_statistics.insert("failed".to_string(), serde_json::json!(error_count));

        Self {
            total_questions,
            correct_answers,
            accuracy,
            average_execution_time,
            error_count,
            detailed_results: results,
            summary_statistics,
        }
    }

    /// Attach an extra summary statistic (strategy-specific or run-level).
    #[must_use]
    pub fn with_statistic(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.summary_statistics.insert(key.into(), value);
        self
    }

    /// Number of questions processed.
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    /// Number of questions judged correct.
    pub fn correct_answers(&self) -> usize {
        self.correct_answers
    }

    /// Percentage of correct answers, in `[0, 100]`.
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Mean per-question time over all results.
    pub fn average_execution_time(&self) -> Duration {
        self.average_execution_time
    }

    /// Number of questions that failed.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Per-question results in benchmark order.
    pub fn detailed_results(&self) -> &[EvaluationQuestionResult] {
        &self.detailed_results
    }

    /// Open map of additional statistics.
    pub fn summary_statistics(&self) -> &HashMap<String, serde_json::Value> {
        &self.summary_statistics
    }
}

/// Serde adapter serializing `Duration` as seconds (f64).
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
