//! Benchmark corpus records.
//!
//! A [`Benchmark`] is a named, ordered collection of [`Question`]s with
//! expected answers. Both are immutable value objects: all mutation happens
//! at construction time, and equality is structural.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;
use thiserror::Error;

/// Construction-time invariant violations for corpus records.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvariantViolation {
    /// A required string field was empty or whitespace-only
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// A single benchmark question with its expected answer.
///
/// Immutable once constructed. `id`, `text`, and `expected_answer` are
/// guaranteed non-empty; `metadata` is an open map for source-specific
/// extras (difficulty, subject, provenance).
///
/// # Example
///
/// ```
/// use gauntlet_core::Question;
///
/// let question = Question::new("q1", "What is 2+2?", "4").unwrap();
/// assert_eq!(question.expected_answer(), "4");
///
/// assert!(Question::new("q2", "   ", "42").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    id: String,
    text: String,
    expected_answer: String,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

impl Question {
    /// Create a question, rejecting empty or whitespace-only fields.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        expected_answer: impl Into<String>,
    ) -> Result<Self, InvariantViolation> {
        let id = id.into();
        let text = text.into();
        let expected_answer = expected_answer.into();

        for (name, value) in [
            ("id", &id),
            ("text", &text),
            ("expected_answer", &expected_answer),
        ] {
            if value.trim().is_empty() {
                return Err(InvariantViolation::EmptyField(name));
            }
        }

        Ok(Self {
            id,
            text,
            expected_answer,
            metadata: HashMap::new(),
        })
    }

    /// Attach metadata to the question.
    #[must_use]
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Unique identifier within the benchmark.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The question text presented to the agent.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The ground-truth answer.
    pub fn expected_answer(&self) -> &str {
        &self.expected_answer
    }

    /// Open metadata map.
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }
}

/// A named, versioned, ordered collection of questions.
///
/// `question_count` always equals `questions().len()` - the count is derived
/// at construction and the question list cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    id: String,
    name: String,
    description: String,
    questions: Vec<Question>,
    question_count: usize,
    format_version: String,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
    created_at: SystemTime,
}

impl Benchmark {
    /// Default format version stamped on new benchmarks.
    pub const FORMAT_VERSION: &'static str = "1.0";

    /// Create a benchmark over an ordered question list.
    ///
    /// `id` and `name` must be non-empty; `description` may be empty.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, InvariantViolation> {
        let id = id.into();
        let name = name.into();

        for (field, value) in [("id", &id), ("name", &name)] {
            if value.trim().is_empty() {
                return Err(InvariantViolation::EmptyField(field));
            }
        }

        let question_count = questions.len();
        Ok(Self {
            id,
            name,
            description: description.into(),
            questions,
            question_count,
            format_version: Self::FORMAT_VERSION.to_string(),
            metadata: HashMap::new(),
            created_at: SystemTime::now(),
        })
    }

    /// Override the format version recorded for this benchmark.
    #[must_use]
    pub fn with_format_version(mut self, format_version: impl Into<String>) -> Self {
        self.format_version = format_version.into();
        self
    }

    /// Attach metadata to the benchmark.
    #[must_use]
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Unique identifier, used as the foreign key on evaluations.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-facing benchmark name (e.g. "GPQA").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Questions in benchmark order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions; always equal to `questions().len()`.
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Version of the ingestion format this benchmark was built from.
    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    /// Open metadata map.
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_questions() -> Vec<Question> {
        vec![
            Question::new("q1", "What is 2+2?", "4").unwrap(),
            Question::new("q2", "Capital of France?", "Paris").unwrap(),
        ]
    }

    #[test]
    fn test_question_accessors() {
        let question = Question::new("q1", "What is 2+2?", "4").unwrap();

        assert_eq!(question.id(), "q1");
        assert_eq!(question.text(), "What is 2+2?");
        assert_eq!(question.expected_answer(), "4");
        assert!(question.metadata().is_empty());
    }

    #[rstest]
    #[case::empty_id("", "text", "answer", "id")]
    #[case::empty_text("q1", "", "answer", "text")]
    #[case::whitespace_text("q1", "   ", "answer", "text")]
    #[case::empty_answer("q1", "text", "", "expected_answer")]
    fn test_question_rejects_empty_fields(
        #[case] id: &str,
        #[case] text: &str,
        #[case] answer: &str,
        #[case] field: &str,
    ) {
        let err = Question::new(id, text, answer).unwrap_err();
        let InvariantViolation::EmptyField(offending) = err;
        assert_eq!(offending, field);
    }

    #[test]
    fn test_question_value_equality() {
        let a = Question::new("q1", "What is 2+2?", "4").unwrap();
        let b = Question::new("q1", "What is 2+2?", "4").unwrap();
        let c = Question::new("q1", "What is 2+2?", "5").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_question_with_metadata() {
        let mut metadata = HashMap::new();
        metadata.insert("difficulty".to_string(), serde_json::json!("hard"));

        let question = Question::new("q1", "text", "answer")
            .unwrap()
            .with_metadata(metadata);

        assert_eq!(question.metadata()["difficulty"], "hard");
    }

    #[test]
    fn test_benchmark_count_matches_questions() {
        let benchmark =
            Benchmark::new("b1", "GPQA", "Graduate-level QA", sample_questions()).unwrap();

        assert_eq!(benchmark.question_count(), 2);
        assert_eq!(benchmark.question_count(), benchmark.questions().len());
        assert_eq!(benchmark.format_version(), Benchmark::FORMAT_VERSION);
    }

    #[test]
    fn test_benchmark_preserves_question_order() {
        let benchmark = Benchmark::new("b1", "GPQA", "", sample_questions()).unwrap();

        let ids: Vec<_> = benchmark.questions().iter().map(|q| q.id()).collect();
        assert_eq!(ids, vec!["q1", "q2"]);
    }

    #[test]
    fn test_benchmark_rejects_empty_name() {
        let result = Benchmark::new("b1", "  ", "", sample_questions());
        assert!(matches!(
            result,
            Err(InvariantViolation::EmptyField("name"))
        ));
    }

    #[test]
    fn test_empty_benchmark_is_allowed() {
        let benchmark = Benchmark::new("b1", "empty", "", vec![]).unwrap();
        assert_eq!(benchmark.question_count(), 0);
    }

    #[test]
    fn test_benchmark_serialization_round_trip() {
        let benchmark = Benchmark::new("b1", "GPQA", "desc", sample_questions()).unwrap();

        let json = serde_json::to_string(&benchmark).unwrap();
        let parsed: Benchmark = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, benchmark);
    }
}
