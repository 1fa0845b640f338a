//! Chain-of-thought strategy - single-pass reasoning before the answer.

use super::{AgentServiceError, Answer, PreparedPrompt, ReasoningAgentService};
use crate::benchmark::Question;
use crate::config::AgentConfig;
use crate::gateway::{ChatMessage, ParsedResponse};

/// Registry key for the chain-of-thought strategy.
pub const CHAIN_OF_THOUGHT_AGENT_TYPE: &str = "chain_of_thought";

/// Marker the model is instructed to place before its final answer.
const ANSWER_MARKER: &str = "Answer:";

/// Chain-of-thought prompting: the model reasons step by step, then emits
/// the final answer after an `Answer:` marker. The text before the marker
/// is kept as the reasoning trace.
#[derive(Debug, Clone, Default)]
pub struct ChainOfThoughtService;

impl ChainOfThoughtService {
    /// Create the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl ReasoningAgentService for ChainOfThoughtService {
    fn agent_type(&self) -> &str {
        CHAIN_OF_THOUGHT_AGENT_TYPE
    }

    fn validate_config(&self, _config: &AgentConfig) -> bool {
        true
    }

    fn process_question(&self, question: &Question, _config: &AgentConfig) -> PreparedPrompt {
        let system = format!(
            "Think through the question step by step. After your reasoning, \
             give the final answer on its own line prefixed with '{}'. \
             The final answer must contain nothing but the answer itself.",
            ANSWER_MARKER
        );

        PreparedPrompt::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(question.text()),
        ])
    }

    fn process_response(
        &self,
        response: &ParsedResponse,
        question: &Question,
    ) -> Result<Answer, AgentServiceError> {
        let content = response.content.trim();
        if content.is_empty() {
            return Err(AgentServiceError::ResponseParse(format!(
                "empty response for question '{}'",
                question.id()
            )));
        }

        // Split on the last marker so reasoning that quotes the marker
        // doesn't truncate the trace.
        if let Some(position) = content.rfind(ANSWER_MARKER) {
            let trace = content[..position].trim();
            let answer = content[position + ANSWER_MARKER.len()..].trim();

            if answer.is_empty() {
                return Err(AgentServiceError::ResponseParse(format!(
                    "answer marker with no answer for question '{}'",
                    question.id()
                )));
            }

            let mut result = Answer::new(answer);
            if !trace.is_empty() {
                result = result.with_reasoning_trace(trace);
            }
            return Ok(result);
        }

        // No marker: the model ignored the format. Take the last non-empty
        // line as the answer and keep the full text as the trace.
        log::debug!(
            "no answer marker in response for question '{}', falling back to last line",
            question.id()
        );
        let last_line = content
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| {
                AgentServiceError::ResponseParse(format!(
                    "no answer content for question '{}'",
                    question.id()
                ))
            })?;

        Ok(Answer::new(last_line).with_reasoning_trace(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Role;

    fn question() -> Question {
        Question::new("q1", "What is 12*12?", "144").unwrap()
    }

    fn config() -> AgentConfig {
        AgentConfig::new(CHAIN_OF_THOUGHT_AGENT_TYPE, "google", "gemini-3-flash-preview")
    }

    #[test]
    fn test_prompt_requests_marked_answer() {
        let service = ChainOfThoughtService::new();
        let prompt = service.process_question(&question(), &config());

        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, Role::System);
        assert!(prompt.messages[0].content.contains(ANSWER_MARKER));
    }

    #[test]
    fn test_extracts_answer_and_trace() {
        let service = ChainOfThoughtService::new();
        let response = ParsedResponse::text("12*12 is 12*10 + 12*2 = 120 + 24.\nAnswer: 144");

        let answer = service.process_response(&response, &question()).unwrap();

        assert_eq!(answer.text, "144");
        assert!(answer
            .reasoning_trace
            .as_deref()
            .unwrap()
            .contains("120 + 24"));
    }

    #[test]
    fn test_splits_on_last_marker() {
        let service = ChainOfThoughtService::new();
        let response =
            ParsedResponse::text("The format asks for 'Answer:' at the end.\nAnswer: 144");

        let answer = service.process_response(&response, &question()).unwrap();
        assert_eq!(answer.text, "144");
    }

    #[test]
    fn test_missing_marker_falls_back_to_last_line() {
        let service = ChainOfThoughtService::new();
        let response = ParsedResponse::text("Let me think.\nIt comes to\n144");

        let answer = service.process_response(&response, &question()).unwrap();

        assert_eq!(answer.text, "144");
        assert!(answer.reasoning_trace.is_some());
    }

    #[test]
    fn test_marker_without_answer_is_a_parse_error() {
        let service = ChainOfThoughtService::new();
        let response = ParsedResponse::text("Reasoning...\nAnswer:   ");

        let result = service.process_response(&response, &question());
        assert!(matches!(
            result,
            Err(AgentServiceError::ResponseParse(_))
        ));
    }

    #[test]
    fn test_empty_response_is_a_parse_error() {
        let service = ChainOfThoughtService::new();

        let result = service.process_response(&ParsedResponse::text(""), &question());
        assert!(matches!(
            result,
            Err(AgentServiceError::ResponseParse(_))
        ));
    }
}
