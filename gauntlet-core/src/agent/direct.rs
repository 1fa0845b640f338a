//! Direct prompting strategy - no intermediate reasoning.

use super::{AgentServiceError, Answer, PreparedPrompt, ReasoningAgentService};
use crate::benchmark::Question;
use crate::config::AgentConfig;
use crate::gateway::{ChatMessage, ParsedResponse};

/// Registry key for the direct strategy.
pub const DIRECT_AGENT_TYPE: &str = "none";

/// Direct prompting: the question is sent as-is and the whole response is
/// taken as the answer.
///
/// The system prompt can be overridden per run via the
/// `agent_parameters["system_prompt"]` configuration key.
#[derive(Debug, Clone)]
pub struct DirectService {
    system_prompt: String,
}

impl DirectService {
    /// Create the strategy with the default system prompt.
    pub fn new() -> Self {
        Self {
            system_prompt: "Answer the question directly and concisely. \
                            Reply with only the final answer."
                .to_string(),
        }
    }

    fn system_prompt<'a>(&'a self, config: &'a AgentConfig) -> &'a str {
        config
            .agent_parameters()
            .get("system_prompt")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.system_prompt)
    }
}

impl Default for DirectService {
    fn default() -> Self {
        Self::new()
    }
}

impl ReasoningAgentService for DirectService {
    fn agent_type(&self) -> &str {
        DIRECT_AGENT_TYPE
    }

    fn validate_config(&self, _config: &AgentConfig) -> bool {
        true
    }

    fn process_question(&self, question: &Question, config: &AgentConfig) -> PreparedPrompt {
        PreparedPrompt::new(vec![
            ChatMessage::system(self.system_prompt(config)),
            ChatMessage::user(question.text()),
        ])
    }

    fn process_response(
        &self,
        response: &ParsedResponse,
        question: &Question,
    ) -> Result<Answer, AgentServiceError> {
        let text = response.content.trim();
        if text.is_empty() {
            return Err(AgentServiceError::ResponseParse(format!(
                "empty response for question '{}'",
                question.id()
            )));
        }

        Ok(Answer::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Role;
    use serde_json::json;

    fn question() -> Question {
        Question::new("q1", "What is 2+2?", "4").unwrap()
    }

    fn config() -> AgentConfig {
        AgentConfig::new(DIRECT_AGENT_TYPE, "google", "gemini-3-flash-preview")
    }

    #[test]
    fn test_prompt_shape() {
        let service = DirectService::new();
        let prompt = service.process_question(&question(), &config());

        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, Role::System);
        assert_eq!(prompt.messages[1].role, Role::User);
        assert_eq!(prompt.messages[1].content, "What is 2+2?");
    }

    #[test]
    fn test_system_prompt_override() {
        let service = DirectService::new();
        let config = config().with_agent_parameter("system_prompt", json!("Be brief."));

        let prompt = service.process_question(&question(), &config);
        assert_eq!(prompt.messages[0].content, "Be brief.");
    }

    #[test]
    fn test_response_is_trimmed_answer() {
        let service = DirectService::new();

        let answer = service
            .process_response(&ParsedResponse::text("  4\n"), &question())
            .unwrap();

        assert_eq!(answer.text, "4");
        assert!(answer.reasoning_trace.is_none());
    }

    #[test]
    fn test_empty_response_is_a_parse_error() {
        let service = DirectService::new();

        let result = service.process_response(&ParsedResponse::text("   "), &question());
        assert!(matches!(
            result,
            Err(AgentServiceError::ResponseParse(_))
        ));
    }

    #[test]
    fn test_accepts_any_config() {
        let service = DirectService::new();
        assert!(service.validate_config(&config()));
    }
}
