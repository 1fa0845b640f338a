//! Scripted gateway for offline and deterministic testing.
//!
//! [`ScriptedGateway`] replays a fixed sequence of outcomes, one per
//! `answer` call, enabling:
//!
//! - **Offline testing**: run evaluations without API calls
//! - **Deterministic failures**: script exact transport errors to exercise
//!   failure classification
//! - **Prompt assertions**: every received prompt is recorded for inspection
//!
//! # Example
//!
//! ```
//! use gauntlet_core::{GatewayError, LlmGateway, ParsedResponse, ScriptedGateway, ChatMessage};
//! use std::collections::HashMap;
//!
//! # async fn example() {
//! let gateway = ScriptedGateway::new(vec![
//!     Ok(ParsedResponse::text("4")),
//!     Err(GatewayError::Timeout(30_000)),
//! ]);
//!
//! let messages = [ChatMessage::user("What is 2+2?")];
//! let first = gateway.answer("m", &messages, &HashMap::new()).await;
//! assert!(first.is_ok());
//!
//! let second = gateway.answer("m", &messages, &HashMap::new()).await;
//! assert!(matches!(second, Err(GatewayError::Timeout(_))));
//! # }
//! ```

use crate::gateway::{ChatMessage, GatewayError, LlmGateway, ParsedResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Gateway that replays scripted outcomes in order.
///
/// Calls past the end of the script fail with [`GatewayError::Other`],
/// which usually means a test scripted fewer turns than the code under
/// test performed.
#[derive(Debug)]
pub struct ScriptedGateway {
    /// Outcomes to replay, in call order
    turns: Vec<Result<ParsedResponse, GatewayError>>,

    /// Index of the next turn to replay
    cursor: AtomicUsize,

    /// Prompts received so far, one entry per call
    received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGateway {
    /// Create a gateway that replays the given outcomes in order.
    pub fn new(turns: Vec<Result<ParsedResponse, GatewayError>>) -> Self {
        Self {
            turns,
            cursor: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor for the all-success case.
    pub fn answering<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            answers
                .into_iter()
                .map(|a| Ok(ParsedResponse::text(a)))
                .collect(),
        )
    }

    /// Number of scripted turns.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Number of calls served so far.
    pub fn calls_made(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Whether every scripted turn has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.load(Ordering::SeqCst) >= self.turns.len()
    }

    /// Rewind to the first turn, keeping recorded prompts.
    pub fn reset(&self) {
        self.cursor.store(0, Ordering::SeqCst);
    }

    /// Prompts received so far, in call order.
    pub fn received_prompts(&self) -> Vec<Vec<ChatMessage>> {
        match self.received.lock() {
            Ok(prompts) => prompts.clone(),
            Err(poisoned) => {
                log::warn!("prompt-record lock poisoned, recovering recorded prompts");
                poisoned.into_inner().clone()
            }
        }
    }

    fn record(&self, messages: &[ChatMessage]) {
        match self.received.lock() {
            Ok(mut prompts) => prompts.push(messages.to_vec()),
            Err(poisoned) => {
                log::warn!("prompt-record lock poisoned, recovering and recording prompt");
                poisoned.into_inner().push(messages.to_vec());
            }
        }
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn answer(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _parameters: &HashMap<String, serde_json::Value>,
    ) -> Result<ParsedResponse, GatewayError> {
        self.record(messages);

        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        match self.turns.get(index) {
            Some(turn) => turn.clone(),
            None => Err(GatewayError::Other(format!(
                "scripted gateway exhausted after {} turns",
                self.turns.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> HashMap<String, serde_json::Value> {
        HashMap::new()
    }

    #[tokio::test]
    async fn test_replays_turns_in_order() {
        let gateway = ScriptedGateway::answering(["first", "second"]);
        let messages = [ChatMessage::user("q")];

        let a = gateway.answer("m", &messages, &params()).await.unwrap();
        let b = gateway.answer("m", &messages, &params()).await.unwrap();

        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
        assert!(gateway.is_exhausted());
    }

    #[tokio::test]
    async fn test_replays_scripted_errors() {
        let gateway = ScriptedGateway::new(vec![Err(GatewayError::Status {
            code: 429,
            message: "Too Many Requests".to_string(),
            body: None,
        })]);

        let result = gateway
            .answer("m", &[ChatMessage::user("q")], &params())
            .await;

        assert!(matches!(
            result,
            Err(GatewayError::Status { code: 429, .. })
        ));
    }

    #[tokio::test]
    async fn test_exhaustion_is_an_error() {
        let gateway = ScriptedGateway::answering(["only"]);
        let messages = [ChatMessage::user("q")];

        gateway.answer("m", &messages, &params()).await.unwrap();
        let result = gateway.answer("m", &messages, &params()).await;

        assert!(matches!(result, Err(GatewayError::Other(_))));
    }

    #[tokio::test]
    async fn test_records_received_prompts() {
        let gateway = ScriptedGateway::answering(["a", "b"]);

        gateway
            .answer("m", &[ChatMessage::user("first prompt")], &params())
            .await
            .unwrap();
        gateway
            .answer(
                "m",
                &[
                    ChatMessage::system("sys"),
                    ChatMessage::user("second prompt"),
                ],
                &params(),
            )
            .await
            .unwrap();

        let prompts = gateway.received_prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0][0].content, "first prompt");
        assert_eq!(prompts[1].len(), 2);
    }

    #[tokio::test]
    async fn test_reset_rewinds_the_script() {
        let gateway = ScriptedGateway::answering(["again"]);
        let messages = [ChatMessage::user("q")];

        gateway.answer("m", &messages, &params()).await.unwrap();
        assert!(gateway.is_exhausted());

        gateway.reset();
        assert!(!gateway.is_exhausted());
        let replayed = gateway.answer("m", &messages, &params()).await.unwrap();
        assert_eq!(replayed.content, "again");
    }
}
