use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{
    cli::OutputFormat,
    exchange::{ExchangeOutcome, MessageExchange},
    session::{ChatState, Role},
};

/// Result of a non-interactive run
#[derive(Debug, Serialize, Deserialize)]
pub struct NonInteractiveResult {
    /// The prompt that was sent
    pub prompt: String,
    /// The bot message appended for it, if any
    pub response: Option<String>,
    /// Session the exchange ran in
    pub session_id: Option<String>,
    /// "replied", "failed", "auth_required", "skipped" or "discarded"
    pub status: String,
    /// Backend error, when the exchange failed
    pub error: Option<String>,
    /// Metadata about the execution
    pub metadata: ExecutionMetadata,
}

impl NonInteractiveResult {
    pub fn succeeded(&self) -> bool {
        self.status == "replied"
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Model used
    pub model: String,
    /// Execution time in milliseconds
    pub duration_ms: u128,
}

/// Sends a single prompt to the active session
pub struct NonInteractiveRunner {
    exchange: MessageExchange,
    model: String,
}

impl NonInteractiveRunner {
    pub fn new(exchange: MessageExchange, model: String) -> Self {
        Self { exchange, model }
    }

    /// Send the prompt and collect what happened
    pub async fn execute(
        &self,
        state: &mut ChatState,
        prompt: &str,
        authenticated: bool,
    ) -> NonInteractiveResult {
        let start = Instant::now();
        let outcome = self
            .exchange
            .send(state, prompt, &self.model, authenticated)
            .await;

        let (status, session_id, error) = match &outcome {
            ExchangeOutcome::Replied { session_id, .. } => ("replied", Some(session_id), None),
            ExchangeOutcome::Failed { session_id, error } => {
                ("failed", Some(session_id), Some(error.clone()))
            }
            ExchangeOutcome::AuthRequired { session_id } => ("auth_required", Some(session_id), None),
            ExchangeOutcome::Skipped => ("skipped", None, None),
            ExchangeOutcome::Discarded { session_id } => ("discarded", Some(session_id), None),
        };

        let response = session_id
            .and_then(|id| state.registry().messages(id))
            .and_then(|messages| messages.last())
            .filter(|m| m.role == Role::Bot)
            .map(|m| m.content.clone());

        NonInteractiveResult {
            prompt: prompt.to_string(),
            response,
            session_id: session_id.cloned(),
            status: status.to_string(),
            error,
            metadata: ExecutionMetadata {
                model: self.model.clone(),
                duration_ms: start.elapsed().as_millis(),
            },
        }
    }

    /// Format the result based on output format
    pub fn format_result(&self, result: &NonInteractiveResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)),
            OutputFormat::Text => match &result.response {
                Some(response) => response.clone(),
                None => format!("[{}] no reply", result.status),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EXCHANGE_ERROR_NOTICE, LOGIN_REQUIRED_NOTICE};
    use crate::exchange::{BackendError, MockInferenceBackend};
    use crate::session::SequentialIds;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn state() -> ChatState {
        ChatState::load(Arc::new(MemoryStore::new()), Box::new(SequentialIds::new()))
    }

    fn runner(reply: Result<&'static str, ()>) -> NonInteractiveRunner {
        let mut backend = MockInferenceBackend::new();
        backend.expect_complete().returning(move |_| match reply {
            Ok(text) => Ok(text.to_string()),
            Err(()) => Err(BackendError::Body("not text".to_string())),
        });
        NonInteractiveRunner::new(
            MessageExchange::new(Box::new(backend)),
            "openai/gpt-4".to_string(),
        )
    }

    #[tokio::test]
    async fn test_reply_is_reported() {
        let mut state = state();
        let runner = runner(Ok("hi there"));

        let result = runner.execute(&mut state, "hello", true).await;

        assert!(result.succeeded());
        assert_eq!(result.response.as_deref(), Some("hi there"));
        assert_eq!(runner.format_result(&result, OutputFormat::Text), "hi there");
        let json: serde_json::Value =
            serde_json::from_str(&runner.format_result(&result, OutputFormat::Json)).unwrap();
        assert_eq!(json["status"], "replied");
        assert_eq!(json["metadata"]["model"], "openai/gpt-4");
    }

    #[tokio::test]
    async fn test_failure_reports_notice_and_error() {
        let mut state = state();
        let result = runner(Err(())).execute(&mut state, "hello", true).await;

        assert!(!result.succeeded());
        assert_eq!(result.status, "failed");
        assert_eq!(result.response.as_deref(), Some(EXCHANGE_ERROR_NOTICE));
        assert!(result.error.unwrap().contains("not text"));
    }

    #[tokio::test]
    async fn test_logged_out_prompt() {
        let mut state = state();
        let result = runner(Ok("unused")).execute(&mut state, "hello", false).await;

        assert_eq!(result.status, "auth_required");
        assert_eq!(result.response.as_deref(), Some(LOGIN_REQUIRED_NOTICE));
    }

    #[tokio::test]
    async fn test_blank_prompt_is_skipped() {
        let mut state = state();
        let runner = runner(Ok("unused"));
        let result = runner.execute(&mut state, "  ", true).await;

        assert_eq!(result.status, "skipped");
        assert_eq!(runner.format_result(&result, OutputFormat::Text), "[skipped] no reply");
    }
}
