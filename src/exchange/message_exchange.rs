use tracing::{info, warn};

use super::backend::{BackendError, ExchangeRequest, InferenceBackend};
use crate::constants::{EXCHANGE_ERROR_NOTICE, LOGIN_REQUIRED_NOTICE};
use crate::session::{ChatState, Message, SessionId};

/// What a send did to the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Not logged in: a login notice was appended, the backend was not called
    AuthRequired { session_id: SessionId },
    /// Blank content (or nothing to retry): nothing happened
    Skipped,
    /// The reply was appended. `redirected` is set when the session was no
    /// longer active by the time the reply arrived.
    Replied { session_id: SessionId, redirected: bool },
    /// The backend failed and the error notice was appended
    Failed { session_id: SessionId, error: String },
    /// The session was deleted while the request was in flight
    Discarded { session_id: SessionId },
}

/// An exchange that has echoed the user message and awaits its reply.
///
/// Carries the session id captured when the exchange began so the reply
/// lands in the right conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeTicket {
    pub session_id: SessionId,
    pub request: ExchangeRequest,
}

/// Result of the synchronous half of a send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Begin {
    /// The backend must be called with this ticket
    Ready(ExchangeTicket),
    /// Resolved locally, no backend call
    Done(ExchangeOutcome),
}

/// Drives request/reply cycles against an inference backend
pub struct MessageExchange {
    backend: Box<dyn InferenceBackend>,
}

impl MessageExchange {
    pub fn new(backend: Box<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    /// Run one full exchange on the active session.
    ///
    /// Never fails: every problem ends up as a chat message.
    pub async fn send(
        &self,
        state: &mut ChatState,
        content: &str,
        model: &str,
        authenticated: bool,
    ) -> ExchangeOutcome {
        match Self::begin(state, content, model, authenticated) {
            Begin::Done(outcome) => outcome,
            Begin::Ready(ticket) => {
                let result = self.backend.complete(&ticket.request).await;
                Self::complete(state, ticket, result)
            }
        }
    }

    /// Resubmit the last user content as a brand new exchange
    pub async fn retry(
        &self,
        state: &mut ChatState,
        model: &str,
        authenticated: bool,
    ) -> ExchangeOutcome {
        let Some(content) = state.last_user_message().map(str::to_owned) else {
            return ExchangeOutcome::Skipped;
        };
        self.send(state, &content, model, authenticated).await
    }

    /// Everything that happens before the backend call: the login gate,
    /// blank-input skip and the optimistic user echo.
    pub fn begin(state: &mut ChatState, content: &str, model: &str, authenticated: bool) -> Begin {
        if !authenticated {
            let session_id = state.active_id();
            append(state, &session_id, Message::bot(LOGIN_REQUIRED_NOTICE));
            return Begin::Done(ExchangeOutcome::AuthRequired { session_id });
        }

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Begin::Done(ExchangeOutcome::Skipped);
        }

        let session_id = state.active_id();
        append(state, &session_id, Message::user(trimmed));

        let pending = state.pending_mut();
        pending.last_user_message = Some(trimmed.to_string());
        pending.in_flight += 1;

        // The backend gets the input as typed; only the echo is trimmed
        Begin::Ready(ExchangeTicket {
            session_id,
            request: ExchangeRequest {
                message: content.to_string(),
                model: model.to_string(),
            },
        })
    }

    /// Apply a backend result to the session named by the ticket
    pub fn complete(
        state: &mut ChatState,
        ticket: ExchangeTicket,
        result: Result<String, BackendError>,
    ) -> ExchangeOutcome {
        let pending = state.pending_mut();
        pending.in_flight = pending.in_flight.saturating_sub(1);

        let session_id = ticket.session_id;
        if !state.registry().contains(&session_id) {
            warn!(session = %session_id, "reply arrived for a deleted session, discarding");
            return ExchangeOutcome::Discarded { session_id };
        }

        let redirected = state.tracker().current() != Some(session_id.as_str());
        if redirected {
            info!(session = %session_id, "reply delivered to a session that is no longer active");
        }

        match result {
            Ok(reply) => {
                append(state, &session_id, Message::bot(reply));
                ExchangeOutcome::Replied {
                    session_id,
                    redirected,
                }
            }
            Err(e) => {
                warn!(session = %session_id, "chat request failed: {}", e);
                append(state, &session_id, Message::bot(EXCHANGE_ERROR_NOTICE));
                ExchangeOutcome::Failed {
                    session_id,
                    error: e.to_string(),
                }
            }
        }
    }
}

fn append(state: &mut ChatState, session_id: &str, message: Message) {
    // Callers resolve the id against the registry first
    if let Err(e) = state.registry_mut().append_message(session_id, message) {
        warn!("⚠️  Dropped message: {}", e);
    }
}
