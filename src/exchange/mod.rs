// Gateway module for exchange - follows the Train Station Pattern
// All external access must go through this gateway

mod backend;
mod http;
mod message_exchange;

pub use backend::{BackendError, ExchangeRequest, InferenceBackend};
pub use http::HttpBackend;
pub use message_exchange::{Begin, ExchangeOutcome, ExchangeTicket, MessageExchange};

#[cfg(test)]
pub use backend::MockInferenceBackend;
