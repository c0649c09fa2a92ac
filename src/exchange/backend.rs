use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of one backend request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub message: String,
    pub model: String,
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unreadable response body: {0}")]
    Body(String),
}

/// The inference endpoint, seen as an opaque request → text function
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send one request and return the reply text verbatim
    async fn complete(&self, request: &ExchangeRequest) -> Result<String, BackendError>;
}
