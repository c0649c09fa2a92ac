use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::backend::{BackendError, ExchangeRequest, InferenceBackend};
use crate::app::BackendConfig;

/// Backend reached over HTTP: `POST <url>` with `{message, model}`, plain
/// text back.
pub struct HttpBackend {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    /// Build a backend from configuration. The API key, if any, is read
    /// from the environment variable named in the config.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty());

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .context("Failed to build HTTP client")?,
            url: config.url.clone(),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    async fn complete(&self, request: &ExchangeRequest) -> Result<String, BackendError> {
        let mut builder = self.client.post(&self.url).json(request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        debug!(url = %self.url, model = %request.model, "sending chat request");
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| BackendError::Body(e.to_string()))
    }
}
