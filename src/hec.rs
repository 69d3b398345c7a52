use crate::{
    envelope::EventEnvelope,
    error::{ForwardError, RuntimeError},
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use std::time::Duration;

/// `Transport` sends one batch of events to the collector
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the batch and return the collector acknowledgment.
    async fn send(&self, batch: &[EventEnvelope]) -> Result<Value, ForwardError>;
}

/// HTTP Event Collector client.
pub struct HecClient {
    inner: reqwest::Client,
    url: String,
    token: String,
}

impl HecClient {
    /// Initialize the collector client.
    #[tracing::instrument(skip(token))]
    pub fn new(
        url: &str,
        token: &str,
        timeout: Duration,
        verify_tls: bool,
    ) -> Result<HecClient, RuntimeError> {
        if !verify_tls {
            tracing::warn!("tls certificate verification is disabled for the hec endpoint");
        }

        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;

        Ok(HecClient {
            inner,
            url: url.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl Transport for HecClient {
    #[tracing::instrument(skip(self, batch), fields(size = batch.len()))]
    async fn send(&self, batch: &[EventEnvelope]) -> Result<Value, ForwardError> {
        let response = self
            .inner
            .post(&self.url)
            .header(AUTHORIZATION, format!("Splunk {}", self.token))
            .json(batch)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ForwardError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
