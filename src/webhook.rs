//! Webhook delivery client for alert channels.
//!
//! Sending never fails with an error: every outcome, including transport
//! failures, is reported as a [`WebhookResponse`] so batch callers can decide
//! whether to continue.

use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Default timeout for webhook requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a single webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    /// HTTP status, or 0 when no response was received
    pub status_code: u16,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
enum DeliveryError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Transport(String),
}

impl DeliveryError {
    /// Server errors, rate limiting and transport failures are worth retrying
    fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::Status { status, .. } => *status >= 500 || *status == 429,
            DeliveryError::Transport(_) => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    retry: RetryConfig,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;

        Ok(Self {
            http,
            retry: RetryConfig::webhook(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// POST a JSON payload to a webhook URL.
    pub async fn send_message(&self, webhook_url: &str, payload: &Value) -> WebhookResponse {
        info!("Sending message to webhook");

        let result = with_retry_if(
            &self.retry,
            "Webhook delivery",
            move || async move {
                let response = self
                    .http
                    .post(webhook_url)
                    .json(payload)
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_timeout() {
                            DeliveryError::Transport("Request timed out".to_string())
                        } else {
                            DeliveryError::Transport(e.to_string())
                        }
                    })?;

                let status = response.status();
                if status.is_success() {
                    Ok(status.as_u16())
                } else {
                    let body = response.text().await.unwrap_or_default();
                    Err(DeliveryError::Status {
                        status: status.as_u16(),
                        body,
                    })
                }
            },
            DeliveryError::is_retryable,
        )
        .await;

        match result {
            Ok(status_code) => {
                info!("Message delivered to webhook");
                WebhookResponse {
                    success: true,
                    status_code,
                    error: None,
                }
            }
            Err(DeliveryError::Status { status, body }) => {
                warn!("Webhook returned non-success: {} - {}", status, body);
                WebhookResponse {
                    success: false,
                    status_code: status,
                    error: Some(body),
                }
            }
            Err(DeliveryError::Transport(message)) => {
                error!("Webhook request failed: {}", message);
                WebhookResponse {
                    success: false,
                    status_code: 0,
                    error: Some(message),
                }
            }
        }
    }

    /// Send several payloads, pausing `rate_limit` between them.
    ///
    /// With `stop_on_error` the batch ends at the first failure, so the result
    /// may be shorter than `payloads`.
    pub async fn send_messages(
        &self,
        webhook_url: &str,
        payloads: &[Value],
        rate_limit: Duration,
        stop_on_error: bool,
    ) -> Vec<WebhookResponse> {
        let mut responses = Vec::with_capacity(payloads.len());

        for (i, payload) in payloads.iter().enumerate() {
            if i > 0 && !rate_limit.is_zero() {
                sleep(rate_limit).await;
            }

            let response = self.send_message(webhook_url, payload).await;
            let failed = !response.success;
            responses.push(response);

            if stop_on_error && failed {
                warn!(
                    "Stopping batch send after error on message {} of {}",
                    i + 1,
                    payloads.len()
                );
                break;
            }
        }

        responses
    }
}

/// Payload used to check that a channel is reachable.
pub fn test_message(channel_name: &str) -> Value {
    json!({
        "text": format!("Test alert from quake-alerts for channel '{}'", channel_name),
    })
}
