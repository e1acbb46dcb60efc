//! HTTP transport for the compression endpoint

use super::{CompressRequest, CompressResponse, CompressionTransport, GatewayConfig};
use crate::error::{PromptError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Outcome of one attempt, before retry policy is applied
enum Attempt {
    Done(CompressResponse),
    Transient(String),
}

/// `reqwest`-backed transport with a request timeout and bounded retries
pub struct HttpTransport {
    config: GatewayConfig,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PromptError::GatewayUnavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/compress", self.config.base_url.trim_end_matches('/'))
    }

    async fn attempt(&self, url: &str, request: &CompressRequest) -> Result<Attempt> {
        let response = match self
            .client
            .post(url)
            .header("accept", "*/*")
            .header("content-type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(Attempt::Transient(e.to_string())),
        };

        let status = response.status();
        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| PromptError::GatewayUnavailable(e.to_string()))?;
            let parsed: CompressResponse = serde_json::from_str(&body)
                .map_err(|e| PromptError::GatewayResponse(e.to_string()))?;
            return Ok(Attempt::Done(parsed));
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Ok(Attempt::Transient(format!("{}: {}", status, body)))
        } else {
            Err(PromptError::GatewayRejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl CompressionTransport for HttpTransport {
    async fn send(&self, request: &CompressRequest) -> Result<CompressResponse> {
        let url = self.endpoint();
        let attempts = self.config.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            debug!("POST {} (attempt {}/{})", url, attempt, attempts);

            match self.attempt(&url, request).await? {
                Attempt::Done(response) => return Ok(response),
                Attempt::Transient(message) => {
                    warn!("Compression request failed: {}", message);
                    last_error = message;
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_backoff * attempt).await;
                    }
                }
            }
        }

        Err(PromptError::GatewayUnavailable(format!(
            "{} after {} attempt(s)",
            last_error, attempts
        )))
    }
}
