//! Gateway to the remote prompt-compression service
//!
//! This layer validates the rate, builds the request, and turns the service's
//! answer into a [`CompressionComparison`]. Moving bytes is the job of a
//! [`CompressionTransport`]; [`HttpTransport`] is the production one.

mod client;
mod request;
mod response;

pub use client::HttpTransport;
pub use request::{CompressRequest, RateOptions};
pub use response::{
    CompressResponse, CompressionComparison, CompressionReport, UsageFigures, WireComparison,
};

use crate::error::{PromptError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://tc9sbclr37.execute-api.us-east-1.amazonaws.com/dev";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Extra attempts after a transient failure
    pub max_retries: u32,
    /// Multiplied by the attempt number between retries
    pub retry_backoff: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// Moves a compression request to the service and back
#[async_trait]
pub trait CompressionTransport: Send + Sync {
    async fn send(&self, request: &CompressRequest) -> Result<CompressResponse>;
}

pub fn validate_rate(rate: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(PromptError::InvalidRate(rate))
    }
}

pub struct CompressionGateway {
    transport: Box<dyn CompressionTransport>,
}

impl CompressionGateway {
    pub fn new(transport: impl CompressionTransport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub fn http(config: GatewayConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }

    /// Compress `prompt` for `model` and return the full report
    pub async fn compress(&self, prompt: &str, model: &str, rate: f64) -> Result<CompressionReport> {
        let rate = validate_rate(rate)?;
        let request = CompressRequest::new(prompt, model, rate);

        let report = self.transport.send(&request).await?.reconcile(model, rate)?;
        info!(
            "Compressed prompt for {}: {} tokens saved ({:.1}%)",
            model, report.comparison.tokens, report.comparison.savings_percent
        );
        Ok(report)
    }

    pub async fn compress_via_api(
        &self,
        prompt: &str,
        model: &str,
        rate: f64,
    ) -> Result<CompressionComparison> {
        Ok(self.compress(prompt, model, rate).await?.comparison)
    }
}
