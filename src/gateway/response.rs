//! Compression response parsing and metric reconciliation

use crate::error::{PromptError, Result};
use serde::{Deserialize, Serialize};

/// Token and cost figures for one side of the comparison
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UsageFigures {
    #[serde(default)]
    pub tokens: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
}

/// Savings block as sent by the service; every field is optional on the wire
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WireComparison {
    #[serde(default)]
    pub tokens: Option<f64>,
    #[serde(default, alias = "savings_percent")]
    pub savings: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub carbon_saved: Option<f64>,
    #[serde(default)]
    pub time_saved: Option<f64>,
}

/// Raw response from the compression endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompressResponse {
    #[serde(default)]
    pub compressed_text: Option<String>,
    #[serde(default)]
    pub compressed_prompt: Option<String>,
    #[serde(default)]
    pub compressed_response: Option<String>,
    #[serde(default)]
    pub full_usage: Option<UsageFigures>,
    #[serde(default)]
    pub compressed_usage: Option<UsageFigures>,
    #[serde(default)]
    pub original_tokens: Option<f64>,
    #[serde(default)]
    pub compressed_tokens: Option<f64>,
    #[serde(default)]
    pub comparison: Option<WireComparison>,
}

/// Savings reported for one compression call
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CompressionComparison {
    /// Tokens removed (original minus compressed)
    pub tokens: i64,
    pub savings_percent: f64,
    /// In the service's cost units
    pub cost: f64,
    /// gCO2e
    pub carbon_saved: f64,
    /// Milliseconds
    pub time_saved: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionReport {
    pub model: String,
    pub rate: f64,
    pub compressed_text: String,
    pub full_usage: UsageFigures,
    pub compressed_usage: UsageFigures,
    pub comparison: CompressionComparison,
}

impl CompressResponse {
    /// Fill gaps in the comparison block from the usage figures
    pub fn reconcile(self, model: &str, rate: f64) -> Result<CompressionReport> {
        let compressed_text = self
            .compressed_text
            .or(self.compressed_prompt)
            .or(self.compressed_response)
            .ok_or_else(|| PromptError::GatewayResponse("missing compressed text".into()))?;

        let mut full_usage = self.full_usage.unwrap_or_default();
        let mut compressed_usage = self.compressed_usage.unwrap_or_default();
        full_usage.tokens = full_usage.tokens.or(self.original_tokens);
        compressed_usage.tokens = compressed_usage.tokens.or(self.compressed_tokens);

        let wire = self.comparison.unwrap_or_default();

        let tokens = match (wire.tokens, full_usage.tokens, compressed_usage.tokens) {
            (Some(delta), _, _) => delta,
            (None, Some(full), Some(compressed)) => full - compressed,
            _ => {
                return Err(PromptError::GatewayResponse(
                    "no token figures in response".into(),
                ))
            }
        };

        let savings_percent = wire.savings.unwrap_or_else(|| match full_usage.tokens {
            Some(full) if full > 0.0 => tokens / full * 100.0,
            _ => 0.0,
        });

        let cost = wire.cost.unwrap_or_else(|| match (full_usage.cost, compressed_usage.cost) {
            (Some(full), Some(compressed)) => full - compressed,
            _ => 0.0,
        });

        Ok(CompressionReport {
            model: model.to_string(),
            rate,
            compressed_text,
            full_usage,
            compressed_usage,
            comparison: CompressionComparison {
                tokens: tokens.round() as i64,
                savings_percent,
                cost,
                carbon_saved: wire.carbon_saved.unwrap_or(0.0),
                time_saved: wire.time_saved.unwrap_or(0.0),
            },
        })
    }
}

impl std::fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.compressed_text)?;
        writeln!(f)?;
        writeln!(f, "--- Compression ({} @ rate {:.2}) ---", self.model, self.rate)?;
        if let Some(tokens) = self.full_usage.tokens {
            writeln!(f, "Original tokens: {}", tokens)?;
        }
        if let Some(tokens) = self.compressed_usage.tokens {
            writeln!(f, "Compressed tokens: {}", tokens)?;
        }
        let c = &self.comparison;
        writeln!(f, "Token reduction: {} ({:.1}%)", c.tokens, c.savings_percent)?;
        writeln!(f, "Cost savings: {:.5}", c.cost)?;
        writeln!(f, "Carbon saved: {} gCO2e", c.carbon_saved)?;
        writeln!(f, "Time saved: {} ms", c.time_saved)?;
        Ok(())
    }
}
