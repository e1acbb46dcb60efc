//! Running totals of what optimization and compression saved

use crate::gateway::CompressionComparison;
use crate::optimization::OptimizationResult;
use serde::{Deserialize, Serialize};

/// Savings accumulated over a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsMetrics {
    /// Guide optimizations recorded
    pub optimizations: u64,
    /// Tokens before guide optimization
    pub original_tokens: u64,
    /// Tokens saved by guide optimization
    pub tokens_saved: i64,
    /// Compression calls recorded
    pub compressions: u64,
    /// Tokens removed by the compression service
    pub compression_tokens_saved: i64,
    /// In the service's cost units
    pub cost_saved: f64,
    /// gCO2e
    pub carbon_saved: f64,
    /// Milliseconds
    pub time_saved: f64,
}

impl SavingsMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_optimization(&mut self, result: &OptimizationResult) {
        self.optimizations += 1;
        self.original_tokens += result.original_tokens as u64;
        self.tokens_saved += result.saved_tokens;
    }

    pub fn record_compression(&mut self, comparison: &CompressionComparison) {
        self.compressions += 1;
        self.compression_tokens_saved += comparison.tokens;
        self.cost_saved += comparison.cost;
        self.carbon_saved += comparison.carbon_saved;
        self.time_saved += comparison.time_saved;
    }

    /// Share of original tokens removed by guide optimization
    pub fn average_savings_percent(&self) -> f64 {
        if self.original_tokens == 0 {
            return 0.0;
        }
        self.tokens_saved as f64 / self.original_tokens as f64 * 100.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Display for SavingsMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Savings Summary ===")?;
        writeln!(f, "Optimizations: {}", self.optimizations)?;
        writeln!(
            f,
            "Tokens saved by guides: {} ({:.1}%)",
            self.tokens_saved,
            self.average_savings_percent()
        )?;
        writeln!(f, "Compressions: {}", self.compressions)?;
        writeln!(f, "Tokens saved by compression: {}", self.compression_tokens_saved)?;
        writeln!(f, "Cost saved: {:.5}", self.cost_saved)?;
        writeln!(f, "Carbon saved: {:.3} gCO2e", self.carbon_saved)?;
        writeln!(f, "Time saved: {:.0} ms", self.time_saved)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_optimizations() {
        let mut metrics = SavingsMetrics::new();
        metrics.record_optimization(&OptimizationResult::new("a".into(), "b".into(), 10, 6));
        metrics.record_optimization(&OptimizationResult::new("a".into(), "b".into(), 10, 8));

        assert_eq!(metrics.optimizations, 2);
        assert_eq!(metrics.tokens_saved, 6);
        assert!((metrics.average_savings_percent() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_accumulates_compressions() {
        let mut metrics = SavingsMetrics::new();
        let comparison = CompressionComparison {
            tokens: 12,
            savings_percent: 20.0,
            cost: 1.5,
            carbon_saved: 0.25,
            time_saved: 40.0,
        };
        metrics.record_compression(&comparison);
        metrics.record_compression(&comparison);

        assert_eq!(metrics.compressions, 2);
        assert_eq!(metrics.compression_tokens_saved, 24);
        assert_eq!(metrics.carbon_saved, 0.5);
        assert_eq!(metrics.time_saved, 80.0);

        metrics.reset();
        assert_eq!(metrics, SavingsMetrics::default());
    }

    #[test]
    fn test_empty_average() {
        assert_eq!(SavingsMetrics::new().average_savings_percent(), 0.0);
    }
}
