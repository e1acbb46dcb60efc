//! Model-specific prompt optimization and token accounting

mod strategies;

pub use strategies::{
    collapse_whitespace, GuideInfo, ModelGuideOptimizer, NormalizeWhitespace,
    OptimizationStrategy, PatternRule,
};

use crate::resources::GuideTip;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// What to do when the target model has no prompting guide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownModelPolicy {
    /// Return `UnknownModel`
    #[default]
    Fail,
    /// Leave the prompt untouched and report zero savings
    PassThrough,
    /// Apply the generic politeness-stripping rules
    Generic,
}

impl std::str::FromStr for UnknownModelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "pass-through" | "pass_through" | "passthrough" => Ok(Self::PassThrough),
            "generic" => Ok(Self::Generic),
            other => Err(format!(
                "unknown policy '{}' (expected fail, pass-through or generic)",
                other
            )),
        }
    }
}

/// Counts tokens for a piece of text, optionally for a specific model
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str, model_id: Option<&str>) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str, Option<&str>) -> usize + Send + Sync,
{
    fn count(&self, text: &str, model_id: Option<&str>) -> usize {
        self(text, model_id)
    }
}

/// Counts whitespace-separated words
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count(&self, text: &str, _model_id: Option<&str>) -> usize {
        text.split_whitespace().count()
    }
}

/// ~4 characters per token
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimateCounter;

impl TokenCounter for CharEstimateCounter {
    fn count(&self, text: &str, _model_id: Option<&str>) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// BPE counts using the model's own encoding, cl100k when it has none
pub struct TiktokenCounter {
    default: Arc<CoreBPE>,
    per_model: Mutex<HashMap<String, Arc<CoreBPE>>>,
}

impl TiktokenCounter {
    pub fn new() -> Result<Self, anyhow::Error> {
        Ok(Self {
            default: Arc::new(tiktoken_rs::cl100k_base()?),
            per_model: Mutex::new(HashMap::new()),
        })
    }

    fn bpe_for(&self, model_id: Option<&str>) -> Arc<CoreBPE> {
        let Some(model) = model_id else {
            return self.default.clone();
        };

        let mut cache = self
            .per_model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .entry(model.to_string())
            .or_insert_with(|| match tiktoken_rs::get_bpe_from_model(model) {
                Ok(bpe) => Arc::new(bpe),
                Err(_) => {
                    debug!("No tiktoken encoding for {}, using cl100k", model);
                    self.default.clone()
                }
            })
            .clone()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str, model_id: Option<&str>) -> usize {
        self.bpe_for(model_id).encode_with_special_tokens(text).len()
    }
}

/// Counter selection for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    #[default]
    Tiktoken,
    Whitespace,
    CharEstimate,
}

impl CounterKind {
    pub fn build(self) -> Arc<dyn TokenCounter> {
        match self {
            CounterKind::Tiktoken => match TiktokenCounter::new() {
                Ok(counter) => Arc::new(counter),
                Err(e) => {
                    warn!("tiktoken unavailable ({}), counting words instead", e);
                    Arc::new(WhitespaceCounter)
                }
            },
            CounterKind::Whitespace => Arc::new(WhitespaceCounter),
            CounterKind::CharEstimate => Arc::new(CharEstimateCounter),
        }
    }
}

/// A rewrite rule that changed the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRule {
    pub name: String,
    pub before: String,
    pub after: String,
}

/// Before/after view of one optimization pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub original: String,
    pub optimized: String,
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    /// Negative if the rules made the prompt longer
    pub saved_tokens: i64,
    pub saved_percentage: f64,
    pub guide_name: Option<String>,
    pub guide_source: Option<String>,
    pub model: Option<String>,
    pub applied_rules: Vec<AppliedRule>,
    pub tip: Option<GuideTip>,
}

impl OptimizationResult {
    pub fn new(
        original: String,
        optimized: String,
        original_tokens: usize,
        optimized_tokens: usize,
    ) -> Self {
        let saved = original_tokens as i64 - optimized_tokens as i64;
        let percentage = if original_tokens > 0 {
            saved as f64 / original_tokens as f64 * 100.0
        } else {
            0.0
        };

        Self {
            original,
            optimized,
            original_tokens,
            optimized_tokens,
            saved_tokens: saved,
            saved_percentage: percentage,
            guide_name: None,
            guide_source: None,
            model: None,
            applied_rules: Vec::new(),
            tip: None,
        }
    }

    /// Unchanged prompt, zero savings
    pub fn pass_through(prompt: String, tokens: usize, model: Option<&str>) -> Self {
        let mut result = Self::new(prompt.clone(), prompt, tokens, tokens);
        result.model = model.map(str::to_string);
        result
    }
}

impl std::fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.optimized)?;
        writeln!(f)?;
        writeln!(f, "--- Optimization Stats ---")?;
        writeln!(f, "Original tokens: {}", self.original_tokens)?;
        writeln!(f, "Optimized tokens: {}", self.optimized_tokens)?;
        writeln!(
            f,
            "Tokens saved: {} ({:.1}%)",
            self.saved_tokens, self.saved_percentage
        )?;
        if let (Some(name), Some(source)) = (&self.guide_name, &self.guide_source) {
            writeln!(f, "Guide: {} (from {})", name, source)?;
        }
        if !self.applied_rules.is_empty() {
            let names: Vec<&str> = self.applied_rules.iter().map(|r| r.name.as_str()).collect();
            writeln!(f, "Rules applied: {:?}", names)?;
        }
        if let Some(tip) = &self.tip {
            writeln!(f, "Tip: {} - {}", tip.title, tip.description)?;
        }
        Ok(())
    }
}
