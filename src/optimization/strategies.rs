//! Rewrite rules and the guide-driven optimizer

use super::{AppliedRule, OptimizationResult, TokenCounter, UnknownModelPolicy};
use crate::error::{PromptError, Result};
use crate::resources::{generic_rules, ModelGuide, Resources, RewriteRule};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A pure text transform, applied in sequence with others
pub trait OptimizationStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, text: &str) -> String;
}

/// Regex rewrite taken from a prompting guide
pub struct PatternRule {
    pattern: String,
    regex: Regex,
    replacement: String,
}

impl PatternRule {
    pub fn compile(rule: &RewriteRule) -> Result<Self> {
        let regex = Regex::new(&rule.pattern).map_err(|source| PromptError::InvalidPattern {
            pattern: rule.pattern.clone(),
            source,
        })?;

        Ok(Self {
            pattern: rule.pattern.clone(),
            regex,
            replacement: rule.replacement.clone(),
        })
    }
}

impl OptimizationStrategy for PatternRule {
    fn name(&self) -> &str {
        &self.pattern
    }

    fn apply(&self, text: &str) -> String {
        self.regex
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Collapse runs of spaces and tabs inside each line, keeping indentation
/// and leaving fenced blocks untouched
pub struct NormalizeWhitespace;

impl OptimizationStrategy for NormalizeWhitespace {
    fn name(&self) -> &str {
        "normalize_whitespace"
    }

    fn apply(&self, text: &str) -> String {
        let mut in_fence = false;
        let lines: Vec<String> = text
            .lines()
            .map(|line| {
                let fence = is_fence(line);
                if in_fence || fence {
                    if fence {
                        in_fence = !in_fence;
                    }
                    return line.to_string();
                }
                let body = line.trim_start();
                if body.is_empty() {
                    return String::new();
                }
                let indent = &line[..line.len() - body.len()];
                format!("{}{}", indent, collapse_whitespace(body))
            })
            .collect();

        let first = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
        let last = lines.iter().rposition(|l| !l.is_empty()).map_or(first, |i| i + 1);
        lines[first..last].join("\n")
    }
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

pub fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result.trim().to_string()
}

/// Summary of a guide for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideInfo {
    pub name: String,
    pub source: String,
    pub url: String,
    pub tip_count: usize,
    pub rule_count: usize,
}

impl From<&ModelGuide> for GuideInfo {
    fn from(guide: &ModelGuide) -> Self {
        Self {
            name: guide.guide_name.clone(),
            source: guide.guide_source.clone(),
            url: guide.url.clone(),
            tip_count: guide.tips.len(),
            rule_count: guide.rules.len(),
        }
    }
}

type RuleSet = Vec<Box<dyn OptimizationStrategy>>;

fn compile_rules(rules: &[RewriteRule]) -> Result<RuleSet> {
    let mut compiled: RuleSet = Vec::with_capacity(rules.len() + 1);
    for rule in rules {
        compiled.push(Box::new(PatternRule::compile(rule)?));
    }
    compiled.push(Box::new(NormalizeWhitespace));
    Ok(compiled)
}

/// Applies a model's prompting-guide rules and measures the token difference
pub struct ModelGuideOptimizer {
    resources: Arc<Resources>,
    counter: Arc<dyn TokenCounter>,
    policy: UnknownModelPolicy,
    rulesets: HashMap<String, RuleSet>,
    generic: RuleSet,
}

impl ModelGuideOptimizer {
    pub fn new(
        resources: Arc<Resources>,
        counter: Arc<dyn TokenCounter>,
        policy: UnknownModelPolicy,
    ) -> Result<Self> {
        let mut rulesets = HashMap::new();
        for guide in resources.guides() {
            rulesets.insert(guide.key.clone(), compile_rules(&guide.rules)?);
        }
        let generic = compile_rules(&generic_rules())?;

        Ok(Self {
            resources,
            counter,
            policy,
            rulesets,
            generic,
        })
    }

    pub fn policy(&self) -> UnknownModelPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: UnknownModelPolicy) {
        self.policy = policy;
    }

    pub fn count_tokens(&self, text: &str, model_id: Option<&str>) -> usize {
        self.counter.count(text, model_id)
    }

    pub fn has_guide(&self, model_id: &str) -> bool {
        self.resources.guide_for_model(model_id).is_some()
    }

    pub fn guide_info(&self, model_id: &str) -> Option<GuideInfo> {
        self.resources.guide_for_model(model_id).map(GuideInfo::from)
    }

    /// Unchanged prompt with its token count
    pub fn pass_through(&self, prompt: &str, model_id: Option<&str>) -> OptimizationResult {
        let tokens = self.count_tokens(prompt, model_id);
        OptimizationResult::pass_through(prompt.to_string(), tokens, model_id)
    }

    /// Rewrite `prompt` using the guide for `model_id`
    pub fn optimize_for_model(&self, prompt: &str, model_id: &str) -> Result<OptimizationResult> {
        let Some(guide) = self.resources.guide_for_model(model_id) else {
            return match self.policy {
                UnknownModelPolicy::Fail => Err(PromptError::UnknownModel(model_id.to_string())),
                UnknownModelPolicy::PassThrough => {
                    debug!("No guide for {}, passing prompt through", model_id);
                    Ok(self.pass_through(prompt, Some(model_id)))
                }
                UnknownModelPolicy::Generic => {
                    debug!("No guide for {}, applying generic rules", model_id);
                    Ok(self.run_rules(prompt, model_id, &self.generic))
                }
            };
        };

        let rules = self
            .rulesets
            .get(&guide.key)
            .ok_or_else(|| PromptError::UnknownModel(model_id.to_string()))?;

        let mut result = self.run_rules(prompt, model_id, rules);
        result.guide_name = Some(guide.guide_name.clone());
        result.guide_source = Some(guide.guide_source.clone());
        result.tip = pick_tip(guide, prompt);
        Ok(result)
    }

    fn run_rules(&self, prompt: &str, model_id: &str, rules: &RuleSet) -> OptimizationResult {
        let mut optimized = prompt.to_string();
        let mut applied = Vec::new();

        for rule in rules {
            let next = rule.apply(&optimized);
            if next != optimized {
                debug!("Rule '{}' rewrote prompt", rule.name());
                applied.push(AppliedRule {
                    name: rule.name().to_string(),
                    before: optimized.clone(),
                    after: next.clone(),
                });
                optimized = next;
            }
        }

        let original_tokens = self.count_tokens(prompt, Some(model_id));
        let optimized_tokens = self.count_tokens(&optimized, Some(model_id));

        let mut result =
            OptimizationResult::new(prompt.to_string(), optimized, original_tokens, optimized_tokens);
        result.model = Some(model_id.to_string());
        result.applied_rules = applied;
        result
    }
}

/// Deterministic so repeated optimizations of the same prompt agree
fn pick_tip(guide: &ModelGuide, prompt: &str) -> Option<crate::resources::GuideTip> {
    if guide.tips.is_empty() {
        return None;
    }
    let index = (simple_hash(prompt) % guide.tips.len() as u64) as usize;
    guide.tips.get(index).cloned()
}

/// FNV-1a, fixed across builds and platforms
fn simple_hash(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::WhitespaceCounter;

    fn optimizer(policy: UnknownModelPolicy) -> ModelGuideOptimizer {
        ModelGuideOptimizer::new(Resources::shared(), Arc::new(WhitespaceCounter), policy).unwrap()
    }

    #[test]
    fn test_politeness_stripped_for_gpt() {
        let result = optimizer(UnknownModelPolicy::Fail)
            .optimize_for_model("Hello, could you please help me?", "gpt-4")
            .unwrap();

        assert!(result.optimized.len() < result.original.len());
        assert!(result.saved_tokens > 0);
        assert_eq!(result.optimized, "Hello, help me?");
        assert_eq!(result.guide_name.as_deref(), Some("GPT"));
        assert_eq!(result.guide_source.as_deref(), Some("OpenAI"));
        assert!(result.tip.is_some());
        assert!(!result.applied_rules.is_empty());
    }

    #[test]
    fn test_savings_bounded() {
        let result = optimizer(UnknownModelPolicy::Fail)
            .optimize_for_model(
                "Could you please kindly summarize this article if possible?",
                "llama-3-70b",
            )
            .unwrap();
        assert!(result.optimized_tokens <= result.original_tokens);
        assert!((0.0..=100.0).contains(&result.saved_percentage));
    }

    #[test]
    fn test_unknown_model_policies() {
        let prompt = "Please explain  monads.";

        assert!(matches!(
            optimizer(UnknownModelPolicy::Fail).optimize_for_model(prompt, "mistral-large"),
            Err(PromptError::UnknownModel(m)) if m == "mistral-large"
        ));

        let passed = optimizer(UnknownModelPolicy::PassThrough)
            .optimize_for_model(prompt, "mistral-large")
            .unwrap();
        assert_eq!(passed.optimized, prompt);
        assert_eq!(passed.saved_tokens, 0);
        assert_eq!(passed.saved_percentage, 0.0);
        assert!(passed.guide_name.is_none());

        let generic = optimizer(UnknownModelPolicy::Generic)
            .optimize_for_model(prompt, "mistral-large")
            .unwrap();
        assert_eq!(generic.optimized, "explain monads.");
        assert!(generic.guide_name.is_none());
    }

    #[test]
    fn test_optimization_is_stable() {
        let opt = optimizer(UnknownModelPolicy::Fail);
        let prompt = "I'm wondering if you might be able to explain recursion?";
        let a = opt.optimize_for_model(prompt, "claude-3-opus").unwrap();
        let b = opt.optimize_for_model(prompt, "claude-3-opus").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.optimized, "explain recursion?");
    }

    #[test]
    fn test_rules_applied_in_declared_order() {
        // "Could you please " is matched as a whole by the first llama rule,
        // so the standalone "Please" rule never fires.
        let result = optimizer(UnknownModelPolicy::Fail)
            .optimize_for_model("Could you please list three facts.", "llama-3")
            .unwrap();
        assert_eq!(result.optimized, "list three facts.");
        assert_eq!(result.applied_rules.len(), 1);
        assert_eq!(result.applied_rules[0].name, r"Could you please\s+");
    }

    #[test]
    fn test_normalize_whitespace_keeps_lines() {
        let out = NormalizeWhitespace.apply("a   b \n\tc\t\td  \n\n");
        assert_eq!(out, "a b\n\tc d");
    }

    #[test]
    fn test_indented_code_survives_optimization() {
        let prompt = "Review this:\n\ndef f(x):\n    if x:\n        return 1\n    return 0";
        let result = optimizer(UnknownModelPolicy::Fail)
            .optimize_for_model(prompt, "gpt-4")
            .unwrap();
        assert_eq!(result.optimized, prompt);
        assert_eq!(result.saved_tokens, 0);

        let result = optimizer(UnknownModelPolicy::Fail)
            .optimize_for_model(&format!("Please review   this:\n\n{}", &prompt[14..]), "gpt-4")
            .unwrap();
        assert_eq!(
            result.optimized,
            "review this:\n\ndef f(x):\n    if x:\n        return 1\n    return 0"
        );
    }

    #[test]
    fn test_fenced_blocks_untouched() {
        let text = "Fix  it:\n```\nlet  x =   1;\n\n   y\n```\nthanks";
        assert_eq!(
            NormalizeWhitespace.apply(text),
            "Fix it:\n```\nlet  x =   1;\n\n   y\n```\nthanks"
        );
    }

    #[test]
    fn test_tip_hash_is_fixed() {
        assert_eq!(simple_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(simple_hash("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_pattern_rule_rejects_bad_regex() {
        let bad = RewriteRule {
            pattern: "(".to_string(),
            replacement: String::new(),
        };
        assert!(matches!(
            PatternRule::compile(&bad),
            Err(PromptError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_guide_info() {
        let opt = optimizer(UnknownModelPolicy::Fail);
        let info = opt.guide_info("gpt-4o").unwrap();
        assert_eq!(info.name, "GPT");
        assert_eq!(info.tip_count, 5);
        assert!(opt.guide_info("unknown").is_none());
        assert!(opt.has_guide("claude-3-haiku"));
    }
}
