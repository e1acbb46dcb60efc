//! Session orchestration
//!
//! A [`Session`] holds the caller's current choices (template, fill-in values,
//! style, target model) and sequences rendering, styling, guide optimization
//! and remote compression. Each session is owned by exactly one caller; the
//! reference tables it reads from are shared.

use crate::config::Config;
use crate::error::{PromptError, Result};
use crate::gateway::{self, CompressionComparison, CompressionGateway, CompressionReport};
use crate::metrics::SavingsMetrics;
use crate::optimization::{
    CounterKind, GuideInfo, ModelGuideOptimizer, OptimizationResult, TokenCounter,
    UnknownModelPolicy,
};
use crate::resources::{ResourceCategory, ResourceRecord, Resources};
use crate::style::{self, Style};
use crate::template::{self, RenderReport, Template};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a session is in the select/fill cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// No template chosen yet
    Empty,
    /// Template chosen, no values supplied since
    TemplateSelected,
    /// Some values supplied, placeholders still open
    ValuesSet,
    /// Every placeholder has a value
    Ready,
}

pub struct Session {
    resources: Arc<Resources>,
    optimizer: ModelGuideOptimizer,
    gateway: Option<CompressionGateway>,
    state: SessionState,
    template: Option<Template>,
    values: HashMap<String, String>,
    style: Option<Style>,
    model: Option<String>,
    metrics: SavingsMetrics,
}

impl Session {
    pub fn new(
        resources: Arc<Resources>,
        counter: Arc<dyn TokenCounter>,
        policy: UnknownModelPolicy,
    ) -> Result<Self> {
        let optimizer = ModelGuideOptimizer::new(resources.clone(), counter, policy)?;

        Ok(Self {
            resources,
            optimizer,
            gateway: None,
            state: SessionState::Empty,
            template: None,
            values: HashMap::new(),
            style: None,
            model: None,
            metrics: SavingsMetrics::new(),
        })
    }

    /// Session over the built-in tables with the default counter and policy
    pub fn builtin() -> Result<Self> {
        Self::new(
            Resources::shared(),
            CounterKind::default().build(),
            UnknownModelPolicy::default(),
        )
    }

    /// Session over the built-in tables, configured from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let counter = config.optimization.token_counter.build();
        let mut session = Self::new(
            Resources::shared(),
            counter,
            config.optimization.unknown_model,
        )?;

        if config.gateway.enabled {
            session.gateway = Some(CompressionGateway::http(config.gateway_config())?);
        }
        if let Some(model) = &config.session.default_model {
            session.select_model(model);
        }
        if let Some(style_id) = &config.session.default_style {
            session.select_style(style_id)?;
        }

        Ok(session)
    }

    pub fn with_gateway(mut self, gateway: CompressionGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn load(&self, category: ResourceCategory) -> Vec<ResourceRecord> {
        self.resources.load(category)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn style(&self) -> Option<&Style> {
        self.style.as_ref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn metrics(&self) -> &SavingsMetrics {
        &self.metrics
    }

    pub fn set_unknown_model_policy(&mut self, policy: UnknownModelPolicy) {
        self.optimizer.set_policy(policy);
    }

    /// Choose a template; clears any previously supplied values
    pub fn select_template(&mut self, template_id: &str) -> Result<&Template> {
        let template = self
            .resources
            .template(template_id)
            .cloned()
            .ok_or_else(|| PromptError::TemplateNotFound(template_id.to_string()))?;

        info!("Selected template {}", template.id);
        self.values.clear();
        self.state = SessionState::TemplateSelected;
        Ok(self.template.insert(template))
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.set_values([(key.into(), value.into())])
    }

    /// Merge values into the current fill-ins
    pub fn set_values<I, K, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let template = self.template.as_ref().ok_or(PromptError::NoTemplateSelected)?;

        self.values
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));

        let complete = template
            .placeholders()
            .iter()
            .all(|name| self.values.contains_key(name));
        self.state = if complete {
            SessionState::Ready
        } else {
            SessionState::ValuesSet
        };
        debug!("Session state now {:?}", self.state);
        Ok(())
    }

    pub fn select_style(&mut self, style_id: &str) -> Result<&Style> {
        let style = self
            .resources
            .style(style_id)
            .cloned()
            .ok_or_else(|| PromptError::StyleNotFound(style_id.to_string()))?;

        info!("Selected style {}", style.id);
        Ok(self.style.insert(style))
    }

    /// Synthesize an expert style and select it for this session only
    pub fn create_expert_style(
        &mut self,
        domain: &str,
        role: &str,
        expertise_level: i32,
    ) -> Result<&Style> {
        let style = style::create_expert_style(domain, role, expertise_level)?;
        info!("Selected expert style {}", style.id);
        Ok(self.style.insert(style))
    }

    pub fn clear_style(&mut self) {
        self.style = None;
    }

    /// Target model; any id is accepted, guide lookup happens at optimize time
    pub fn select_model(&mut self, model_id: &str) {
        info!("Selected model {}", model_id);
        self.model = Some(model_id.to_string());
    }

    pub fn clear_model(&mut self) {
        self.model = None;
    }

    /// Rendered template plus key bookkeeping, without styling
    pub fn render_report(&self) -> Result<RenderReport> {
        let template = self.template.as_ref().ok_or(PromptError::NoTemplateSelected)?;
        Ok(template::render_report(template, &self.values))
    }

    /// Rendered and styled prompt
    pub fn get_prompt(&self) -> Result<String> {
        let template = self.template.as_ref().ok_or(PromptError::NoTemplateSelected)?;
        let rendered = template.render(&self.values);
        Ok(style::apply_style(&rendered, self.style.as_ref()))
    }

    /// render -> apply style -> guide optimization for the selected model
    pub fn optimize(&mut self) -> Result<OptimizationResult> {
        let prompt = self.get_prompt()?;
        self.optimize_text(&prompt)
    }

    /// Optimize arbitrary text for the selected model (pass-through without one)
    pub fn optimize_text(&mut self, prompt: &str) -> Result<OptimizationResult> {
        let result = match self.model.as_deref() {
            Some(model) => self.optimizer.optimize_for_model(prompt, model)?,
            None => self.optimizer.pass_through(prompt, None),
        };

        self.metrics.record_optimization(&result);
        Ok(result)
    }

    pub fn guide_info(&self) -> Result<Option<GuideInfo>> {
        let model = self.model.as_deref().ok_or(PromptError::NoModelSelected)?;
        Ok(self.optimizer.guide_info(model))
    }

    /// Send the current prompt to the compression service
    pub async fn compress_report(&mut self, rate: f64) -> Result<CompressionReport> {
        let rate = gateway::validate_rate(rate)?;
        let model = self.model.clone().ok_or(PromptError::NoModelSelected)?;
        let prompt = self.get_prompt()?;
        let gateway = self.gateway.as_ref().ok_or_else(|| {
            PromptError::GatewayUnavailable("no compression gateway configured".to_string())
        })?;

        let report = gateway.compress(&prompt, &model, rate).await?;
        self.metrics.record_compression(&report.comparison);
        Ok(report)
    }

    pub async fn compress_via_api(&mut self, rate: f64) -> Result<CompressionComparison> {
        Ok(self.compress_report(rate).await?.comparison)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            state: self.state,
            template: self.template.as_ref().map(|t| t.title.clone()),
            style: self.style.as_ref().map(|s| s.name.clone()),
            model: self.model.clone(),
            missing: self
                .render_report()
                .map(|report| report.missing)
                .unwrap_or_default(),
            metrics: self.metrics.clone(),
        }
    }
}

/// Snapshot of a session for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub state: SessionState,
    pub template: Option<String>,
    pub style: Option<String>,
    pub model: Option<String>,
    pub missing: Vec<String>,
    pub metrics: SavingsMetrics,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session ===")?;
        writeln!(f, "State: {:?}", self.state)?;
        writeln!(f, "Template: {}", self.template.as_deref().unwrap_or("None"))?;
        writeln!(f, "Style: {}", self.style.as_deref().unwrap_or("None"))?;
        writeln!(f, "Model: {}", self.model.as_deref().unwrap_or("None"))?;
        if !self.missing.is_empty() {
            writeln!(f, "Missing values: {}", self.missing.join(", "))?;
        }
        write!(f, "{}", self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CompressRequest, CompressResponse, CompressionTransport};
    use crate::optimization::WhitespaceCounter;
    use async_trait::async_trait;

    fn session() -> Session {
        Session::new(
            Resources::shared(),
            Arc::new(WhitespaceCounter),
            UnknownModelPolicy::Fail,
        )
        .unwrap()
    }

    struct EchoTransport;

    #[async_trait]
    impl CompressionTransport for EchoTransport {
        async fn send(&self, request: &CompressRequest) -> Result<CompressResponse> {
            let words = request.prompt.split_whitespace().count() as f64;
            Ok(CompressResponse {
                compressed_text: Some(request.prompt.clone()),
                original_tokens: Some(words),
                compressed_tokens: Some((words * (1.0 - request.rate())).floor()),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_optimize_requires_template() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Empty);
        assert!(matches!(s.optimize(), Err(PromptError::NoTemplateSelected)));
        assert!(matches!(
            s.set_value("topic", "AI"),
            Err(PromptError::NoTemplateSelected)
        ));
    }

    #[test]
    fn test_unfilled_template_keeps_markers() {
        let mut s = session();
        s.select_template("technical-1").unwrap();
        assert_eq!(s.state(), SessionState::TemplateSelected);

        let result = s.optimize().unwrap();
        assert!(result.optimized.contains("{language}"));
        assert!(result.optimized.contains("{code}"));
    }

    #[test]
    fn test_state_transitions() {
        let mut s = session();
        s.select_template("writing-1").unwrap();
        s.set_values([("topic", "AI")]).unwrap();
        assert_eq!(s.state(), SessionState::ValuesSet);

        s.set_values([("length", "short"), ("audience", "engineers")]).unwrap();
        assert_eq!(s.state(), SessionState::Ready);

        s.select_style("concise").unwrap();
        s.select_model("gpt-4");
        assert_eq!(s.state(), SessionState::Ready);

        s.select_template("business-1").unwrap();
        assert_eq!(s.state(), SessionState::TemplateSelected);
        assert!(s.values().is_empty());
    }

    #[test]
    fn test_unknown_ids() {
        let mut s = session();
        assert!(matches!(
            s.select_template("nope"),
            Err(PromptError::TemplateNotFound(_))
        ));
        assert!(matches!(s.select_style("nope"), Err(PromptError::StyleNotFound(_))));
        assert!(s.template().is_none());
    }

    #[test]
    fn test_optimize_pipeline() {
        let mut s = session();
        s.select_template("technical-1").unwrap();
        s.set_values([("language", "Rust"), ("code", "fn main() {}")]).unwrap();
        s.select_style("concise").unwrap();

        // no model: pass-through of the styled prompt
        let plain = s.optimize().unwrap();
        assert_eq!(plain.optimized, plain.original);
        assert!(plain.original.starts_with("Please explain what the following Rust code"));
        assert!(plain.original.ends_with("fn main() {}\n\nRespond concisely."));
        assert!(plain.guide_name.is_none());

        s.select_model("gpt-4");
        let tuned = s.optimize().unwrap();
        assert!(tuned.optimized.starts_with("explain what the following Rust code"));
        assert!(tuned.optimized.ends_with("fn main() {}\n\nRespond concisely."));
        assert!(tuned.saved_tokens > 0);
        assert_eq!(tuned.guide_name.as_deref(), Some("GPT"));
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let mut s = session();
        s.select_template("writing-2").unwrap();
        s.set_values([("sentences", "3"), ("article", "Rust 2.0 released.")]).unwrap();
        s.select_model("llama-3-8b");

        let first = s.optimize().unwrap();
        let second = s.optimize().unwrap();
        assert_eq!(first, second);
        assert_eq!(s.metrics().optimizations, 2);
    }

    #[test]
    fn test_unknown_model_policy_switch() {
        let mut s = session();
        s.select_template("education-1").unwrap();
        s.select_model("mistral-large");
        assert!(matches!(s.optimize(), Err(PromptError::UnknownModel(_))));

        s.set_unknown_model_policy(UnknownModelPolicy::PassThrough);
        let result = s.optimize().unwrap();
        assert_eq!(result.saved_tokens, 0);
    }

    #[test]
    fn test_expert_style_is_session_scoped() {
        let mut s = session();
        s.select_template("analysis-1").unwrap();
        s.set_value("data", "1, 2, 3").unwrap();
        s.create_expert_style("Finance", "Analyst", 90).unwrap();

        let prompt = s.get_prompt().unwrap();
        assert!(prompt.starts_with("You are an expert Analyst specializing in Finance."));
        assert!(s.resources().style(&s.style().unwrap().id).is_none());

        assert!(matches!(
            s.create_expert_style("Finance", "Analyst", 101),
            Err(PromptError::InvalidExpertiseLevel(101))
        ));
    }

    #[test]
    fn test_guide_info_requires_model() {
        let mut s = session();
        assert!(matches!(s.guide_info(), Err(PromptError::NoModelSelected)));
        s.select_model("claude-3-5-sonnet");
        assert_eq!(s.guide_info().unwrap().unwrap().source, "Anthropic");
    }

    #[test]
    fn test_summary() {
        let mut s = session();
        s.select_template("writing-1").unwrap();
        s.set_value("topic", "AI").unwrap();
        let summary = s.summary();
        assert_eq!(summary.template.as_deref(), Some("Blog Post"));
        assert_eq!(summary.missing, vec!["length".to_string(), "audience".to_string()]);
        assert!(summary.to_string().contains("Missing values: length, audience"));
    }

    #[tokio::test]
    async fn test_compress_flow() {
        let mut s = session();
        s.select_template("writing-1").unwrap();
        s.set_values([("topic", "AI"), ("length", "short"), ("audience", "kids")]).unwrap();

        assert!(matches!(
            s.compress_via_api(0.5).await,
            Err(PromptError::NoModelSelected)
        ));

        s.select_model("gpt-4o");
        assert!(matches!(
            s.compress_via_api(0.5).await,
            Err(PromptError::GatewayUnavailable(_))
        ));
        // rate is checked even without a gateway
        assert!(matches!(
            s.compress_via_api(2.0).await,
            Err(PromptError::InvalidRate(_))
        ));

        let mut s = s.with_gateway(CompressionGateway::new(EchoTransport));
        assert!(matches!(
            s.compress_via_api(1.01).await,
            Err(PromptError::InvalidRate(_))
        ));

        let comparison = s.compress_via_api(0.5).await.unwrap();
        // "Write a short blog post about AI for kids." is 9 words
        assert_eq!(comparison.tokens, 5);
        assert_eq!(s.metrics().compressions, 1);
        assert_eq!(s.metrics().compression_tokens_saved, 5);
    }
}
