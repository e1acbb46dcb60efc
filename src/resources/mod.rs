//! Built-in reference data: templates, styles, expert vocabularies, models and
//! prompting guides.
//!
//! Everything here is built once per process and never mutated afterwards, so a
//! single [`Resources`] can be shared by any number of sessions through an `Arc`.

mod guides;
mod styles;
mod templates;

pub use guides::{GuideTip, ModelGuide, ModelInfo, RewriteRule};
pub(crate) use guides::generic_rules;

use crate::error::PromptError;
use crate::style::Style;
use crate::template::Template;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Resource collections that can be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    Templates,
    Styles,
    ExpertDomains,
    ExpertRoles,
    Models,
    ModelGuides,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 6] = [
        ResourceCategory::Templates,
        ResourceCategory::Styles,
        ResourceCategory::ExpertDomains,
        ResourceCategory::ExpertRoles,
        ResourceCategory::Models,
        ResourceCategory::ModelGuides,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Templates => "templates",
            ResourceCategory::Styles => "styles",
            ResourceCategory::ExpertDomains => "expert_domains",
            ResourceCategory::ExpertRoles => "expert_roles",
            ResourceCategory::Models => "models",
            ResourceCategory::ModelGuides => "model_guides",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ResourceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| PromptError::UnknownCategory(s.to_string()))
    }
}

/// Expert domain or role label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpertLabel {
    pub id: String,
    pub label: String,
}

impl ExpertLabel {
    fn from_label(label: &str) -> Self {
        Self {
            id: label.to_lowercase().replace(' ', "-"),
            label: label.to_string(),
        }
    }
}

/// One listed record; the variant follows the requested category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceRecord {
    Template(Template),
    Style(Style),
    ExpertDomain(ExpertLabel),
    ExpertRole(ExpertLabel),
    Model(ModelInfo),
    ModelGuide(ModelGuide),
}

impl ResourceRecord {
    pub fn id(&self) -> &str {
        match self {
            ResourceRecord::Template(t) => &t.id,
            ResourceRecord::Style(s) => &s.id,
            ResourceRecord::ExpertDomain(l) | ResourceRecord::ExpertRole(l) => &l.id,
            ResourceRecord::Model(m) => &m.id,
            ResourceRecord::ModelGuide(g) => &g.key,
        }
    }

    /// Short human-readable line for listings
    pub fn summary(&self) -> String {
        match self {
            ResourceRecord::Template(t) => format!("{}: {}", t.title, t.body),
            ResourceRecord::Style(s) => format!("{} - {}", s.name, s.description),
            ResourceRecord::ExpertDomain(l) | ResourceRecord::ExpertRole(l) => l.label.clone(),
            ResourceRecord::Model(m) => format!("{} ({})", m.name, m.provider),
            ResourceRecord::ModelGuide(g) => {
                format!("{} guide from {} ({} tips)", g.guide_name, g.guide_source, g.tips.len())
            }
        }
    }
}

/// Read-only reference tables
#[derive(Debug)]
pub struct Resources {
    templates: Vec<Template>,
    styles: Vec<Style>,
    expert_domains: Vec<ExpertLabel>,
    expert_roles: Vec<ExpertLabel>,
    models: Vec<ModelInfo>,
    guides: Vec<ModelGuide>,
}

impl Resources {
    /// Construct the built-in tables
    pub fn builtin() -> Self {
        Self {
            templates: templates::builtin_templates(),
            styles: styles::builtin_styles(),
            expert_domains: styles::EXPERT_DOMAINS
                .iter()
                .map(|d| ExpertLabel::from_label(d))
                .collect(),
            expert_roles: styles::EXPERT_ROLES
                .iter()
                .map(|r| ExpertLabel::from_label(r))
                .collect(),
            models: guides::builtin_models(),
            guides: guides::builtin_guides(),
        }
    }

    /// Process-wide instance, built on first use
    pub fn shared() -> Arc<Resources> {
        static SHARED: OnceLock<Arc<Resources>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Resources::builtin())).clone()
    }

    /// List a category as owned records
    pub fn load(&self, category: ResourceCategory) -> Vec<ResourceRecord> {
        match category {
            ResourceCategory::Templates => self
                .templates
                .iter()
                .cloned()
                .map(ResourceRecord::Template)
                .collect(),
            ResourceCategory::Styles => self.styles.iter().cloned().map(ResourceRecord::Style).collect(),
            ResourceCategory::ExpertDomains => self
                .expert_domains
                .iter()
                .cloned()
                .map(ResourceRecord::ExpertDomain)
                .collect(),
            ResourceCategory::ExpertRoles => self
                .expert_roles
                .iter()
                .cloned()
                .map(ResourceRecord::ExpertRole)
                .collect(),
            ResourceCategory::Models => self.models.iter().cloned().map(ResourceRecord::Model).collect(),
            ResourceCategory::ModelGuides => self
                .guides
                .iter()
                .cloned()
                .map(ResourceRecord::ModelGuide)
                .collect(),
        }
    }

    /// String-keyed variant of [`Resources::load`]
    pub fn load_named(&self, category: &str) -> Result<Vec<ResourceRecord>, PromptError> {
        Ok(self.load(category.parse()?))
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn expert_domains(&self) -> &[ExpertLabel] {
        &self.expert_domains
    }

    pub fn expert_roles(&self) -> &[ExpertLabel] {
        &self.expert_roles
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn guides(&self) -> &[ModelGuide] {
        &self.guides
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn style(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id)
    }

    fn guide_by_key(&self, key: &str) -> Option<&ModelGuide> {
        self.guides.iter().find(|g| g.key == key)
    }

    /// Resolve a model id to its guide: guide key, exact alias, then longest alias prefix
    pub fn guide_for_model(&self, model_id: &str) -> Option<&ModelGuide> {
        let model_key = model_id.trim().to_lowercase();

        if let Some(guide) = self.guide_by_key(&model_key) {
            return Some(guide);
        }

        if let Some((_, key)) = guides::MODEL_ALIASES.iter().find(|(alias, _)| *alias == model_key) {
            return self.guide_by_key(key);
        }

        guides::MODEL_ALIASES
            .iter()
            .filter(|(alias, _)| model_key.starts_with(alias))
            .max_by_key(|(alias, _)| alias.len())
            .and_then(|(_, key)| self.guide_by_key(key))
    }
}
