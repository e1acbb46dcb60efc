//! Error taxonomy shared by the rendering and optimization engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Unknown resource category: {0} (expected one of: templates, styles, models, expert_domains, expert_roles, model_guides)")]
    UnknownCategory(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Style not found: {0}")]
    StyleNotFound(String),

    #[error("No template selected. Call select_template() first.")]
    NoTemplateSelected,

    #[error("No model selected. Call select_model() first.")]
    NoModelSelected,

    #[error("Invalid expertise level {0}: must be between 0 and 100")]
    InvalidExpertiseLevel(i32),

    #[error("Invalid compression rate {0}: must be between 0.0 and 1.0")]
    InvalidRate(f64),

    #[error("No prompting guide for model: {0}")]
    UnknownModel(String),

    #[error("Invalid rewrite pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Compression gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Compression gateway rejected request ({status}): {body}")]
    GatewayRejected { status: u16, body: String },

    #[error("Malformed compression response: {0}")]
    GatewayResponse(String),
}

impl PromptError {
    /// Process exit code for the CLI; each kind gets its own code
    pub fn exit_code(&self) -> i32 {
        match self {
            PromptError::UnknownCategory(_) => 2,
            PromptError::TemplateNotFound(_) => 3,
            PromptError::StyleNotFound(_) => 4,
            PromptError::NoTemplateSelected => 5,
            PromptError::NoModelSelected => 6,
            PromptError::InvalidExpertiseLevel(_) => 7,
            PromptError::InvalidRate(_) => 8,
            PromptError::UnknownModel(_) => 9,
            PromptError::InvalidPattern { .. } => 10,
            PromptError::GatewayUnavailable(_) => 11,
            PromptError::GatewayRejected { .. } => 12,
            PromptError::GatewayResponse(_) => 13,
        }
    }
}

pub type Result<T> = std::result::Result<T, PromptError>;
