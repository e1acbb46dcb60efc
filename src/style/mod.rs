//! Style presets applied on top of a rendered prompt

mod expert;

pub use expert::{create_expert_style, expertise_adjective, ExpertiseTier, EXPERTISE_TIERS};

use serde::{Deserialize, Serialize};

/// How a style frames the prompt it is applied to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleTransform {
    /// Text placed on its own line before the prompt
    Prefix { text: String },
    /// Directive appended after the prompt
    Suffix { text: String },
    /// Both sides
    Wrap { prefix: String, suffix: String },
    /// Role statement, separated from the prompt by a blank line
    Persona { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub id: String,
    pub name: String,
    pub description: String,
    pub transform: StyleTransform,
}

impl Style {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        transform: StyleTransform,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            transform,
        }
    }

    pub fn apply_to_prompt(&self, prompt: &str) -> String {
        match &self.transform {
            StyleTransform::Prefix { text } => format!("{}\n{}", text, prompt),
            StyleTransform::Suffix { text } => format!("{}\n\n{}", prompt, text),
            StyleTransform::Wrap { prefix, suffix } => {
                format!("{}\n{}\n\n{}", prefix, prompt, suffix)
            }
            StyleTransform::Persona { text } => format!("{}\n\n{}", text, prompt),
        }
    }
}

/// Frame `prompt` with `style`; `None` returns the prompt unchanged.
///
/// Applying the same style twice stacks its framing twice.
pub fn apply_style(prompt: &str, style: Option<&Style>) -> String {
    match style {
        Some(style) => style.apply_to_prompt(prompt),
        None => prompt.to_string(),
    }
}
