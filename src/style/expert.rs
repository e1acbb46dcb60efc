//! Styles synthesized from an expert domain, role and expertise level

use super::{Style, StyleTransform};
use crate::error::{PromptError, Result};
use crate::template;
use std::collections::HashMap;

const PERSONA_TEMPLATE: &str = "You are {article} {adjective} {role} specializing in {domain}.";

/// One row of the expertise tier table; `max_level` is inclusive
#[derive(Debug, Clone, Copy)]
pub struct ExpertiseTier {
    pub max_level: i32,
    pub adjective: &'static str,
}

/// Ordered by `max_level`; the first tier whose bound covers the level wins
pub const EXPERTISE_TIERS: &[ExpertiseTier] = &[
    ExpertiseTier {
        max_level: 29,
        adjective: "novice",
    },
    ExpertiseTier {
        max_level: 70,
        adjective: "experienced",
    },
    ExpertiseTier {
        max_level: 100,
        adjective: "expert",
    },
];

fn check_level(level: i32) -> Result<i32> {
    if (0..=100).contains(&level) {
        Ok(level)
    } else {
        Err(PromptError::InvalidExpertiseLevel(level))
    }
}

pub fn expertise_adjective(level: i32) -> Result<&'static str> {
    let level = check_level(level)?;
    EXPERTISE_TIERS
        .iter()
        .find(|tier| level <= tier.max_level)
        .map(|tier| tier.adjective)
        .ok_or(PromptError::InvalidExpertiseLevel(level))
}

fn article_for(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn slug(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Build a persona style for `role` in `domain` at `expertise_level` (0-100).
///
/// The result is owned by the caller and never added to the shared style table.
pub fn create_expert_style(domain: &str, role: &str, expertise_level: i32) -> Result<Style> {
    let adjective = expertise_adjective(expertise_level)?;

    let values: HashMap<String, String> = [
        ("article", article_for(adjective)),
        ("adjective", adjective),
        ("role", role),
        ("domain", domain),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let persona = template::render(PERSONA_TEMPLATE, &values);

    Ok(Style::new(
        format!("expert-{}-{}-{}", slug(domain), slug(role), expertise_level),
        format!("{} {} ({})", domain, role, adjective),
        persona.clone(),
        StyleTransform::Persona { text: persona },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounds() {
        assert!(matches!(
            create_expert_style("Medicine", "Researcher", -1),
            Err(PromptError::InvalidExpertiseLevel(-1))
        ));
        assert!(matches!(
            create_expert_style("Medicine", "Researcher", 101),
            Err(PromptError::InvalidExpertiseLevel(101))
        ));
        assert!(create_expert_style("Medicine", "Researcher", 0).is_ok());
        assert!(create_expert_style("Medicine", "Researcher", 100).is_ok());
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(expertise_adjective(0).unwrap(), "novice");
        assert_eq!(expertise_adjective(29).unwrap(), "novice");
        assert_eq!(expertise_adjective(30).unwrap(), "experienced");
        assert_eq!(expertise_adjective(70).unwrap(), "experienced");
        assert_eq!(expertise_adjective(71).unwrap(), "expert");
        assert_eq!(expertise_adjective(100).unwrap(), "expert");
    }

    #[test]
    fn test_persona_text() {
        let style = create_expert_style("Machine Learning", "Data Scientist", 85).unwrap();
        assert_eq!(
            style.description,
            "You are an expert Data Scientist specializing in Machine Learning."
        );
        assert_eq!(style.id, "expert-machine-learning-data-scientist-85");

        let style = create_expert_style("Law", "Consultant", 50).unwrap();
        assert_eq!(
            style.apply_to_prompt("Review this contract."),
            "You are an experienced Consultant specializing in Law.\n\nReview this contract."
        );
    }
}
