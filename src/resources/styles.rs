//! Built-in style presets and the expert domain/role vocabularies

use crate::style::{Style, StyleTransform};

pub(super) fn builtin_styles() -> Vec<Style> {
    vec![
        Style::new(
            "concise",
            "Concise",
            "Ask for short, direct answers",
            StyleTransform::Suffix {
                text: "Respond concisely.".to_string(),
            },
        ),
        Style::new(
            "step-by-step",
            "Step by Step",
            "Ask the model to reason before answering",
            StyleTransform::Suffix {
                text: "Think step by step before answering.".to_string(),
            },
        ),
        Style::new(
            "bullet-points",
            "Bullet Points",
            "Request a bulleted answer",
            StyleTransform::Suffix {
                text: "Format the answer as bullet points.".to_string(),
            },
        ),
        Style::new(
            "eli5",
            "Explain Like I'm Five",
            "Plain language for a non-technical reader",
            StyleTransform::Prefix {
                text: "Explain as if to a five-year-old, avoiding jargon.".to_string(),
            },
        ),
        Style::new(
            "formal",
            "Formal",
            "Formal register, no contractions",
            StyleTransform::Wrap {
                prefix: "Use a formal, professional tone.".to_string(),
                suffix: "Avoid contractions and colloquialisms.".to_string(),
            },
        ),
        Style::new(
            "teacher",
            "Patient Teacher",
            "Answer as a teacher addressing a student",
            StyleTransform::Persona {
                text: "You are a patient teacher who checks understanding as you go.".to_string(),
            },
        ),
    ]
}

pub(super) const EXPERT_DOMAINS: &[&str] = &[
    "Software Engineering",
    "Machine Learning",
    "Finance",
    "Medicine",
    "Law",
    "Marketing",
    "Education",
    "Physics",
];

pub(super) const EXPERT_ROLES: &[&str] = &[
    "Consultant",
    "Researcher",
    "Teacher",
    "Engineer",
    "Analyst",
    "Writer",
    "Data Scientist",
    "Architect",
];
