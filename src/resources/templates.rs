//! Built-in template table

use crate::template::{Template, TemplateCategory};

pub(super) fn builtin_templates() -> Vec<Template> {
    use TemplateCategory::*;

    vec![
        Template::new(
            "writing-1",
            "Blog Post",
            "Write a {length} blog post about {topic} for {audience}.",
            Writing,
        ),
        Template::new(
            "writing-2",
            "Article Summary",
            "Could you please summarize the following article in {sentences} sentences?\n\n{article}",
            Writing,
        ),
        Template::new(
            "technical-1",
            "Code Explanation",
            "Please explain what the following {language} code does and point out any bugs:\n\n{code}",
            Technical,
        ),
        Template::new(
            "technical-2",
            "Code Review",
            "I would like you to review this {language} function for readability, performance and correctness.\n\n{code}",
            Technical,
        ),
        Template::new(
            "technical-3",
            "System Design",
            "Design a system for {use_case} that can handle {scale}. Describe the main components and trade-offs.",
            Technical,
        ),
        Template::new(
            "business-1",
            "Professional Email",
            "Write a professional email to {recipient} about {subject}. Keep the tone {tone}.",
            Business,
        ),
        Template::new(
            "business-2",
            "Meeting Agenda",
            "Create an agenda for a {duration} meeting about {topic} with {participants}.",
            Business,
        ),
        Template::new(
            "education-1",
            "Concept Explainer",
            "Can you explain {concept} to a {level} student, using one concrete example?",
            Education,
        ),
        Template::new(
            "creative-1",
            "Short Story",
            "If it's not too much trouble, write a short story about {character} who {conflict}.",
            Creative,
        ),
        Template::new(
            "analysis-1",
            "Data Analysis",
            "I would like you to analyze this data and tell me what patterns you see:\n\n{data}",
            Analysis,
        ),
    ]
}
