//! Per-model prompting guides: tips plus the rewrite rules derived from them

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideTip {
    pub title: String,
    pub description: String,
    pub before: String,
    pub after: String,
}

/// Regex rewrite, applied with `replace_all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelGuide {
    /// Guide family key ("gpt", "claude", "llama")
    pub key: String,
    pub guide_name: String,
    pub guide_source: String,
    pub url: String,
    pub tips: Vec<GuideTip>,
    /// Applied in declared order
    pub rules: Vec<RewriteRule>,
}

/// Selectable target model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

/// Model id -> guide key. Also used for prefix matching, in this order.
pub(super) const MODEL_ALIASES: &[(&str, &str)] = &[
    ("llama-2", "llama"),
    ("llama-3", "llama"),
    ("llama-2-7b", "llama"),
    ("llama-2-13b", "llama"),
    ("llama-2-70b", "llama"),
    ("llama-3-8b", "llama"),
    ("llama-3-70b", "llama"),
    ("claude-3-opus", "claude"),
    ("claude-3-sonnet", "claude"),
    ("claude-3-haiku", "claude"),
    ("claude-3-5-sonnet", "claude"),
    ("claude-2", "claude"),
    ("gpt-3.5-turbo", "gpt"),
    ("gpt-4", "gpt"),
    ("gpt-4o", "gpt"),
    ("gpt-4-turbo", "gpt"),
    ("gpt-3.5", "gpt"),
    ("openai", "gpt"),
];

fn tip(title: &str, description: &str, before: &str, after: &str) -> GuideTip {
    GuideTip {
        title: title.to_string(),
        description: description.to_string(),
        before: before.to_string(),
        after: after.to_string(),
    }
}

fn rules(pairs: &[(&str, &str)]) -> Vec<RewriteRule> {
    pairs
        .iter()
        .map(|(pattern, replacement)| RewriteRule {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        })
        .collect()
}

pub(super) fn builtin_models() -> Vec<ModelInfo> {
    [
        ("gpt-4", "GPT-4", "OpenAI"),
        ("gpt-4o", "GPT-4o", "OpenAI"),
        ("gpt-3.5-turbo", "GPT-3.5 Turbo", "OpenAI"),
        ("claude-3-opus", "Claude 3 Opus", "Anthropic"),
        ("claude-3-5-sonnet", "Claude 3.5 Sonnet", "Anthropic"),
        ("claude-3-haiku", "Claude 3 Haiku", "Anthropic"),
        ("llama-3-70b", "Llama 3 70B", "Meta AI"),
        ("llama-3-8b", "Llama 3 8B", "Meta AI"),
    ]
    .into_iter()
    .map(|(id, name, provider)| ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        provider: provider.to_string(),
    })
    .collect()
}

pub(super) fn builtin_guides() -> Vec<ModelGuide> {
    vec![
        ModelGuide {
            key: "gpt".to_string(),
            guide_name: "GPT".to_string(),
            guide_source: "OpenAI".to_string(),
            url: "https://platform.openai.com/docs/guides/prompt-engineering".to_string(),
            tips: vec![
                tip(
                    "Write Clear and Specific Instructions",
                    "Use clear and specific instructions, and be explicit about what you want.",
                    "Tell me about France.",
                    "Provide a brief overview of France, including its geography, population, government, and two major historical events.",
                ),
                tip(
                    "Use Delimiters",
                    "Use delimiters to clearly indicate distinct parts of the input.",
                    "Summarize the text: France is a country in Western Europe...",
                    "Summarize the text delimited by triple backticks:\n```France is a country in Western Europe...```",
                ),
                tip(
                    "Use Few-Shot Prompting",
                    "Provide examples of successful executions of the task you want performed.",
                    "Classify this review: 'The food was amazing!'",
                    "Classify the sentiment of the following reviews as positive, negative, or neutral.\n\nReview: 'The service was terrible.'\nSentiment: negative\n\nReview: 'The food was amazing!'\nSentiment:",
                ),
                tip(
                    "Specify the Steps",
                    "Break down complex tasks into a sequence of steps.",
                    "Write a blog post about renewable energy.",
                    "Write a blog post about renewable energy by following these steps:\n1. Start with an attention-grabbing introduction\n2. Explain what renewable energy is\n3. Discuss 3 common types of renewable energy\n4. Provide statistics on renewable energy adoption\n5. Conclude with future prospects",
                ),
                tip(
                    "Ask the Model to Evaluate Its Response",
                    "Ask the model to check whether its response meets the requirements.",
                    "Solve this math problem: If x² + 5x + 6 = 0, what is x?",
                    "Solve this math problem: If x² + 5x + 6 = 0, what is x? After providing your solution, verify that your answer is correct by substituting it back into the original equation.",
                ),
            ],
            rules: rules(&[
                (r"(?i)\bcan you\s+", ""),
                (r"(?i)\bplease,?\s+", ""),
                (r"(?i)\bI'd like you to\s+", ""),
                (r"(?i)\bI would like you to\s+", ""),
                (r"(?i)\bcould you\s+", ""),
                (r"(?i)\bwould you mind\s+", ""),
            ]),
        },
        ModelGuide {
            key: "claude".to_string(),
            guide_name: "Claude".to_string(),
            guide_source: "Anthropic".to_string(),
            url: "https://docs.anthropic.com/en/docs/build-with-claude/prompt-engineering/overview"
                .to_string(),
            tips: vec![
                tip(
                    "Be Clear and Direct",
                    "Be clear and specific about what you want Claude to do.",
                    "I'm wondering if you might be able to tell me a bit about AI ethics?",
                    "Explain the three most important principles of AI ethics.",
                ),
                tip(
                    "Use Examples (Multishot Prompting)",
                    "Include 3-5 diverse, relevant examples to show Claude exactly what you want.",
                    "Analyze this customer feedback and categorize the issues.",
                    "Analyze this customer feedback and categorize the issues. Here's an example:\n<example>\nInput: The new dashboard is a mess! It takes forever to load, and I can't find the export button. Fix this ASAP!\nCategory: UI/UX, Performance\nSentiment: Negative\nPriority: High\n</example>",
                ),
                tip(
                    "Let Claude Think (Chain of Thought)",
                    "For complex problems, ask Claude to work through its reasoning step by step.",
                    "Is 17077 a prime number?",
                    "Think through whether 17077 is a prime number step by step.",
                ),
                tip(
                    "Use XML Tags",
                    "Structure your prompt with XML tags to clearly separate different components.",
                    "Summarize the following text: Climate change is a global challenge...",
                    "<context>Climate change is a global challenge...</context>\n<task>Summarize the above text in 3 bullet points.</task>",
                ),
                tip(
                    "Give Claude a Role (System Prompts)",
                    "Assign Claude a specific role to frame its perspective and expertise.",
                    "Explain how to create a REST API.",
                    "You are an experienced software engineering mentor. Explain how to create a REST API to a junior developer.",
                ),
            ],
            rules: rules(&[
                (r"I'm wondering if you might be able to\s+", ""),
                (r"I was hoping you could\s+", ""),
                (r"Could you possibly\s+", ""),
                (r"If it's not too much trouble,\s+", ""),
                (r"When you get a chance,\s+", ""),
                (r"(?i)\bplease\s+", ""),
            ]),
        },
        ModelGuide {
            key: "llama".to_string(),
            guide_name: "Llama".to_string(),
            guide_source: "Meta AI".to_string(),
            url: "https://www.llama.com/docs/how-to-guides/prompting/".to_string(),
            tips: vec![
                tip(
                    "Be Clear and Concise",
                    "Use clear, concise language in your prompts. Avoid jargon and technical terms that might confuse the model.",
                    "Could you please kindly help me create a detailed analysis of the quarterly financial report that includes all of the important metrics and insights for the executive team, if you don't mind?",
                    "Analyze quarterly financial report. Include key metrics and insights for executives.",
                ),
                tip(
                    "Use Explicit Instructions",
                    "Detailed, explicit instructions produce better results than open-ended prompts.",
                    "Tell me about quantum computing.",
                    "Explain quantum computing principles to me like I'm a computer science undergraduate. Focus on qubits, superposition, and quantum gates.",
                ),
                tip(
                    "Use Stylistic Instructions",
                    "You can control the style of response with explicit stylistic instructions.",
                    "Write about climate change.",
                    "Explain this to me like a topic on a children's educational network show teaching elementary students.",
                ),
                tip(
                    "Apply Formatting Instructions",
                    "Specify the format you want the answer in.",
                    "List the top factors affecting climate change.",
                    "List the top factors affecting climate change. Use bullet points.",
                ),
                tip(
                    "Apply Chain of Thought",
                    "For complex reasoning, ask the model to think step by step.",
                    "What is 25 × 16 + 12 × 4?",
                    "Calculate 25 × 16 + 12 × 4 step by step, showing your reasoning for each step.",
                ),
            ],
            rules: rules(&[
                (r"Could you please\s+", ""),
                (r"I would like you to\s+", ""),
                (r"If you don't mind,\s+", ""),
                (r",?\s*if you don't mind", ""),
                (r"It would be great if you could\s+", ""),
                (r"kindly\s+", ""),
                (r"Please\s+", ""),
                (r"\s+if possible", ""),
                (r"Can you\s+", ""),
                (r"Would you be able to\s+", ""),
            ]),
        },
    ]
}

/// Fallback rules used by `UnknownModelPolicy::Generic`
pub(crate) fn generic_rules() -> Vec<RewriteRule> {
    rules(&[
        (r"(?i)\bplease,?\s+", ""),
        (r"Could you\s+", ""),
        (r"I would like you to\s+", ""),
    ])
}
