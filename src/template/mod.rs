//! Prompt templates and placeholder substitution
//!
//! Placeholders are written `{name}`. Rendering is lenient: a placeholder with
//! no supplied value stays in the output verbatim, so partially filled
//! templates can still be previewed and optimized.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Grouping used when listing templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Writing,
    Technical,
    Business,
    Education,
    Creative,
    Analysis,
}

/// A parameterized prompt body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub title: String,
    pub body: String,
    pub category: TemplateCategory,
}

impl Template {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        category: TemplateCategory,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            category,
        }
    }

    /// Distinct placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<String> {
        unresolved_placeholders(&self.body)
    }

    pub fn render(&self, values: &HashMap<String, String>) -> String {
        render(&self.body, values)
    }
}

/// Outcome of rendering with bookkeeping about which keys were used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub output: String,
    /// Placeholders that had no value and were left as markers
    pub missing: Vec<String>,
    /// Supplied keys the template never references
    pub unused: Vec<String>,
}

impl RenderReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Substitute `{name}` placeholders in `body` from `values`
pub fn render(body: &str, values: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(body, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Render and report missing and unused keys (both sorted for stable output)
pub fn render_report(template: &Template, values: &HashMap<String, String>) -> RenderReport {
    let placeholders = template.placeholders();

    let missing = placeholders
        .iter()
        .filter(|name| !values.contains_key(*name))
        .cloned()
        .collect();

    let referenced: BTreeSet<&str> = placeholders.iter().map(String::as_str).collect();
    let mut unused: Vec<String> = values
        .keys()
        .filter(|key| !referenced.contains(key.as_str()))
        .cloned()
        .collect();
    unused.sort();

    RenderReport {
        output: template.render(values),
        missing,
        unused,
    }
}

/// Placeholder markers still present in already-rendered text
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    placeholder_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps[1].to_string();
            seen.insert(name.clone()).then_some(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn blog_template() -> Template {
        Template::new(
            "blog",
            "Blog post",
            "Write a {length} post about {topic}",
            TemplateCategory::Writing,
        )
    }

    #[test]
    fn test_missing_placeholder_stays_as_marker() {
        let out = blog_template().render(&values(&[("topic", "AI")]));
        assert_eq!(out, "Write a {length} post about AI");
        assert_eq!(unresolved_placeholders(&out), vec!["length".to_string()]);
    }

    #[test]
    fn test_render_is_deterministic() {
        let t = blog_template();
        let v = values(&[("topic", "AI"), ("length", "short")]);
        assert_eq!(t.render(&v), t.render(&v));
        assert_eq!(t.render(&v), "Write a short post about AI");
    }

    #[test]
    fn test_extra_keys_ignored_and_reported() {
        let report = render_report(
            &blog_template(),
            &values(&[("topic", "Rust"), ("tone", "dry"), ("audience", "devs")]),
        );
        assert_eq!(report.output, "Write a {length} post about Rust");
        assert_eq!(report.missing, vec!["length".to_string()]);
        assert_eq!(report.unused, vec!["audience".to_string(), "tone".to_string()]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_placeholders_deduplicated_in_order() {
        let t = Template::new(
            "t",
            "T",
            "{b} then {a} then {b} again, {not a placeholder}",
            TemplateCategory::Analysis,
        );
        assert_eq!(t.placeholders(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(t.placeholders(), unresolved_placeholders(&t.body));
    }

    #[test]
    fn test_repeated_placeholder_substituted_everywhere() {
        let out = render("{x} and {x}", &values(&[("x", "1")]));
        assert_eq!(out, "1 and 1");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        // A value that looks like a placeholder must not be expanded again
        let out = render("{a}", &values(&[("a", "{b}"), ("b", "oops")]));
        assert_eq!(out, "{b}");
    }
}
