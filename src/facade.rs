//! Convenience API over one process-wide default session
//!
//! The default session is built on first use and kept for the life of the
//! process, so selections made through [`with_default_session`] carry over
//! between calls. Rendering and listing only read the shared tables.

use crate::error::{PromptError, Result};
use crate::gateway::{CompressionComparison, CompressionGateway, GatewayConfig};
use crate::optimization::OptimizationResult;
use crate::resources::{ResourceRecord, Resources};
use crate::session::Session;
use crate::style;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// A session built on first use
pub struct DefaultSession {
    session: Option<Session>,
}

impl DefaultSession {
    pub const fn new() -> Self {
        Self { session: None }
    }

    pub fn is_built(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&mut self) -> Result<&mut Session> {
        let session = match self.session.take() {
            Some(session) => session,
            None => Session::builtin()?,
        };
        Ok(self.session.insert(session))
    }
}

impl Default for DefaultSession {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_SESSION: Mutex<DefaultSession> = Mutex::new(DefaultSession::new());

fn default_session() -> MutexGuard<'static, DefaultSession> {
    DEFAULT_SESSION
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run `f` against the process-wide session; its state persists across calls
pub fn with_default_session<T>(f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
    let mut guard = default_session();
    f(guard.session()?)
}

/// Records of one category by name ("templates", "expert-domains", ...)
pub fn list(category: &str) -> Result<Vec<ResourceRecord>> {
    Resources::shared().load_named(category)
}

/// Render a template, optionally styled; no session or token counter involved
pub fn render(
    template_id: &str,
    values: &HashMap<String, String>,
    style_id: Option<&str>,
) -> Result<String> {
    let resources = Resources::shared();
    let template = resources
        .template(template_id)
        .ok_or_else(|| PromptError::TemplateNotFound(template_id.to_string()))?;
    let style = style_id
        .map(|id| {
            resources
                .style(id)
                .ok_or_else(|| PromptError::StyleNotFound(id.to_string()))
        })
        .transpose()?;

    Ok(style::apply_style(&template.render(values), style))
}

/// Select, fill, style and optimize on the default session in one call
pub fn optimize(
    template_id: &str,
    values: &HashMap<String, String>,
    style_id: Option<&str>,
    model_id: Option<&str>,
) -> Result<OptimizationResult> {
    with_default_session(|session| {
        session.select_template(template_id)?;
        session.set_values(values.clone())?;
        match style_id {
            Some(id) => {
                session.select_style(id)?;
            }
            None => session.clear_style(),
        }
        match model_id {
            Some(id) => session.select_model(id),
            None => session.clear_model(),
        }
        session.optimize()
    })
}

pub async fn compress(
    prompt: &str,
    model_id: &str,
    rate: f64,
    config: GatewayConfig,
) -> Result<CompressionComparison> {
    CompressionGateway::http(config)?
        .compress_via_api(prompt, model_id, rate)
        .await
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

    #[test]
    fn test_list() {
        assert_eq!(list("templates").unwrap().len(), 10);
        assert_eq!(list("expert-roles").unwrap().len(), 8);
        assert!(matches!(list("widgets"), Err(PromptError::UnknownCategory(_))));
    }

    #[test]
    fn test_render() {
        let text = render(
            "business-1",
            &values(&[("recipient", "the team"), ("subject", "Q3 plans")]),
            None,
        )
        .unwrap();
        assert_eq!(
            text,
            "Write a professional email to the team about Q3 plans. Keep the tone {tone}."
        );

        let styled = render("business-1", &HashMap::new(), Some("concise")).unwrap();
        assert!(styled.ends_with("\n\nRespond concisely."));

        assert!(matches!(
            render("business-9", &HashMap::new(), None),
            Err(PromptError::TemplateNotFound(_))
        ));
        assert!(matches!(
            render("business-1", &HashMap::new(), Some("shouty")),
            Err(PromptError::StyleNotFound(_))
        ));
    }

    #[test]
    fn test_default_session_is_lazy() {
        let mut lazy = DefaultSession::new();
        assert!(!lazy.is_built());
        lazy.session().unwrap().select_template("creative-1").unwrap();
        assert!(lazy.is_built());
        assert_eq!(lazy.session().unwrap().template().unwrap().id, "creative-1");
    }

    // Everything touching the process-wide session stays in this one test
    #[test]
    fn test_default_session_flow() {
        with_default_session(|s| {
            s.select_template("education-1")?;
            s.set_value("concept", "recursion")
        })
        .unwrap();
        with_default_session(|s| s.set_value("level", "high school")).unwrap();
        with_default_session(|s| {
            s.select_model("gpt-4o");
            Ok(())
        })
        .unwrap();

        let result = with_default_session(|s| s.optimize()).unwrap();
        assert_eq!(
            result.optimized,
            "explain recursion to a high school student, using one concrete example?"
        );
        assert!(result.saved_tokens > 0);

        let oneshot = optimize(
            "education-1",
            &values(&[("concept", "recursion"), ("level", "high school")]),
            None,
            Some("gpt-4o"),
        )
        .unwrap();
        assert_eq!(oneshot.optimized, result.optimized);
        assert_eq!(
            with_default_session(|s| Ok(s.metrics().optimizations)).unwrap(),
            2
        );

        let plain = optimize("education-1", &HashMap::new(), None, None).unwrap();
        assert_eq!(plain.optimized, plain.original);

        assert!(matches!(
            optimize("education-1", &HashMap::new(), Some("shouty"), None),
            Err(PromptError::StyleNotFound(_))
        ));
    }

    #[test]
    fn test_compress_rejects_rate_before_sending() {
        let config = GatewayConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let result = tokio_test::block_on(compress("prompt", "gpt-4", 2.0, config));
        assert!(matches!(result, Err(PromptError::InvalidRate(_))));
    }
}
