//! prompt_optimizer - Build, style and tighten LLM prompts
//!
//! This library assembles prompts from built-in templates and style presets,
//! rewrites them following vendor prompting guides, and can hand them to a
//! remote compression service.
//!
//! ## Key Features
//!
//! - **Templates**: `{placeholder}` substitution that never fails on missing values
//! - **Styles**: prefix/suffix/wrap/persona presets plus synthesized expert personas
//! - **Model Guides**: ordered regex rewrites per model family with token savings
//! - **Compression**: async HTTP gateway with timeout and bounded retries
//! - **Sessions**: explicit state machine sequencing all of the above

pub mod config;
pub mod error;
pub mod facade;
pub mod gateway;
pub mod metrics;
pub mod optimization;
pub mod resources;
pub mod session;
pub mod style;
pub mod template;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use error::{PromptError, Result};
pub use gateway::{
    CompressionComparison, CompressionGateway, CompressionReport, CompressionTransport,
    GatewayConfig, HttpTransport,
};
pub use metrics::SavingsMetrics;
pub use optimization::{
    CounterKind, GuideInfo, ModelGuideOptimizer, OptimizationResult, TokenCounter,
    UnknownModelPolicy,
};
pub use resources::{ResourceCategory, ResourceRecord, Resources};
pub use session::{Session, SessionState, SessionSummary};
pub use style::{apply_style, create_expert_style, Style, StyleTransform};
pub use template::{render, RenderReport, Template, TemplateCategory};
