//! prompt-optimizer CLI - Build, style and tighten LLM prompts

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use prompt_optimizer::{
    config::{Config, ENV_API_KEY, ENV_BASE_URL, ENV_MODEL},
    optimization::UnknownModelPolicy,
    resources::{ResourceCategory, Resources},
    session::Session,
    PromptError,
};
use std::collections::HashMap;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "prompt-optimizer")]
#[command(about = "Build prompts from templates and tighten them for a target model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in resources (templates, styles, models, expert_domains, expert_roles, model_guides)
    List {
        category: String,
    },

    /// Render a template with values
    Render {
        template_id: String,

        /// Values as a JSON object, e.g. '{"topic": "AI"}'
        #[arg(short, long)]
        values: Option<String>,
    },

    /// Render, style and optimize a prompt for a model
    Optimize {
        template_id: String,

        /// Values as a JSON object
        #[arg(short, long)]
        values: Option<String>,

        /// Style preset id
        #[arg(short, long, conflicts_with = "expert")]
        style: Option<String>,

        /// Target model id
        #[arg(short, long)]
        model: Option<String>,

        /// Expert persona as domain,role,level
        #[arg(long)]
        expert: Option<String>,

        /// Behavior for models without a guide (fail, pass-through, generic)
        #[arg(long)]
        on_unknown_model: Option<UnknownModelPolicy>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a rendered prompt to the compression service
    Compress {
        template_id: String,

        /// Values as a JSON object
        #[arg(short, long)]
        values: Option<String>,

        /// Target model id
        #[arg(short, long)]
        model: String,

        /// Compression rate between 0.0 and 1.0 (default from config)
        #[arg(short, long)]
        rate: Option<f64>,
    },

    /// Show the prompting guide used for a model
    Guide {
        model_id: String,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., gateway.api_key, session.default_model)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<PromptError>()
                .map(PromptError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::List { category } => run_list(&category),
        Commands::Render {
            template_id,
            values,
        } => run_render(&template_id, values.as_deref()),
        Commands::Optimize {
            template_id,
            values,
            style,
            model,
            expert,
            on_unknown_model,
            json,
        } => run_optimize(
            &template_id,
            values.as_deref(),
            style.as_deref(),
            model.as_deref(),
            expert.as_deref(),
            on_unknown_model,
            json,
        ),
        Commands::Compress {
            template_id,
            values,
            model,
            rate,
        } => run_compress(&template_id, values.as_deref(), &model, rate).await,
        Commands::Guide { model_id } => run_guide(&model_id),
        Commands::Config(cmd) => run_config_command(cmd),
    }
}

fn load_session() -> Result<(Config, Session)> {
    let config = Config::load().context("loading configuration")?;
    let session = Session::from_config(&config)?;
    Ok((config, session))
}

/// Parse `--values`; non-string JSON values are used in their JSON form
fn parse_values(raw: Option<&str>) -> Result<HashMap<String, String>> {
    let Some(raw) = raw else {
        return Ok(HashMap::new());
    };

    let parsed: HashMap<String, serde_json::Value> =
        serde_json::from_str(raw).context("--values must be a JSON object")?;

    Ok(parsed
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

fn parse_expert(raw: &str) -> Result<(String, String, i32)> {
    let parts: Vec<&str> = raw.splitn(3, ',').map(str::trim).collect();
    if parts.len() != 3 {
        bail!("--expert must be domain,role,level (got {:?})", raw);
    }
    let level = parts[2]
        .parse()
        .with_context(|| format!("expertise level {:?} is not a number", parts[2]))?;
    Ok((parts[0].to_string(), parts[1].to_string(), level))
}

fn prepare(session: &mut Session, template_id: &str, values: Option<&str>) -> Result<()> {
    session.select_template(template_id)?;
    session.set_values(parse_values(values)?)?;

    let report = session.render_report()?;
    if !report.missing.is_empty() {
        warn!("Unresolved placeholders: {}", report.missing.join(", "));
    }
    if !report.unused.is_empty() {
        warn!("Unused values: {}", report.unused.join(", "));
    }
    Ok(())
}

fn run_list(category: &str) -> Result<()> {
    let category: ResourceCategory = category.parse()?;
    let records = Resources::shared().load(category);

    println!("=== {} ({}) ===", category, records.len());
    for record in records {
        println!("{:<20} {}", record.id(), record.summary());
    }

    Ok(())
}

fn run_render(template_id: &str, values: Option<&str>) -> Result<()> {
    let (_, mut session) = load_session()?;
    prepare(&mut session, template_id, values)?;
    println!("{}", session.get_prompt()?);
    Ok(())
}

fn run_optimize(
    template_id: &str,
    values: Option<&str>,
    style: Option<&str>,
    model: Option<&str>,
    expert: Option<&str>,
    on_unknown_model: Option<UnknownModelPolicy>,
    json: bool,
) -> Result<()> {
    let (_, mut session) = load_session()?;
    prepare(&mut session, template_id, values)?;

    if let Some(style_id) = style {
        session.select_style(style_id)?;
    }
    if let Some(raw) = expert {
        let (domain, role, level) = parse_expert(raw)?;
        session.create_expert_style(&domain, &role, level)?;
    }
    if let Some(model_id) = model {
        session.select_model(model_id);
    }
    if let Some(policy) = on_unknown_model {
        session.set_unknown_model_policy(policy);
    }

    let result = session.optimize()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result);
    }

    Ok(())
}

async fn run_compress(
    template_id: &str,
    values: Option<&str>,
    model: &str,
    rate: Option<f64>,
) -> Result<()> {
    let (config, mut session) = load_session()?;
    if config.api_key().is_none() {
        warn!("No API key configured; set {} or gateway.api_key", ENV_API_KEY);
    }

    prepare(&mut session, template_id, values)?;
    session.select_model(model);
    let rate = rate.unwrap_or(config.gateway.default_rate);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("  {spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Compressing for {} at rate {}", model, rate));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = session.compress_report(rate).await;
    spinner.finish_and_clear();

    print!("{}", result?);
    Ok(())
}

fn run_guide(model_id: &str) -> Result<()> {
    let resources = Resources::shared();
    let guide = resources
        .guide_for_model(model_id)
        .ok_or_else(|| PromptError::UnknownModel(model_id.to_string()))?;

    println!("=== {} guide ({}) ===", guide.guide_name, guide.guide_source);
    println!("{}", guide.url);
    println!("Rewrite rules: {}", guide.rules.len());
    for tip in &guide.tips {
        println!();
        println!("* {}", tip.title);
        println!("  {}", tip.description);
        println!("  Before: {}", tip.before);
        println!("  After:  {}", tip.after);
    }

    Ok(())
}

fn run_config_command(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => config_init(force),
        ConfigCommands::Show => config_show(),
        ConfigCommands::Set { key, value } => config_set(&key, &value),
        ConfigCommands::Path => {
            println!("{}", Config::default_path().display());
            Ok(())
        }
        ConfigCommands::Validate => {
            Config::load()?.validate()?;
            println!("Configuration is valid");
            Ok(())
        }
    }
}

fn config_init(force: bool) -> Result<()> {
    let path = Config::default_path();

    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    Config::default().save()?;

    println!("Configuration file created at: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  prompt-optimizer config set gateway.api_key <key>, or");
    println!("  export {}=<key>", ENV_API_KEY);

    Ok(())
}

fn config_show() -> Result<()> {
    let mut config = Config::load()?;
    if config.gateway.api_key.is_some() {
        config.gateway.api_key = Some("***".to_string());
    }

    println!("{}", toml::to_string_pretty(&config)?);

    let status = |var: &str| if std::env::var(var).is_ok() { "set" } else { "not set" };
    println!("--- Environment Variables ---");
    println!("{}: {}", ENV_API_KEY, status(ENV_API_KEY));
    println!("{}: {}", ENV_BASE_URL, status(ENV_BASE_URL));
    println!("{}: {}", ENV_MODEL, status(ENV_MODEL));

    Ok(())
}

fn config_set(key: &str, value: &str) -> Result<()> {
    let path = Config::default_path();
    // the file alone, so env overrides are not persisted
    let mut config: Config = if path.exists() {
        toml::from_str(&std::fs::read_to_string(&path)?)?
    } else {
        Config::default()
    };

    config.set_field(key, value)?;
    config.validate()?;
    config.save()?;

    let shown = if key.ends_with("api_key") { "***" } else { value };
    println!("Set {} = {}", key, shown);
    Ok(())
}
