use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use services::ai::{AiConfig, AiLimits, PictogramConfig};
use services::ServicesConfig;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level CLI parser for the `aet` binary.
#[derive(Debug, Parser)]
#[command(name = "aet", version, about = "AET progress tracker and lesson planner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Database URL or path (`sqlite:aet.db`, `aet.db`, ...)
    #[arg(long, global = true, env = "AET_DB_URL", default_value = "sqlite:aet.sqlite3")]
    pub db: String,

    /// Log level or filter directive; `RUST_LOG` applies when unset
    #[arg(long, global = true, env = "AET_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(flatten)]
    pub ai: AiArgs,

    #[command(flatten)]
    pub pictograms: PictogramArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Create a demo class with students and some progress
    Seed,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, global = true, env = "AET_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,
}

#[derive(Debug, Clone, Args)]
pub struct AiArgs {
    /// API key for the chat completions endpoint; AI features are off without one
    #[arg(long = "ai-api-key", global = true, env = "AET_AI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(
        id = "ai_base_url",
        long = "ai-base-url",
        global = true,
        env = "AET_AI_BASE_URL",
        default_value = services::ai::client::DEFAULT_AI_BASE_URL
    )]
    pub base_url: String,

    #[arg(
        long = "ai-model",
        global = true,
        env = "AET_AI_MODEL",
        default_value = services::ai::client::DEFAULT_AI_MODEL
    )]
    pub model: String,

    #[arg(long = "ai-temperature", global = true, env = "AET_AI_TEMPERATURE", default_value_t = 0.7)]
    pub temperature: f32,

    #[arg(long = "ai-max-tokens", global = true, env = "AET_AI_MAX_TOKENS", default_value_t = 1500)]
    pub max_tokens: u32,

    #[arg(long = "ai-timeout-secs", global = true, env = "AET_AI_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Requests allowed per UTC day
    #[arg(
        long = "ai-daily-cap",
        global = true,
        env = "AET_AI_DAILY_CAP",
        default_value_t = services::ai::usage::DEFAULT_DAILY_CAP
    )]
    pub daily_cap: u32,

    /// Minimum seconds between two requests
    #[arg(
        long = "ai-cooldown-secs",
        global = true,
        env = "AET_AI_COOLDOWN_SECS",
        default_value_t = services::ai::usage::DEFAULT_COOLDOWN_SECS
    )]
    pub cooldown_secs: u32,
}

#[derive(Debug, Clone, Args)]
pub struct PictogramArgs {
    #[arg(
        id = "pictogram_base_url",
        long = "pictogram-base-url",
        global = true,
        env = "AET_PICTOGRAM_BASE_URL",
        default_value = services::ai::pictograms::DEFAULT_PICTOGRAM_BASE_URL
    )]
    pub base_url: String,

    #[arg(
        long = "pictogram-locale",
        global = true,
        env = "AET_PICTOGRAM_LOCALE",
        default_value = services::ai::pictograms::DEFAULT_PICTOGRAM_LOCALE
    )]
    pub locale: String,
}

impl Cli {
    /// Log filter to install and whether it overrides `RUST_LOG`.
    #[must_use]
    pub fn log_filter(&self) -> (&str, bool) {
        match self.log_level.as_deref() {
            Some(level) => (level, true),
            None => (DEFAULT_LOG_LEVEL, false),
        }
    }

    #[must_use]
    pub fn services_config(&self) -> ServicesConfig {
        ServicesConfig {
            ai: AiConfig {
                base_url: self.ai.base_url.clone(),
                api_key: self.ai.api_key.clone().filter(|key| !key.trim().is_empty()),
                model: self.ai.model.clone(),
                temperature: self.ai.temperature,
                max_tokens: self.ai.max_tokens,
                timeout: Duration::from_secs(self.ai.timeout_secs),
            },
            limits: AiLimits {
                daily_cap: self.ai.daily_cap,
                cooldown_secs: self.ai.cooldown_secs,
            },
            pictograms: PictogramConfig {
                base_url: self.pictograms.base_url.clone(),
                locale: self.pictograms.locale.clone(),
                ..PictogramConfig::default()
            },
        }
    }
}
