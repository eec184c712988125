//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mailcanvas_core::ai::DEFAULT_MODEL;

/// Default port for the Mail Canvas server.
pub const DEFAULT_PORT: u16 = 9474;

/// Default chat-completions endpoint.
pub const DEFAULT_LLM_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";

/// Default timeout for one AI generation call, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for the `mailcanvas` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "mailcanvas")]
#[command(about = "Mail Canvas email-template service")]
#[command(version)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(long, env = "MAILCANVAS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "MAILCANVAS_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Directory for template records (in-memory store when omitted)
    #[arg(long, env = "MAILCANVAS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// OpenAI-compatible chat-completions URL
    #[arg(long, env = "LLM_API_URL", default_value = DEFAULT_LLM_URL)]
    pub llm_url: String,

    /// API key for the AI gateway (AI design is disabled without one)
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Model used when a request names none
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_MODEL)]
    pub llm_model: String,

    /// Timeout for one generation call, in seconds
    #[arg(long, default_value_t = DEFAULT_LLM_TIMEOUT_SECS)]
    pub llm_timeout_secs: u64,
}

/// Settings for the AI design client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Chat-completions endpoint.
    pub url: String,
    /// Bearer token.
    pub api_key: String,
    /// Default model.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl LlmConfig {
    /// Create a config for `url` with the default model and timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind.
    pub bind: IpAddr,
    /// Directory for template records.
    pub data_dir: Option<PathBuf>,
    /// AI design settings, present only when an API key is configured.
    pub llm: Option<LlmConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            data_dir: None,
            llm: None,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl From<CliArgs> for ServerConfig {
    fn from(args: CliArgs) -> Self {
        let llm = args
            .llm_api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(|api_key| LlmConfig {
                url: args.llm_url,
                api_key,
                model: args.llm_model,
                timeout: Duration::from_secs(args.llm_timeout_secs),
            });
        Self {
            port: args.port,
            bind: args.bind,
            data_dir: args.data_dir,
            llm,
        }
    }
}
