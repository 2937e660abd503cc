//! CLI command definitions

use apptoken::config::ConfigError;
use apptoken::GateConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "apptoken")]
#[command(about = "Short-lived application tokens and token-gated endpoints", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Token signing secret [env: APPTOKEN_SECRET]
    #[arg(long, global = true)]
    pub secret: Option<String>,

    /// Token lifetime in seconds [env: APPTOKEN_TTL, default: 86400]
    #[arg(long, global = true)]
    pub ttl: Option<u64>,

    /// Query parameter carrying the token [env: APPTOKEN_PARAM, default: apptoken]
    #[arg(long, global = true)]
    pub token_param: Option<String>,

    /// Parameter carrying the target object id [env: APPTOKEN_OBJECT_PARAM, default: device_id]
    #[arg(long, global = true)]
    pub object_param: Option<String>,
}

impl Cli {
    /// Gate configuration from the environment, overridden by any global flags
    pub fn gate_config(&self) -> anyhow::Result<GateConfig> {
        let mut config = match self.secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => GateConfig::new(secret).with_env_overrides()?,
            None => match GateConfig::from_env() {
                Err(ConfigError::Missing(_)) => {
                    anyhow::bail!("APPTOKEN_SECRET or --secret is required")
                }
                other => other?,
            },
        };

        if let Some(ttl) = self.ttl {
            config = config.token_ttl(Duration::from_secs(ttl));
        }
        if let Some(name) = &self.token_param {
            config = config.token_param(name.clone());
        }
        if let Some(name) = &self.object_param {
            config = config.object_param(name.clone());
        }

        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    ///
    /// Examples:
    ///   apptoken serve --applications apps.json
    ///   apptoken serve -b 127.0.0.1:8080 --applications apps.json --policy allow-all
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "0.0.0.0:8080", env = "APPTOKEN_BIND")]
        bind: String,

        /// JSON file with the application records
        #[arg(long, env = "APPTOKEN_APPLICATIONS")]
        applications: Option<PathBuf>,

        /// Policy guarding the sample device resource
        #[arg(long, value_enum, default_value_t = PolicyKind::OwnsTarget)]
        policy: PolicyKind,
    },

    /// Issue a token for an application id
    Issue {
        /// Application id to embed
        #[arg(long)]
        app_id: u64,
    },

    /// Verify a token and print its claims
    Verify {
        /// Token to verify
        token: String,
    },

    /// Generate a random API key
    Keygen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Target id must equal the application id
    OwnsTarget,
    /// Any resolved application is permitted
    AllowAll,
}
