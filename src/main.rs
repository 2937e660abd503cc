//! apptoken CLI entry point

mod cli;

use crate::cli::{Cli, Commands, PolicyKind};
use anyhow::{Context, Result};
use apptoken::auth::{AllowAll, ApplicationId, AuthorizationPolicy, Claims, OwnsTarget};
use apptoken::directory::{ApiKey, ApplicationDirectory, MemoryDirectory};
use apptoken::server::{run_http_server, ServerState};
use apptoken::{AuthorizationGate, GateConfig, TokenCodec, Verification};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            bind,
            applications,
            policy,
        } => serve(cli.gate_config()?, bind, applications.clone(), *policy).await,
        Commands::Issue { app_id } => issue(cli.gate_config()?, *app_id),
        Commands::Verify { token } => verify(cli.gate_config()?, token),
        Commands::Keygen => {
            println!("{}", ApiKey::generate().as_str());
            Ok(())
        }
    }
}

async fn serve(
    config: GateConfig,
    bind: &str,
    applications: Option<PathBuf>,
    policy: PolicyKind,
) -> Result<()> {
    let bind_addr = bind.parse().context("Invalid bind address")?;

    let directory: Option<Arc<dyn ApplicationDirectory>> = match applications {
        Some(path) => {
            let directory = MemoryDirectory::from_json_file(&path)
                .with_context(|| format!("Failed to load applications: {}", path.display()))?;
            info!(count = directory.len(), "Application directory loaded");
            Some(Arc::new(directory))
        }
        None => {
            warn!("No applications file given; token requests will be refused");
            None
        }
    };

    let policy: Arc<dyn AuthorizationPolicy> = match policy {
        PolicyKind::OwnsTarget => Arc::new(OwnsTarget),
        PolicyKind::AllowAll => Arc::new(AllowAll),
    };

    let state = ServerState {
        gate: Arc::new(AuthorizationGate::with_directory(config, directory)),
        policy,
    };

    info!(addr = %bind_addr, "apptoken server starting");
    run_http_server(bind_addr, state, shutdown_signal()).await?;
    info!("apptoken server stopped");

    Ok(())
}

fn issue(config: GateConfig, app_id: u64) -> Result<()> {
    let codec = TokenCodec::new(config.secret).with_ttl(config.token_ttl);
    let token = codec
        .issue(&Claims::new(ApplicationId(app_id)))
        .context("Failed to issue token")?;

    println!("{}", token);
    Ok(())
}

fn verify(config: GateConfig, token: &str) -> Result<()> {
    let codec = TokenCodec::new(config.secret);

    match codec.verify(token) {
        Verification::Valid(claims) => {
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(())
        }
        Verification::Expired | Verification::BadSignature => {
            println!("invalid");
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
