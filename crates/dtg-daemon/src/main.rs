// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use dtg_auth::AuthGate;
use dtg_config::{load_config, validate_config};
use dtg_core::InMemoryConnectionRegistry;
use dtg_daemon::{AppState, build_app};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dtg-daemon", version, about = "Device tool gateway daemon")]
struct Args {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address, overriding `server.ip` and `server.http_port`.
    #[arg(long)]
    bind: Option<String>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("dtg=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dtg=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(args.config.as_deref()).context("load config")?;
    for warning in validate_config(&config).context("validate config")? {
        warn!(target: "dtg.daemon", %warning, "config warning");
    }

    let bind = args
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.ip, config.server.http_port));

    // Device transports register their sessions here.
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let state = Arc::new(
        AppState::new(registry, AuthGate::from_config(&config.server))
            .with_call_timeout(Duration::from_secs(config.tools.call_timeout_secs)),
    );
    let open = state.gate.is_open();
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(target: "dtg.daemon", bind = %bind, open_mode = open, "dtg-daemon listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("serve")
}
