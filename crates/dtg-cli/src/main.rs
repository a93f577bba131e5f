// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dtg_cli::commands::{
    check_config, issue_token, list_profiles, load, resolve_signing_key, show_profile,
};
use dtg_cli::format::{format_catalog, format_profile_table};
use dtg_cli::serve::build_tool_app;
use dtg_proxy::restore_device_tools;
use dtg_runtime::ToolManager;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dtg", version, about = "Device tool gateway CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the detached tool server over restored device tools.
    Tools {
        #[command(subcommand)]
        action: ToolsAction,
    },

    /// Issue a bearer token signed with the gateway key.
    Token {
        /// Token subject, usually a device or service id.
        #[arg(long)]
        subject: String,

        /// Lifetime in hours.
        #[arg(long, default_value_t = 24)]
        expire_hours: i64,

        /// Signing key; defaults to `server.auth_key`.
        #[arg(long)]
        auth_key: Option<String>,
    },

    /// Inspect persisted tool profiles.
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },
}

#[derive(Subcommand, Debug)]
enum ToolsAction {
    /// Restore a profile and serve it over HTTP.
    Serve {
        /// Profile to restore instead of the configured or first one.
        #[arg(long)]
        profile: Option<String>,

        /// Bind address; defaults to `tool_server.host:tool_server.port`.
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ProfilesAction {
    /// List profiles with fingerprint and tool count.
    List {
        /// Profile directory; defaults to `tools.profiles_dir`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print the tools of one profile.
    Show {
        /// Profile name; the first profile when omitted.
        name: Option<String>,

        /// Profile directory; defaults to `tools.profiles_dir`.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Print the raw descriptors as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load(cli.config.as_deref())?;

    let filter = if cli.debug {
        EnvFilter::new("dtg=debug")
    } else {
        EnvFilter::new(format!("dtg={}", config.tool_server.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    check_config(&config)?;

    match cli.command {
        Commands::Tools {
            action: ToolsAction::Serve { profile, bind },
        } => {
            let manager = Arc::new(ToolManager::new());
            match restore_device_tools(&config, &manager, profile.as_deref()) {
                Some(report) => info!(
                    target: "dtg.cli",
                    profile = %report.profile,
                    tools = report.tools,
                    relay = %report.relay_url,
                    "device tools available"
                ),
                None => info!(target: "dtg.cli", "serving without device tools"),
            }

            let bind = bind.unwrap_or_else(|| {
                format!("{}:{}", config.tool_server.host, config.tool_server.port)
            });
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("bind {bind}"))?;
            info!(target: "dtg.cli", bind = %bind, "tool server listening");
            axum::serve(listener, build_tool_app(manager))
                .await
                .context("serve")?;
        }
        Commands::Token {
            subject,
            expire_hours,
            auth_key,
        } => {
            let secret = resolve_signing_key(auth_key, &config)?;
            println!("{}", issue_token(&secret, &subject, expire_hours)?);
        }
        Commands::Profiles { action } => match action {
            ProfilesAction::List { dir } => {
                let dir = dir.unwrap_or_else(|| PathBuf::from(&config.tools.profiles_dir));
                print!("{}", format_profile_table(&list_profiles(&dir)));
            }
            ProfilesAction::Show { name, dir, json } => {
                let dir = dir.unwrap_or_else(|| PathBuf::from(&config.tools.profiles_dir));
                let loaded = show_profile(&dir, name.as_deref())?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&loaded.catalog).context("serialize catalog")?
                    );
                } else {
                    print!("{}", format_catalog(&loaded.catalog));
                }
            }
        },
    }
    Ok(())
}
