// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Repo maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate JSON Schemas for wire and config types.
    Schema {
        /// Output directory.
        #[arg(long, default_value = "contracts/schemas")]
        out_dir: PathBuf,
    },
    /// Write the default gateway config as TOML.
    DefaultConfig {
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Schema { out_dir } => schema(&out_dir),
        Command::DefaultConfig { out } => default_config(out.as_deref()),
    }
}

fn schema(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).context("create schema output dir")?;

    write_schema(
        &out_dir.join("tool_call_request.schema.json"),
        &schema_for!(dtg_core::ToolCallRequest),
    )?;
    write_schema(
        &out_dir.join("tool_descriptor.schema.json"),
        &schema_for!(dtg_core::ToolDescriptor),
    )?;
    write_schema(
        &out_dir.join("device_summary.schema.json"),
        &schema_for!(dtg_core::DeviceSummary),
    )?;
    write_schema(
        &out_dir.join("gateway_config.schema.json"),
        &schema_for!(dtg_config::GatewayConfig),
    )?;

    eprintln!("wrote schemas to {}", out_dir.display());
    Ok(())
}

fn write_schema(path: &Path, schema: &schemars::Schema) -> Result<()> {
    let s = serde_json::to_string_pretty(schema)?;
    std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn default_config(out: Option<&Path>) -> Result<()> {
    let text = toml::to_string_pretty(&dtg_config::GatewayConfig::default())
        .context("serialize default config")?;
    match out {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?
        }
        None => print!("{text}"),
    }
    Ok(())
}
