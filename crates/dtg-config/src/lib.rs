// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the device tool gateway.
//!
//! [`GatewayConfig`] holds the settings shared by the gateway daemon and the
//! detached tool server: where the gateway listens, which credentials it
//! accepts, the call ceilings, and where tool profiles are persisted.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No signing key is configured, so every caller is admitted.
    OpenMode,
    /// The gateway binds every interface.
    WildcardBind {
        /// Configured bind address.
        ip: String,
    },
    /// The relay ceiling does not exceed the endpoint ceiling, so relayed
    /// calls may time out locally before the endpoint answers.
    ProxyTimeoutNotLarger {
        /// Endpoint ceiling in seconds.
        call_secs: u64,
        /// Relay ceiling in seconds.
        proxy_secs: u64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::OpenMode => {
                write!(f, "server.auth_key is empty: authentication is disabled")
            }
            ConfigWarning::WildcardBind { ip } => {
                write!(f, "server.ip '{ip}' binds every interface")
            }
            ConfigWarning::ProxyTimeoutNotLarger {
                call_secs,
                proxy_secs,
            } => write!(
                f,
                "tools.proxy_timeout_secs ({proxy_secs}s) should exceed tools.call_timeout_secs ({call_secs}s)"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level configuration for the device tool gateway.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Gateway HTTP server and credentials.
    #[serde(default)]
    pub server: ServerConfig,
    /// Tool-call ceilings and profile storage.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Detached tool server.
    #[serde(default)]
    pub tool_server: ToolServerConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address of the gateway HTTP server.
    pub ip: String,
    /// Port of the gateway HTTP server.
    pub http_port: u16,
    /// Bearer signing key. Empty or absent disables authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_key: Option<String>,
    /// Shared secret accepted in the `X-Internal-Key` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_api_key: Option<String>,
    /// Peer addresses trusted like loopback.
    pub trusted_proxy_ips: Vec<String>,
    /// Trust `10.0.0.0/8` and `172.16.0.0/12` peers.
    pub trust_private_networks: bool,
    /// Host the detached tool server dials instead of `ip`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_proxy_host: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".into(),
            http_port: 8003,
            auth_key: None,
            internal_api_key: None,
            trusted_proxy_ips: Vec::new(),
            trust_private_networks: true,
            tool_proxy_host: None,
        }
    }
}

impl ServerConfig {
    /// The signing key, treating an empty string as absent.
    pub fn auth_key(&self) -> Option<&str> {
        non_empty(&self.auth_key)
    }

    /// The internal key, treating an empty string as absent.
    pub fn internal_api_key(&self) -> Option<&str> {
        non_empty(&self.internal_api_key)
    }

    /// The explicit relay host, treating an empty string as absent.
    pub fn tool_proxy_host(&self) -> Option<&str> {
        non_empty(&self.tool_proxy_host)
    }
}

/// `[tools]` section.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Ceiling the endpoint applies to each device invocation.
    pub call_timeout_secs: u64,
    /// Ceiling the relay applies to each forwarded call.
    pub proxy_timeout_secs: u64,
    /// Directory holding one JSON file per profile.
    pub profiles_dir: String,
    /// Profile to restore instead of the lexicographically first one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 30,
            proxy_timeout_secs: 35,
            profiles_dir: "data/device_tools".into(),
            profile: None,
        }
    }
}

impl ToolsConfig {
    /// The explicit profile, treating an empty string as absent.
    pub fn profile(&self) -> Option<&str> {
        non_empty(&self.profile)
    }
}

/// `[tool_server]` section.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct ToolServerConfig {
    /// Bind address of the detached tool server.
    pub host: String,
    /// Port of the detached tool server.
    pub port: u16,
    /// Log level (`error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: String,
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8805,
            log_level: "info".into(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Address meaning "all interfaces".
pub const WILDCARD_IP: &str = "0.0.0.0";

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`GatewayConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`GatewayConfig::default()`].
///
/// Process environment overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`GatewayConfig`].
pub fn parse_toml(content: &str) -> Result<GatewayConfig, ConfigError> {
    toml::from_str::<GatewayConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply overrides from the process environment.
///
/// See [`apply_env_overrides_with`] for the recognised variables.
pub fn apply_env_overrides(config: &mut GatewayConfig) {
    apply_env_overrides_with(config, |key| std::env::var(key).ok());
}

/// Apply overrides resolved through `lookup`.
///
/// Recognised variables:
/// - `DTG_TOOL_PROXY_HOST`
/// - `DTG_INTERNAL_API_KEY`
/// - `DTG_AUTH_KEY`
/// - `DTG_PROFILES_DIR`
/// - `DTG_LOG_LEVEL`
pub fn apply_env_overrides_with<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("DTG_TOOL_PROXY_HOST") {
        config.server.tool_proxy_host = Some(val);
    }
    if let Some(val) = lookup("DTG_INTERNAL_API_KEY") {
        config.server.internal_api_key = Some(val);
    }
    if let Some(val) = lookup("DTG_AUTH_KEY") {
        config.server.auth_key = Some(val);
    }
    if let Some(val) = lookup("DTG_PROFILES_DIR") {
        config.tools.profiles_dir = val;
    }
    if let Some(val) = lookup("DTG_LOG_LEVEL") {
        config.tool_server.log_level = val;
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (zero ports, zero timeouts, unknown log level, empty profile
/// directory) are returned as a [`ConfigError::ValidationError`]; soft
/// issues come back as warnings.
pub fn validate_config(config: &GatewayConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if config.server.http_port == 0 {
        errors.push("server.http_port must not be 0".into());
    }
    if config.tool_server.port == 0 {
        errors.push("tool_server.port must not be 0".into());
    }
    if config.tools.call_timeout_secs == 0 {
        errors.push("tools.call_timeout_secs must be at least 1".into());
    }
    if config.tools.proxy_timeout_secs == 0 {
        errors.push("tools.proxy_timeout_secs must be at least 1".into());
    }
    if config.tools.profiles_dir.trim().is_empty() {
        errors.push("tools.profiles_dir must not be empty".into());
    }
    let level = config.tool_server.log_level.as_str();
    if !VALID_LOG_LEVELS.contains(&level) {
        errors.push(format!("invalid log_level '{level}'"));
    }
    for ip in &config.server.trusted_proxy_ips {
        if ip.parse::<std::net::IpAddr>().is_err() {
            errors.push(format!("server.trusted_proxy_ips: '{ip}' is not an IP address"));
        }
    }

    let (call, proxy) = (
        config.tools.call_timeout_secs,
        config.tools.proxy_timeout_secs,
    );
    if call > 0 && proxy > 0 && proxy <= call {
        warnings.push(ConfigWarning::ProxyTimeoutNotLarger {
            call_secs: call,
            proxy_secs: proxy,
        });
    }
    if config.server.auth_key().is_none() {
        warnings.push(ConfigWarning::OpenMode);
    }
    if config.server.ip == WILDCARD_IP {
        warnings.push(ConfigWarning::WildcardBind {
            ip: config.server.ip.clone(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
///
/// Optional fields fall back to `base` when the overlay leaves them unset.
/// Plain fields take the overlay value unless it still equals the built-in
/// default. Trusted address lists are concatenated without duplicates.
pub fn merge_configs(base: GatewayConfig, overlay: GatewayConfig) -> GatewayConfig {
    let defaults = GatewayConfig::default();

    let mut trusted = base.server.trusted_proxy_ips;
    for ip in overlay.server.trusted_proxy_ips {
        if !trusted.contains(&ip) {
            trusted.push(ip);
        }
    }

    GatewayConfig {
        server: ServerConfig {
            ip: pick(base.server.ip, overlay.server.ip, &defaults.server.ip),
            http_port: pick(
                base.server.http_port,
                overlay.server.http_port,
                &defaults.server.http_port,
            ),
            auth_key: overlay.server.auth_key.or(base.server.auth_key),
            internal_api_key: overlay
                .server
                .internal_api_key
                .or(base.server.internal_api_key),
            trusted_proxy_ips: trusted,
            trust_private_networks: pick(
                base.server.trust_private_networks,
                overlay.server.trust_private_networks,
                &defaults.server.trust_private_networks,
            ),
            tool_proxy_host: overlay.server.tool_proxy_host.or(base.server.tool_proxy_host),
        },
        tools: ToolsConfig {
            call_timeout_secs: pick(
                base.tools.call_timeout_secs,
                overlay.tools.call_timeout_secs,
                &defaults.tools.call_timeout_secs,
            ),
            proxy_timeout_secs: pick(
                base.tools.proxy_timeout_secs,
                overlay.tools.proxy_timeout_secs,
                &defaults.tools.proxy_timeout_secs,
            ),
            profiles_dir: pick(
                base.tools.profiles_dir,
                overlay.tools.profiles_dir,
                &defaults.tools.profiles_dir,
            ),
            profile: overlay.tools.profile.or(base.tools.profile),
        },
        tool_server: ToolServerConfig {
            host: pick(
                base.tool_server.host,
                overlay.tool_server.host,
                &defaults.tool_server.host,
            ),
            port: pick(
                base.tool_server.port,
                overlay.tool_server.port,
                &defaults.tool_server.port,
            ),
            log_level: pick(
                base.tool_server.log_level,
                overlay.tool_server.log_level,
                &defaults.tool_server.log_level,
            ),
        },
    }
}

fn pick<T: PartialEq>(base: T, overlay: T, default: &T) -> T {
    if overlay != *default { overlay } else { base }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
