// SPDX-License-Identifier: MIT OR Apache-2.0
//! Where relayed calls go and how they authenticate.

use chrono::Duration;
use dtg_auth::{INTERNAL_KEY_HEADER, TOOL_SERVER_SUBJECT, TokenError, TokenSigner};
use dtg_config::{GatewayConfig, WILDCARD_IP};
use std::fmt;

/// Path of the gateway's tool-call route.
pub const TOOL_CALL_PATH: &str = "/internal/tool/call";

/// Lifetime of a token minted for a single relayed call.
const MINTED_TOKEN_TTL_MINUTES: i64 = 5;

/// Source of a bearer token.
#[derive(Clone)]
pub enum BearerToken {
    /// A pre-issued token, sent as is.
    Fixed(String),
    /// A fresh short-lived token is minted for every call.
    Minted {
        /// Signer holding the gateway's signing key.
        signer: TokenSigner,
        /// Subject placed in each token.
        subject: String,
    },
}

impl BearerToken {
    fn token(&self) -> Result<String, TokenError> {
        match self {
            Self::Fixed(token) => Ok(token.clone()),
            Self::Minted { signer, subject } => {
                signer.issue(subject, Duration::minutes(MINTED_TOKEN_TTL_MINUTES))
            }
        }
    }
}

/// Exactly one credential attached to every relayed call.
#[derive(Clone)]
pub enum ProxyCredential {
    /// Pre-shared service key sent in `X-Internal-Key`.
    InternalKey(String),
    /// Token sent as `Authorization: Bearer`.
    Bearer(BearerToken),
    /// No credential; relies on the gateway trusting this peer.
    None,
}

impl ProxyCredential {
    /// Pick the credential from the `[server]` settings.
    ///
    /// An internal key wins over a signing key; with neither, no header is
    /// sent.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, TokenError> {
        if let Some(key) = config.server.internal_api_key() {
            return Ok(Self::InternalKey(key.to_string()));
        }
        match config.server.auth_key() {
            Some(secret) => Ok(Self::Bearer(BearerToken::Minted {
                signer: TokenSigner::new(secret)?,
                subject: TOOL_SERVER_SUBJECT.to_string(),
            })),
            None => Ok(Self::None),
        }
    }

    /// The header to attach, if any.
    pub fn header(&self) -> Result<Option<(&'static str, String)>, TokenError> {
        match self {
            Self::InternalKey(key) => Ok(Some((INTERNAL_KEY_HEADER, key.clone()))),
            Self::Bearer(bearer) => Ok(Some(("authorization", format!("Bearer {}", bearer.token()?)))),
            Self::None => Ok(None),
        }
    }

    /// Short label for logs; never contains the secret.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InternalKey(_) => "internal-key",
            Self::Bearer(_) => "bearer",
            Self::None => "none",
        }
    }
}

impl fmt::Debug for ProxyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProxyCredential::{}", self.kind())
    }
}

/// Base URL of the gateway plus the credential to present.
#[derive(Debug, Clone)]
pub struct RelayTarget {
    base_url: String,
    credential: ProxyCredential,
}

impl RelayTarget {
    /// A target at `base_url` (trailing slashes are dropped).
    pub fn new(base_url: impl Into<String>, credential: ProxyCredential) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            credential,
        }
    }

    /// Derive the gateway address and credential from configuration.
    ///
    /// The host is `server.tool_proxy_host` when set, otherwise
    /// `server.ip` with a wildcard bind replaced by loopback. Environment
    /// overrides are expected to be applied to `config` already.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, TokenError> {
        let host = dial_host(config);
        let base_url = format!("http://{host}:{}", config.server.http_port);
        Ok(Self::new(base_url, ProxyCredential::from_config(config)?))
    }

    /// Gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the tool-call route.
    pub fn call_url(&self) -> String {
        format!("{}{TOOL_CALL_PATH}", self.base_url)
    }

    /// Attached credential.
    pub fn credential(&self) -> &ProxyCredential {
        &self.credential
    }
}

fn dial_host(config: &GatewayConfig) -> String {
    let host = match config.server.tool_proxy_host() {
        Some(explicit) => explicit.to_string(),
        None => match config.server.ip.as_str() {
            WILDCARD_IP => "127.0.0.1".to_string(),
            "::" => "::1".to_string(),
            other => other.to_string(),
        },
    };
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host
    }
}
