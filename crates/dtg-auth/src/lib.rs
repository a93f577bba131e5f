// SPDX-License-Identifier: MIT OR Apache-2.0
//! Request authorization for the device tool gateway.
//!
//! [`AuthGate::authorize`] evaluates four rules in a fixed order and the
//! first match wins:
//!
//! 1. the peer is loopback, in a trusted private range, or explicitly trusted;
//! 2. `X-Internal-Key` equals the configured internal key;
//! 3. an `Authorization: Bearer` token verifies against the signing key;
//! 4. no signing key is configured (open mode).
//!
//! Everything else is denied. A malformed credential is a failed check,
//! never an error.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod token;

pub use token::{Claims, TokenError, TokenSigner};

use dtg_config::ServerConfig;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use std::net::IpAddr;

/// Header carrying the pre-shared service key.
pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// Subject used for tokens minted for the detached tool server.
pub const TOOL_SERVER_SUBJECT: &str = "tool-server";

/// Which rule admitted (or refused) a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// Loopback, private range, or explicitly trusted peer.
    TrustedNetwork,
    /// Matching internal key header.
    InternalKey,
    /// Verified bearer token for `subject`.
    Bearer {
        /// Token subject.
        subject: String,
    },
    /// No signing key configured.
    OpenMode,
    /// No rule matched.
    Denied,
}

impl AuthDecision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// Stateless authorization policy.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    trusted_ips: Vec<IpAddr>,
    trust_private_networks: bool,
    internal_key: Option<String>,
    signer: Option<TokenSigner>,
}

impl AuthGate {
    /// A gate with no trusted peers, no keys, and therefore open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the gate from the `[server]` config section.
    ///
    /// Unparseable trusted addresses are skipped with a warning.
    pub fn from_config(server: &ServerConfig) -> Self {
        let mut gate = Self::new().with_private_networks(server.trust_private_networks);
        for raw in &server.trusted_proxy_ips {
            match raw.parse::<IpAddr>() {
                Ok(ip) => gate.trusted_ips.push(ip),
                Err(_) => tracing::warn!(target: "dtg.auth", ip = %raw, "ignoring unparseable trusted address"),
            }
        }
        if let Some(key) = server.internal_api_key() {
            gate = gate.with_internal_key(key);
        }
        if let Some(key) = server.auth_key() {
            match TokenSigner::new(key) {
                Ok(signer) => gate.signer = Some(signer),
                Err(e) => tracing::warn!(target: "dtg.auth", error = %e, "signing key rejected"),
            }
        }
        gate
    }

    /// Trust an additional peer address.
    #[must_use]
    pub fn with_trusted_ip(mut self, ip: IpAddr) -> Self {
        self.trusted_ips.push(ip);
        self
    }

    /// Trust `10.0.0.0/8` and `172.16.0.0/12` peers.
    #[must_use]
    pub fn with_private_networks(mut self, trust: bool) -> Self {
        self.trust_private_networks = trust;
        self
    }

    /// Accept `key` in the internal key header. Empty keys are ignored.
    #[must_use]
    pub fn with_internal_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.internal_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Verify bearer tokens with `signer`, leaving open mode.
    #[must_use]
    pub fn with_signer(mut self, signer: TokenSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Whether no signing key is configured.
    pub fn is_open(&self) -> bool {
        self.signer.is_none()
    }

    /// Decide whether a request from `peer` carrying `headers` may proceed.
    ///
    /// `peer` is `None` when the transport did not report an address; such
    /// requests skip the network rule.
    pub fn authorize(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> AuthDecision {
        if peer.is_some_and(|ip| self.is_trusted_peer(ip)) {
            return AuthDecision::TrustedNetwork;
        }

        if let Some(expected) = &self.internal_key
            && header_str(headers, INTERNAL_KEY_HEADER) == Some(expected.as_str())
        {
            return AuthDecision::InternalKey;
        }

        match &self.signer {
            None => AuthDecision::OpenMode,
            Some(signer) => bearer_token(headers)
                .and_then(|token| signer.verify(token).ok())
                .map_or(AuthDecision::Denied, |claims| AuthDecision::Bearer {
                    subject: claims.sub,
                }),
        }
    }

    fn is_trusted_peer(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        if ip.is_loopback() || self.trusted_ips.iter().any(|t| t.to_canonical() == ip) {
            return true;
        }
        self.trust_private_networks && is_private_range(ip)
    }
}

/// `10.0.0.0/8` or `172.16.0.0/12`.
pub fn is_private_range(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            a == 10 || (a == 172 && (16..=31).contains(&b))
        }
        IpAddr::V6(_) => false,
    }
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, AUTHORIZATION.as_str())?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
