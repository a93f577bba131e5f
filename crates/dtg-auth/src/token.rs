// SPDX-License-Identifier: MIT OR Apache-2.0
//! HS256 bearer tokens shared between the gateway and its tool servers.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised while minting or checking a bearer token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The signing key was empty.
    #[error("signing key must not be empty")]
    EmptyKey,
    /// Encoding failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
    /// Signature, expiry, or structure check failed.
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by every gateway token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the device or service the token was minted for.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Mints and verifies HS256 tokens with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSigner {
    /// Build a signer from a non-empty secret.
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptyKey);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Mint a token for `subject` that expires after `ttl`.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSigner { .. }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_returns_subject() {
        let signer = TokenSigner::new("k").unwrap();
        let token = signer.issue("tool-server", Duration::hours(1)).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "tool-server");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let a = TokenSigner::new("a").unwrap();
        let b = TokenSigner::new("b").unwrap();
        let token = a.issue("dev", Duration::hours(1)).unwrap();
        assert!(matches!(b.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new("k").unwrap();
        let token = signer.issue("dev", Duration::hours(-2)).unwrap();
        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        let signer = TokenSigner::new("k").unwrap();
        assert!(signer.verify("not.a.token").is_err());
        assert!(signer.verify("").is_err());
    }

    #[test]
    fn empty_key_is_refused() {
        assert!(matches!(TokenSigner::new(""), Err(TokenError::EmptyKey)));
    }
}
