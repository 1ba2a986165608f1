// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token reissue.
//!
//! Every successful protected request hands the caller a replacement token
//! with the same claims and a pushed-out expiry.

use std::path::Path;
use std::time::Duration;

use jsonwebtoken::{encode, EncodingKey, Header};

use super::token::{TokenClaims, VerifiedToken, TOKEN_ALGORITHM};

/// Default lifetime of a reissued token (1 hour).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Issues a fresh token from an already validated one.
pub trait TokenRefresher: Send + Sync {
    fn refresh(&self, token: &VerifiedToken) -> Result<String, RefreshError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("failed to read signing key {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid signing key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign refreshed token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// RS512 issuer backed by an RSA private key.
#[derive(Clone)]
pub struct RsaTokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl RsaTokenIssuer {
    /// Create an issuer from a PKCS#1 or PKCS#8 PEM private key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, RefreshError> {
        let key = EncodingKey::from_rsa_pem(pem).map_err(RefreshError::InvalidKey)?;
        Ok(Self {
            key,
            ttl: DEFAULT_TOKEN_TTL,
        })
    }

    /// Load the private key from a PEM file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RefreshError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| RefreshError::KeyFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_rsa_pem(&pem)
    }

    /// Set the lifetime of issued tokens.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `claims` with `iat = now` and `exp = now + ttl`.
    pub fn issue(&self, claims: &TokenClaims, kid: Option<String>) -> Result<String, RefreshError> {
        let now = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);

        let mut claims = claims.clone();
        claims.iat = Some(now);
        claims.exp = Some(now.saturating_add(ttl));

        let mut header = Header::new(TOKEN_ALGORITHM);
        header.kid = kid;

        encode(&header, &claims, &self.key).map_err(RefreshError::Signing)
    }
}

impl TokenRefresher for RsaTokenIssuer {
    fn refresh(&self, token: &VerifiedToken) -> Result<String, RefreshError> {
        self.issue(token.claims(), token.header().kid.clone())
    }
}
