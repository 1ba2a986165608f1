// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification key set.
//!
//! The set is built once at startup (from a JWKS document, a PEM public key,
//! or a JWKS URL) and is read-only afterwards. Only the first key is used
//! for verification; there is no `kid` based selection.

use std::path::Path;
use std::time::Duration;

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::DecodingKey;

/// Timeout for fetching a remote JWKS.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the token verification key.
pub trait KeyProvider: Send + Sync {
    /// Key used to verify bearer tokens, if any is loaded.
    fn verification_key(&self) -> Option<&DecodingKey>;
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("failed to read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JWKS document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid public key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
    #[error("failed to fetch JWKS: {0}")]
    Fetch(String),
    #[error("key set contains no usable RSA keys")]
    Empty,
}

/// Ordered RSA verification keys.
#[derive(Clone, Default)]
pub struct PublicKeySet {
    keys: Vec<DecodingKey>,
}

impl PublicKeySet {
    pub fn new(keys: Vec<DecodingKey>) -> Self {
        Self { keys }
    }

    /// Build from a parsed JWKS, keeping RSA keys in document order.
    pub fn from_jwks(jwks: &JwkSet) -> Result<Self, KeyError> {
        let mut keys = Vec::with_capacity(jwks.keys.len());
        for jwk in &jwks.keys {
            match jwk_to_decoding_key(jwk) {
                Ok(key) => keys.push(key),
                Err(e) => tracing::warn!(
                    kid = jwk.common.key_id.as_deref().unwrap_or("-"),
                    error = %e,
                    "Skipping unusable JWK"
                ),
            }
        }

        if keys.is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Self { keys })
    }

    pub fn from_jwks_json(json: &str) -> Result<Self, KeyError> {
        let jwks: JwkSet = serde_json::from_str(json)?;
        Self::from_jwks(&jwks)
    }

    /// Single-key set from a PEM encoded RSA public key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, KeyError> {
        Ok(Self {
            keys: vec![DecodingKey::from_rsa_pem(pem)?],
        })
    }

    /// Load from a file holding either a JWKS document or a PEM public key.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| KeyError::Io {
            path: path.display().to_string(),
            source,
        })?;

        if contents.trim_start().starts_with("-----BEGIN") {
            Self::from_rsa_pem(contents.as_bytes())
        } else {
            Self::from_jwks_json(&contents)
        }
    }

    /// Fetch a JWKS over HTTPS.
    pub async fn fetch(url: &str) -> Result<Self, KeyError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| KeyError::Fetch(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| KeyError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyError::Fetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| KeyError::Fetch(e.to_string()))?;

        Self::from_jwks(&jwks)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn first(&self) -> Option<&DecodingKey> {
        self.keys.first()
    }
}

impl KeyProvider for PublicKeySet {
    fn verification_key(&self) -> Option<&DecodingKey> {
        self.first()
    }
}

/// Convert an RSA JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, KeyError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => Ok(DecodingKey::from_rsa_components(&rsa.n, &rsa.e)?),
        _ => Err(KeyError::InvalidKey(
            jsonwebtoken::errors::ErrorKind::InvalidKeyFormat.into(),
        )),
    }
}
