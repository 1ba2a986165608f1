// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification and claim validation.
//!
//! Verification (signature, algorithm) and validation (temporal claims) are
//! separate steps so the caller can tell an expired token apart from a
//! forged one.

use std::fmt;
use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::refresh::{RefreshError, TokenRefresher};

/// The only accepted signature algorithm.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::RS512;

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by a token.
///
/// Temporal claims are typed; everything else (`phone`, `email`, `sub`...)
/// is kept verbatim so a refreshed token carries the same identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(
        default,
        deserialize_with = "numeric_date::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,
    #[serde(
        default,
        deserialize_with = "numeric_date::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub nbf: Option<i64>,
    #[serde(
        default,
        deserialize_with = "numeric_date::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// NumericDate claims in whole seconds.
///
/// Fractional values are accepted and floored.
mod numeric_date {
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Number;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(number) = Option::<Number>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if let Some(secs) = number.as_i64() {
            return Ok(Some(secs));
        }
        match number.as_f64() {
            Some(secs) if secs.is_finite() => Ok(Some(secs.floor() as i64)),
            _ => Err(D::Error::custom(format!("invalid NumericDate {number}"))),
        }
    }
}

impl TokenClaims {
    /// String value of a non-temporal claim.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }
}

/// A token whose signature has been checked against the verification key.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    raw: String,
    header: Header,
    claims: TokenClaims,
}

impl VerifiedToken {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }
}

/// A validated token together with the refresher that can reissue it.
///
/// This is what protected work functions receive, and what
/// [`AuthResponse::success`](super::AuthResponse::success) needs to hand the
/// caller a new token.
#[derive(Clone)]
pub struct Session {
    token: VerifiedToken,
    refresher: Arc<dyn TokenRefresher>,
}

impl Session {
    pub fn new(token: VerifiedToken, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self { token, refresher }
    }

    pub fn token(&self) -> &VerifiedToken {
        &self.token
    }

    pub fn claims(&self) -> &TokenClaims {
        self.token.claims()
    }

    /// Issue a replacement token with an extended expiry.
    pub fn refresh(&self) -> Result<String, RefreshError> {
        self.refresher.refresh(&self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("claims", self.token.claims())
            .finish_non_exhaustive()
    }
}

/// Why a token failed verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("no Authorization header present")]
    MissingAuthHeader,
    #[error("invalid Authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    #[error("no verification key available")]
    NoVerificationKey,
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Why a verified token failed temporal validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("exp not satisfied")]
    Expired,
    #[error("nbf not satisfied")]
    NotYetValid,
    #[error("iat not satisfied")]
    IssuedInFuture,
}

/// Pull the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, VerifyError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(VerifyError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| VerifyError::InvalidAuthHeader)?;

    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(VerifyError::InvalidAuthHeader)
}

/// Verify the request's bearer token with `key`, requiring RS512.
///
/// Only the signature and algorithm are checked here; see [`validate`].
pub fn verify_and_parse(
    headers: &HeaderMap,
    key: Option<&DecodingKey>,
) -> Result<VerifiedToken, VerifyError> {
    let raw = bearer_token(headers)?;
    let key = key.ok_or(VerifyError::NoVerificationKey)?;

    let token_data = decode::<TokenClaims>(raw, key, &signature_only())?;

    Ok(VerifiedToken {
        raw: raw.to_string(),
        header: token_data.header,
        claims: token_data.claims,
    })
}

/// Check `exp`, `nbf` and `iat` against the current time.
pub fn validate(claims: &TokenClaims, leeway: u64) -> Result<(), ValidationError> {
    validate_at(claims, chrono::Utc::now().timestamp(), leeway)
}

/// Check temporal claims against `now` (seconds since the epoch).
pub fn validate_at(claims: &TokenClaims, now: i64, leeway: u64) -> Result<(), ValidationError> {
    let leeway = i64::try_from(leeway).unwrap_or(i64::MAX);

    if let Some(exp) = claims.exp {
        if now >= exp.saturating_add(leeway) {
            return Err(ValidationError::Expired);
        }
    }
    if let Some(iat) = claims.iat {
        if now.saturating_add(leeway) < iat {
            return Err(ValidationError::IssuedInFuture);
        }
    }
    if let Some(nbf) = claims.nbf {
        if now.saturating_add(leeway) < nbf {
            return Err(ValidationError::NotYetValid);
        }
    }

    Ok(())
}

/// RS512 signature check with all claim validation switched off.
fn signature_only() -> Validation {
    let mut validation = Validation::new(TOKEN_ALGORITHM);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.leeway = 0;
    validation
}
