// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for auth tests.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use jsonwebtoken::{encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::Value;

use super::handler::Authenticator;
use super::keys::PublicKeySet;
use super::refresh::{RefreshError, RsaTokenIssuer, TokenRefresher};
use super::token::{verify_and_parse, Session, TokenClaims, VerifiedToken};

pub const PRIMARY_PRIVATE_PEM: &str = include_str!("../../testdata/primary-private.pem");
pub const PRIMARY_PUBLIC_PEM: &str = include_str!("../../testdata/primary-public.pem");
pub const PRIMARY_JWKS: &str = include_str!("../../testdata/primary-jwks.json");
pub const ROGUE_PRIVATE_PEM: &str = include_str!("../../testdata/rogue-private.pem");

/// Display text of the error returned by [`FailingRefresher`].
pub const REFRESH_FAILURE: &str = "failed to sign refreshed token: Signing failed: signer offline";

/// Refresher that always fails.
pub struct FailingRefresher;

impl TokenRefresher for FailingRefresher {
    fn refresh(&self, _token: &VerifiedToken) -> Result<String, RefreshError> {
        Err(RefreshError::Signing(
            ErrorKind::Signing("signer offline".to_string()).into(),
        ))
    }
}

pub fn decoding_key() -> DecodingKey {
    DecodingKey::from_rsa_pem(PRIMARY_PUBLIC_PEM.as_bytes()).unwrap()
}

pub fn key_set() -> PublicKeySet {
    PublicKeySet::new(vec![decoding_key()])
}

pub fn issuer() -> RsaTokenIssuer {
    RsaTokenIssuer::from_rsa_pem(PRIMARY_PRIVATE_PEM.as_bytes()).unwrap()
}

pub fn authenticator() -> Authenticator {
    Authenticator::new(key_set(), issuer())
}

pub fn failing_authenticator() -> Authenticator {
    Authenticator::new(key_set(), FailingRefresher)
}

pub fn claims(value: Value) -> TokenClaims {
    serde_json::from_value(value).unwrap()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn in_an_hour() -> i64 {
    now() + 3600
}

pub fn sign_with_algorithm(alg: Algorithm, claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(PRIMARY_PRIVATE_PEM.as_bytes()).unwrap();
    encode(&Header::new(alg), claims, &key).unwrap()
}

/// RS512 token signed with the primary key.
pub fn sign(claims: &Value) -> String {
    sign_with_algorithm(Algorithm::RS512, claims)
}

/// RS512 token signed with a key outside the key set.
pub fn sign_with_rogue(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(ROGUE_PRIVATE_PEM.as_bytes()).unwrap();
    encode(&Header::new(Algorithm::RS512), claims, &key).unwrap()
}

pub fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

fn verified(claims: &Value) -> VerifiedToken {
    verify_and_parse(&bearer(&sign(claims)), Some(&decoding_key())).unwrap()
}

/// Session for `claims` backed by the primary issuer.
pub fn session(claims: Value) -> Session {
    Session::new(verified(&claims), Arc::new(issuer()))
}

/// Session whose refresh always fails.
pub fn failing_session(claims: Value) -> Session {
    Session::new(verified(&claims), Arc::new(FailingRefresher))
}
