// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Query and url-encoded form parameters.
//!
//! Parsed once by the protected handler and stored in the request
//! extensions, so work functions read them with
//! `request.extensions().get::<FormParams>()`.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header::CONTENT_TYPE, Method},
};

/// Upper bound on a url-encoded request body (10 MiB).
pub const MAX_FORM_BYTES: usize = 10 << 20;

/// Decoded form parameters in request order: body first, then query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams(Vec<(String, String)>);

impl FormParams {
    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All values for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("invalid semicolon separator in query")]
    Semicolon,
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),
    #[error("failed to read request body: {0}")]
    Body(String),
    #[error("invalid Content-Type header: {0}")]
    ContentType(String),
}

/// Parse query and form parameters, attaching them to the request.
///
/// The body is only consumed for `POST`/`PUT`/`PATCH` url-encoded requests;
/// it is put back afterwards so the work function can still read it.
pub async fn parse_form(request: Request) -> Result<Request, FormError> {
    let (mut parts, body) = request.into_parts();

    let mut params = Vec::new();

    let body = if carries_form_body(&parts.method, &parts.headers)? {
        let bytes = to_bytes(body, MAX_FORM_BYTES)
            .await
            .map_err(|e| FormError::Body(e.to_string()))?;
        parse_into(&bytes, &mut params)?;
        Body::from(bytes)
    } else {
        body
    };

    if let Some(query) = parts.uri.query() {
        parse_into(query.as_bytes(), &mut params)?;
    }

    parts.extensions.insert(FormParams(params));
    Ok(Request::from_parts(parts, body))
}

/// Whether the body is url-encoded form data.
///
/// A missing or empty `Content-Type` means no form body; a malformed one on
/// a method that carries a body is an error.
fn carries_form_body(method: &Method, headers: &axum::http::HeaderMap) -> Result<bool, FormError> {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return Ok(false);
    }

    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Ok(false);
    };
    let raw = value
        .to_str()
        .map_err(|_| FormError::ContentType("header is not visible ASCII".to_string()))?;
    if raw.trim().is_empty() {
        return Ok(false);
    }

    let media: mime::Mime = raw
        .parse()
        .map_err(|e: mime::FromStrError| FormError::ContentType(e.to_string()))?;
    Ok(media
        .essence_str()
        .eq_ignore_ascii_case(mime::APPLICATION_WWW_FORM_URLENCODED.essence_str()))
}

fn parse_into(input: &[u8], params: &mut Vec<(String, String)>) -> Result<(), FormError> {
    if input.contains(&b';') {
        return Err(FormError::Semicolon);
    }
    check_escapes(input)?;

    params.extend(
        url::form_urlencoded::parse(input).map(|(key, value)| (key.into_owned(), value.into_owned())),
    );
    Ok(())
}

/// Every `%` must be followed by two hex digits.
fn check_escapes(input: &[u8]) -> Result<(), FormError> {
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' {
            let escape = input.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                let end = (i + 3).min(input.len());
                return Err(FormError::InvalidEscape(
                    String::from_utf8_lossy(&input[i..end]).into_owned(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
