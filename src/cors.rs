// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cross-origin policy.
//!
//! [`handle_cors`] wraps a router in the service-wide policy: any origin,
//! credentials allowed, `Content-Type` and `Authorization` headers, and the
//! `GET`, `POST` and `PATCH` methods. Preflight requests are answered by the
//! layer and never reach a handler.

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    Router,
};
use tower_http::cors::{AllowCredentials, AllowOrigin, CorsLayer};

const ANY_ORIGIN: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    pub allowed_headers: Vec<HeaderName>,
    pub allowed_methods: Vec<Method>,
    /// Log the installed policy.
    pub debug: bool,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: vec![ANY_ORIGIN.to_string()],
            allow_credentials: true,
            allowed_headers: vec![CONTENT_TYPE, AUTHORIZATION],
            allowed_methods: vec![Method::GET, Method::POST, Method::PATCH],
            debug: false,
        }
    }
}

impl CorsPolicy {
    fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == ANY_ORIGIN)
    }

    /// Build the tower-http layer enforcing this policy.
    pub fn layer(&self) -> CorsLayer {
        let origin = if self.allows_any_origin() {
            AllowOrigin::any()
        } else {
            let origins: Vec<HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        let mut layer = CorsLayer::new()
            .allow_origin(origin)
            .allow_headers(self.allowed_headers.clone())
            .allow_methods(self.allowed_methods.clone());

        if self.allow_credentials {
            // tower-http refuses a literal `true` next to a wildcard origin,
            // a predicate is accepted and still emits the header.
            layer = if self.allows_any_origin() {
                layer.allow_credentials(AllowCredentials::predicate(|_, _| true))
            } else {
                layer.allow_credentials(true)
            };
        }

        if self.debug {
            tracing::debug!(
                origins = ?self.allowed_origins,
                credentials = self.allow_credentials,
                headers = ?self.allowed_headers,
                methods = ?self.allowed_methods,
                "CORS policy installed"
            );
        }

        layer
    }
}

/// Wrap `router` in the default [`CorsPolicy`].
pub fn handle_cors<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(CorsPolicy::default().layer())
}
