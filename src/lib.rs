// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token Gate - bearer-token authentication for axum services
//!
//! Wraps request handlers in an RS512 JWT pipeline and reissues the caller's
//! token on every successful response.
//!
//! ## Modules
//!
//! - `auth` - Token verification, validation, identity and refresh
//! - `cors` - Service-wide cross-origin policy
//! - `api` - HTTP routes (Axum)
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod state;
pub mod telemetry;
