// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::auth::keys::KeyError;
use crate::auth::refresh::RefreshError;
use crate::config::ConfigError;

/// Errors that stop the server from starting or keep it from serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to load verification keys: {0}")]
    Keys(#[from] KeyError),
    #[error("failed to load signing key: {0}")]
    Signing(#[from] RefreshError),
    #[error("failed to install TLS crypto provider")]
    CryptoProvider,
    #[error("failed to load TLS certificate or key: {0}")]
    Tls(#[source] std::io::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
