// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! One variant per gate of the protected-handler pipeline. Each maps onto a
//! fixed [`AuthResponse`] shape: status, token flags, reason and the message
//! shown to the user.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::form::FormError;
use super::identity::MissingIdentity;
use super::response::{AuthResponse, REQUEST_FAILED};
use super::token::{ValidationError, VerifyError};

/// Shown whenever the bearer token is rejected.
pub const AUTHORISATION_FAILED: &str =
    "Authorisation failed. Your session could not be authenticated.";

const VERIFICATION_REASON: &str = "Token failed verification with public key.";
const VALIDATION_REASON: &str = "Token passed verification with public key BUT failed validation! ";
const FORM_REASON: &str = "Failed to parse form parameters: ";

/// Failure of one of the authentication gates.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token verification failed: {0}")]
    Verification(#[from] VerifyError),
    #[error("token validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("form parsing failed: {0}")]
    Form(#[from] FormError),
    #[error(transparent)]
    Identity(#[from] MissingIdentity),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Verification(_) => "token_verification_failed",
            AuthError::Validation(ValidationError::Expired) => "token_expired",
            AuthError::Validation(_) => "token_validation_failed",
            AuthError::Form(_) => "form_parse_failed",
            AuthError::Identity(_) => "missing_identity",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Verification(_) | AuthError::Validation(_) => StatusCode::UNAUTHORIZED,
            AuthError::Form(_) | AuthError::Identity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Developer-facing reason placed in the response body.
    pub fn reason(&self) -> String {
        match self {
            AuthError::Verification(_) => VERIFICATION_REASON.to_string(),
            AuthError::Validation(e) => format!("{VALIDATION_REASON}{e}"),
            AuthError::Form(e) => format!("{FORM_REASON}{e}"),
            AuthError::Identity(e) => e.to_string(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::Verification(_) | AuthError::Validation(_) => AUTHORISATION_FAILED,
            AuthError::Form(_) | AuthError::Identity(_) => REQUEST_FAILED,
        }
    }

    /// `(token_valid, token_expired)` reported for this failure.
    ///
    /// Form failures report an expired token for compatibility with
    /// existing clients.
    fn token_flags(&self) -> (bool, bool) {
        match self {
            AuthError::Verification(_) => (false, false),
            AuthError::Validation(e) => (false, *e == ValidationError::Expired),
            AuthError::Form(_) => (true, true),
            AuthError::Identity(_) => (true, false),
        }
    }

    /// Emit the single log line for this failure.
    pub(crate) fn log(&self) {
        match self {
            AuthError::Identity(_) => {
                tracing::error!(error_code = self.error_code(), error = %self, "Authenticated request rejected");
            }
            _ => {
                tracing::warn!(error_code = self.error_code(), error = %self, "Authenticated request rejected");
            }
        }
    }
}

impl From<AuthError> for AuthResponse {
    fn from(err: AuthError) -> Self {
        let (token_valid, token_expired) = err.token_flags();
        AuthResponse::failure(
            token_valid,
            token_expired,
            err.status_code(),
            err.reason(),
            err.user_message(),
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AuthResponse::from(self).into_response()
    }
}
