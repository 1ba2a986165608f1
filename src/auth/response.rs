// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Response body for protected handlers.
//!
//! Internally a sum type; on the wire it flattens to the legacy record so
//! existing clients keep parsing `IsError`, `TokenValid`, `NewToken` etc.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::token::Session;

/// Shown when the refreshed token could not be issued.
pub const SESSION_MAINTENANCE_FAILED: &str =
    "Failed to maintain your session. Please contact us directly to resolve this issue.";

/// Shown for server-side failures that are not the caller's fault.
pub const REQUEST_FAILED: &str = "Something went wrong while we were trying to fulfil your request. Please contact us directly to resolve this issue.";

/// Outcome of a protected handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResponse {
    /// The work succeeded and the caller received a fresh token.
    Success {
        new_token: String,
        data: Option<Value>,
        user_message: String,
    },
    /// Authentication or the work itself failed.
    Failure {
        token_valid: bool,
        token_expired: bool,
        status: StatusCode,
        /// Developer-facing, logged server-side.
        reason: String,
        /// Safe to display to the end user.
        user_message: String,
    },
}

impl AuthResponse {
    /// Build a success response, reissuing the session's token.
    ///
    /// If the refresh fails the work result is discarded and a 500 failure
    /// is returned instead. `()` (or anything serializing to `null`) leaves
    /// `Data` off the wire.
    pub fn success<T>(data: &T, session: &Session, user_message: impl Into<String>) -> Self
    where
        T: Serialize + ?Sized,
    {
        let data = match serde_json::to_value(data) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize protected handler payload");
                return Self::failure(
                    true,
                    false,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to serialize response data: {e}"),
                    REQUEST_FAILED,
                );
            }
        };

        match session.refresh() {
            Ok(new_token) => AuthResponse::Success {
                new_token,
                data,
                user_message: user_message.into(),
            },
            Err(e) => {
                tracing::error!(error = %e, "Token refresh failed on success path");
                Self::failure(
                    true,
                    true,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    e.to_string(),
                    SESSION_MAINTENANCE_FAILED,
                )
            }
        }
    }

    /// Build a failure response.
    pub fn failure(
        token_valid: bool,
        token_expired: bool,
        status: StatusCode,
        reason: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        AuthResponse::Failure {
            token_valid,
            token_expired,
            status,
            reason: reason.into(),
            user_message: user_message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AuthResponse::Failure { .. })
    }

    /// HTTP status carried by the response (200 for successes).
    pub fn status(&self) -> StatusCode {
        match self {
            AuthResponse::Success { .. } => StatusCode::OK,
            AuthResponse::Failure { status, .. } => *status,
        }
    }

    pub fn token_valid(&self) -> bool {
        match self {
            AuthResponse::Success { .. } => true,
            AuthResponse::Failure { token_valid, .. } => *token_valid,
        }
    }

    pub fn token_expired(&self) -> bool {
        match self {
            AuthResponse::Success { .. } => false,
            AuthResponse::Failure { token_expired, .. } => *token_expired,
        }
    }

    pub fn new_token(&self) -> Option<&str> {
        match self {
            AuthResponse::Success { new_token, .. } => Some(new_token),
            AuthResponse::Failure { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            AuthResponse::Success { data, .. } => data.as_ref(),
            AuthResponse::Failure { .. } => None,
        }
    }

    /// Empty for successes.
    pub fn reason(&self) -> &str {
        match self {
            AuthResponse::Success { .. } => "",
            AuthResponse::Failure { reason, .. } => reason,
        }
    }

    pub fn user_message(&self) -> &str {
        match self {
            AuthResponse::Success { user_message, .. }
            | AuthResponse::Failure { user_message, .. } => user_message,
        }
    }
}

/// Legacy wire layout. Field order is part of the contract.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireResponse<'a> {
    is_error: bool,
    token_valid: bool,
    token_expired: bool,
    new_token: Option<&'a str>,
    http_status_code: u16,
    http_status_message: &'a str,
    reason: &'a str,
    user_friendly_message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

impl Serialize for AuthResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let status = self.status();
        WireResponse {
            is_error: self.is_error(),
            token_valid: self.token_valid(),
            token_expired: self.token_expired(),
            new_token: self.new_token(),
            http_status_code: status.as_u16(),
            http_status_message: status.canonical_reason().unwrap_or(""),
            reason: self.reason(),
            user_friendly_message: self.user_message(),
            data: self.data(),
        }
        .serialize(serializer)
    }
}

impl IntoResponse for AuthResponse {
    fn into_response(self) -> Response {
        match self {
            AuthResponse::Success { .. } => Json(self).into_response(),
            AuthResponse::Failure { status, .. } => (status, Json(self)).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing;
    use axum::body::to_bytes;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::json;

    #[test]
    fn failure_serializes_legacy_layout_in_order() {
        let response = AuthResponse::failure(
            false,
            true,
            StatusCode::UNAUTHORIZED,
            "expired",
            "Please sign in again.",
        );

        let body = serde_json::to_string(&response).unwrap();
        assert_eq!(
            body,
            r#"{"IsError":true,"TokenValid":false,"TokenExpired":true,"NewToken":null,"HttpStatusCode":401,"HttpStatusMessage":"Unauthorized","Reason":"expired","UserFriendlyMessage":"Please sign in again."}"#
        );
    }

    #[test]
    fn status_message_is_canonical_phrase() {
        for code in [200u16, 400, 401, 403, 404, 500, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            let response = AuthResponse::failure(true, false, status, "r", "m");
            let value = serde_json::to_value(&response).unwrap();
            assert_eq!(value["HttpStatusCode"], code);
            assert_eq!(
                value["HttpStatusMessage"],
                status.canonical_reason().unwrap()
            );
        }
    }

    #[test]
    fn unknown_status_has_empty_phrase() {
        let status = StatusCode::from_u16(599).unwrap();
        let value = serde_json::to_value(AuthResponse::failure(true, false, status, "r", "m")).unwrap();
        assert_eq!(value["HttpStatusMessage"], "");
    }

    #[test]
    fn success_refreshes_token_and_satisfies_invariants() {
        let session = testing::session(json!({"phone": "+15550101"}));
        let response = AuthResponse::success(&(), &session, "Done.");

        assert!(!response.is_error());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["IsError"], false);
        assert_eq!(value["TokenValid"], true);
        assert_eq!(value["TokenExpired"], false);
        assert!(value["NewToken"].is_string());
        assert_eq!(value["HttpStatusCode"], 200);
        assert_eq!(value["HttpStatusMessage"], "OK");
        assert_eq!(value["Reason"], "");
        assert_eq!(value["UserFriendlyMessage"], "Done.");
        assert!(value.get("Data").is_none());
    }

    #[test]
    fn success_embeds_data() {
        let session = testing::session(json!({"email": "a@b"}));
        let response = AuthResponse::success(&json!({"count": 3}), &session, "ok");
        assert_eq!(response.data(), Some(&json!({"count": 3})));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["Data"]["count"], 3);
    }

    #[test]
    fn success_degrades_when_refresh_fails() {
        let session = testing::failing_session(json!({"phone": "+15550101"}));
        let response = AuthResponse::success(&json!({"ignored": true}), &session, "Done.");

        assert!(response.is_error());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.token_valid());
        assert!(response.token_expired());
        assert_eq!(response.new_token(), None);
        assert_eq!(response.data(), None);
        assert_eq!(response.reason(), testing::REFRESH_FAILURE);
        assert_eq!(response.user_message(), SESSION_MAINTENANCE_FAILED);
    }

    #[tokio::test]
    async fn failure_into_response_uses_its_status() {
        let response = AuthResponse::failure(
            true,
            false,
            StatusCode::NOT_FOUND,
            "no such note",
            "Not found.",
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["HttpStatusCode"], 404);
        assert_eq!(body["IsError"], true);
    }

    #[tokio::test]
    async fn success_into_response_is_200_json() {
        let session = testing::session(json!({"phone": "+15550101"}));
        let response = AuthResponse::success(&(), &session, "ok").into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }
}
