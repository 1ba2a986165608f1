// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::extract::Request;

use crate::auth::{AuthResponse, RouteParams, Session, UserQueryCredential};

/// `GET /v1/session`: echo the caller's credential with a fresh token.
pub async fn current_session(
    session: Session,
    credential: UserQueryCredential,
    _request: Request,
    _params: RouteParams,
) -> AuthResponse {
    AuthResponse::success(&credential, &session, "Your session is active.")
}
