// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::Request, http::StatusCode};
use serde::Serialize;

use crate::auth::{AuthResponse, FormParams, RouteParams, Session, UserQueryCredential};

#[derive(Debug, Serialize)]
pub struct Note {
    pub topic: String,
    pub text: String,
    pub owner: UserQueryCredential,
}

/// `POST /v1/notes/{topic}`: accept a note posted as form field `text`.
pub async fn create_note(
    session: Session,
    credential: UserQueryCredential,
    request: Request,
    params: RouteParams,
) -> AuthResponse {
    let text = request
        .extensions()
        .get::<FormParams>()
        .and_then(|form| form.get("text"))
        .filter(|text| !text.trim().is_empty());

    let Some(text) = text else {
        return AuthResponse::failure(
            true,
            false,
            StatusCode::BAD_REQUEST,
            "missing form parameter `text`",
            "Please enter some text for your note.",
        );
    };

    let note = Note {
        topic: params.by_name("topic").unwrap_or_default().to_string(),
        text: text.to_string(),
        owner: credential,
    };

    tracing::info!(topic = %note.topic, owner = %note.owner.kind, "Note created");
    AuthResponse::success(&note, &session, "Your note was saved.")
}
