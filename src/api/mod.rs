// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{cors::handle_cors, state::AppState};

pub mod health;
pub mod notes;
pub mod session;

pub fn router(state: AppState) -> Router {
    let auth = state.auth.clone();

    let v1_routes = Router::new()
        .route("/session", get(auth.protect(session::current_session)))
        .route("/notes/{topic}", post(auth.protect(notes::create_note)));

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .with_state(state);

    handle_cors(app)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{testing, Authenticator, PublicKeySet};
    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::{
            header::{
                ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION,
                CONTENT_TYPE, ORIGIN,
            },
            Method, StatusCode,
        },
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(testing::authenticator()))
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn authorized(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let _ = app().into_make_service();
    }

    #[tokio::test]
    async fn health_reports_loaded_keys() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body, json!({"status": "ok", "checks": {"service": "ok", "keys": "ok"}}));
    }

    #[tokio::test]
    async fn health_degrades_without_keys() {
        let auth = Authenticator::new(PublicKeySet::default(), testing::issuer());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = router(AppState::new(auth)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["keys"], "missing");
    }

    #[tokio::test]
    async fn liveness_is_unauthenticated() {
        let request = Request::builder().uri("/health/live").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn session_returns_credential_and_new_token() {
        let token = testing::sign(&json!({
            "phone": "+15550101",
            "email": "a@b",
            "exp": testing::in_an_hour(),
        }));
        let request = authorized(Method::GET, "/v1/session", &token)
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = json_body(response).await;
        assert_eq!(body["IsError"], false);
        assert_eq!(body["Data"], json!({"kind": "phone", "value": "+15550101"}));
        assert!(body["NewToken"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(body["UserFriendlyMessage"], "Your session is active.");
    }

    #[tokio::test]
    async fn session_without_token_is_unauthorized() {
        let request = Request::builder()
            .uri("/v1/session")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(json_body(response).await["TokenValid"], false);
    }

    #[tokio::test]
    async fn note_is_created_from_form_body() {
        let token = testing::sign(&json!({"email": "a@b", "exp": testing::in_an_hour()}));
        let request = authorized(Method::POST, "/v1/notes/rust", &token)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("text=borrow+checker"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(
            body["Data"],
            json!({
                "topic": "rust",
                "text": "borrow checker",
                "owner": {"kind": "email", "value": "a@b"},
            })
        );
    }

    #[tokio::test]
    async fn note_without_text_is_a_bad_request() {
        let token = testing::sign(&json!({"email": "a@b", "exp": testing::in_an_hour()}));
        let request = authorized(Method::POST, "/v1/notes/rust", &token)
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["IsError"], true);
        assert_eq!(body["TokenValid"], true);
        assert_eq!(body["TokenExpired"], false);
        assert_eq!(body["HttpStatusMessage"], "Bad Request");
        assert_eq!(body["NewToken"], Value::Null);
    }

    #[tokio::test]
    async fn preflight_never_reaches_protected_routes() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/v1/notes/rust")
            .header(ORIGIN, "https://app.example.com")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
