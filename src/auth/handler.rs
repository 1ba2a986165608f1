// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Protected handlers for Axum.
//!
//! [`Authenticator::protect`] wraps a work function into an Axum
//! [`Handler`]. The wrapper runs the authentication gates, hands the work
//! function the session, the caller's credential, the request and the route
//! parameters, and writes exactly one JSON body.
//!
//! ```rust,ignore
//! async fn whoami(
//!     session: Session,
//!     credential: UserQueryCredential,
//!     _request: Request,
//!     _params: RouteParams,
//! ) -> AuthResponse {
//!     AuthResponse::success(&credential, &session, "Session is active.")
//! }
//!
//! let app = Router::new().route("/v1/session", get(auth.protect(whoami)));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, RawPathParams, Request},
    handler::Handler,
    response::{IntoResponse, Response},
};

use super::form::parse_form;
use super::identity::UserQueryCredential;
use super::keys::KeyProvider;
use super::refresh::TokenRefresher;
use super::response::AuthResponse;
use super::token::{validate, verify_and_parse, Session};
use super::AuthError;

/// Path parameters of the matched route, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(String, String)>);

impl RouteParams {
    /// Value of the parameter called `name`.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&RawPathParams> for RouteParams {
    fn from(raw: &RawPathParams) -> Self {
        Self(
            raw.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }
}

/// Business operation run behind the authentication gates.
///
/// Implemented for every async fn / closure of the shape
/// `(Session, UserQueryCredential, Request, RouteParams) -> AuthResponse`.
pub trait AuthorizedWork: Clone + Send + Sync + 'static {
    type Future: Future<Output = AuthResponse> + Send + 'static;

    fn call(
        self,
        session: Session,
        credential: UserQueryCredential,
        request: Request,
        params: RouteParams,
    ) -> Self::Future;
}

impl<F, Fut> AuthorizedWork for F
where
    F: FnOnce(Session, UserQueryCredential, Request, RouteParams) -> Fut
        + Clone
        + Send
        + Sync
        + 'static,
    Fut: Future<Output = AuthResponse> + Send + 'static,
{
    type Future = Fut;

    fn call(
        self,
        session: Session,
        credential: UserQueryCredential,
        request: Request,
        params: RouteParams,
    ) -> Self::Future {
        self(session, credential, request, params)
    }
}

/// Shared authentication capabilities: the verification key source and
/// the token refresher.
#[derive(Clone)]
pub struct Authenticator {
    keys: Arc<dyn KeyProvider>,
    refresher: Arc<dyn TokenRefresher>,
    leeway: u64,
}

impl Authenticator {
    pub fn new(
        keys: impl KeyProvider + 'static,
        refresher: impl TokenRefresher + 'static,
    ) -> Self {
        Self::from_shared(Arc::new(keys), Arc::new(refresher))
    }

    pub fn from_shared(keys: Arc<dyn KeyProvider>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            keys,
            refresher,
            leeway: 0,
        }
    }

    /// Clock skew tolerance for `exp` / `nbf` / `iat`, in seconds.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn leeway(&self) -> u64 {
        self.leeway
    }

    /// Whether a verification key is loaded.
    pub fn has_verification_key(&self) -> bool {
        self.keys.verification_key().is_some()
    }

    /// Wrap `work` into a handler that enforces authentication.
    pub fn protect<W: AuthorizedWork>(&self, work: W) -> Protected<W> {
        Protected {
            auth: self.clone(),
            work,
        }
    }

    /// Run the gates in order: verify, validate, parse form, derive identity.
    pub async fn authenticate(
        &self,
        request: Request,
    ) -> Result<(Session, UserQueryCredential, Request), AuthError> {
        let token = verify_and_parse(request.headers(), self.keys.verification_key())?;
        validate(token.claims(), self.leeway)?;
        let request = parse_form(request).await?;
        let credential = UserQueryCredential::from_claims(token.claims())?;

        Ok((
            Session::new(token, Arc::clone(&self.refresher)),
            credential,
            request,
        ))
    }
}

/// A work function wrapped by [`Authenticator::protect`].
#[derive(Clone)]
pub struct Protected<W> {
    auth: Authenticator,
    work: W,
}

impl<W: AuthorizedWork> Protected<W> {
    async fn serve(self, request: Request) -> Response {
        let Protected { auth, work } = self;

        let (session, credential, request) = match auth.authenticate(request).await {
            Ok(authenticated) => authenticated,
            Err(err) => {
                err.log();
                return err.into_response();
            }
        };

        let (mut parts, body) = request.into_parts();
        let params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => RouteParams::from(&raw),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "No route parameters for protected request");
                RouteParams::default()
            }
        };
        let request = Request::from_parts(parts, body);

        let response = work.call(session, credential, request, params).await;
        if let AuthResponse::Failure { status, reason, .. } = &response {
            tracing::debug!(status = status.as_u16(), reason = %reason, "Protected work returned an error");
        }
        response.into_response()
    }
}

impl<W, S> Handler<(), S> for Protected<W>
where
    W: AuthorizedWork,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send>>;

    fn call(self, req: Request, _state: S) -> Self::Future {
        Box::pin(self.serve(req))
    }
}
