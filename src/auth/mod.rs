// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for protected handlers.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>` (RS512-signed)
//! 2. [`Protected`] runs the gates in order, stopping at the first failure:
//!    - verify the signature against the first key of the key set
//!    - validate `exp` / `nbf` / `iat`
//!    - parse query and url-encoded form parameters
//!    - derive the [`UserQueryCredential`] (`phone` before `email`)
//! 3. The wrapped work function runs and returns an [`AuthResponse`]
//! 4. [`AuthResponse::success`] reissues the token with a fresh expiry
//!
//! Every outcome, accepted or rejected, is a single JSON body in the
//! legacy `IsError` / `TokenValid` / `NewToken` layout.

pub mod error;
pub mod form;
pub mod handler;
pub mod identity;
pub mod keys;
pub mod refresh;
pub mod response;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AuthError;
pub use form::FormParams;
pub use handler::{Authenticator, AuthorizedWork, Protected, RouteParams};
pub use identity::{CredentialKind, UserQueryCredential};
pub use keys::{KeyProvider, PublicKeySet};
pub use refresh::{RsaTokenIssuer, TokenRefresher};
pub use response::AuthResponse;
pub use token::{Session, TokenClaims, VerifiedToken};
