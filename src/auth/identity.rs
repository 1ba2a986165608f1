// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mapping token claims to the credential used to look a user up.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::TokenClaims;

/// Claim that identifies the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Phone,
    Email,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Phone => "phone",
            CredentialKind::Email => "email",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims consulted for identity, highest precedence first.
const IDENTITY_PRECEDENCE: &[(CredentialKind, &str)] = &[
    (CredentialKind::Phone, "phone"),
    (CredentialKind::Email, "email"),
];

/// `(kind, value)` pair used downstream to find the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQueryCredential {
    pub kind: CredentialKind,
    pub value: String,
}

/// The token carried none of the identity claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Token contains neither phone nor email")]
pub struct MissingIdentity;

impl UserQueryCredential {
    /// First non-empty string claim from the precedence table.
    ///
    /// Token issuance is expected to always set one of them.
    pub fn from_claims(claims: &TokenClaims) -> Result<Self, MissingIdentity> {
        IDENTITY_PRECEDENCE
            .iter()
            .find_map(|(kind, claim)| {
                claims
                    .get_str(claim)
                    .filter(|value| !value.is_empty())
                    .map(|value| UserQueryCredential {
                        kind: *kind,
                        value: value.to_string(),
                    })
            })
            .ok_or(MissingIdentity)
    }
}
