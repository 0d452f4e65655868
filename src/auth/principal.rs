// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authenticated principal and its binding to the request.
//!
//! Both authentication paths (token gate and provider federation) end here,
//! so downstream handlers see one identity shape whichever path produced it.

use std::collections::HashSet;

use axum::http::Extensions;
use serde::Serialize;
use utoipa::ToSchema;

use super::claims::ClaimSet;
use super::AuthError;
use crate::federation::UserRecord;

/// Who is making the current request.
///
/// Lives in the request extensions for the duration of one request and is
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    /// Canonical user ID (token `sub` claim or directory user ID)
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Granted authorities, in the order they were issued
    pub authorities: Vec<String>,
}

impl Principal {
    /// Build from verified token claims.
    pub fn from_claims(claims: &ClaimSet) -> Result<Self, AuthError> {
        let id = claims.subject()?.to_string();
        let authorities = claims.to_authorities()?;

        Ok(Self {
            id,
            email: claims.email.clone(),
            first_name: claims.firstname.clone(),
            last_name: claims.lastname.clone(),
            authorities,
        })
    }

    /// Build from a directory user and the authorities granted to it.
    pub fn from_user(user: &UserRecord, authorities: Vec<String>) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            authorities,
        }
    }

    /// Check whether the principal holds the given authority.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|granted| granted == authority)
    }

    /// Fail with `InsufficientPermissions` unless the authority is held.
    pub fn require_authority(&self, authority: &str) -> Result<(), AuthError> {
        if self.has_authority(authority) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }

    /// Authorities as an unordered set, for authorization decisions.
    pub fn authority_set(&self) -> HashSet<&str> {
        self.authorities.iter().map(String::as_str).collect()
    }
}

/// Publish the principal into the request-scoped context.
pub fn bind(extensions: &mut Extensions, principal: Principal) {
    extensions.insert(principal);
}

/// The principal bound to this request, if any.
pub fn current(extensions: &Extensions) -> Option<&Principal> {
    extensions.get::<Principal>()
}
