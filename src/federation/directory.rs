// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Collaborators the federation flow relies on.
//!
//! Provider catalogue, user persistence, authority lookup and session
//! establishment live outside this crate; they are reached through these
//! traits. `crate::store` has in-memory implementations.

use async_trait::async_trait;
use axum::response::Response;

use super::provider::{IdentityProviderDescriptor, OrganizationScope};
use crate::auth::Principal;

/// Collaborator failure.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user profile is invalid: {0}")]
    InvalidProfile(String),

    #[error("directory backend failed: {0}")]
    Backend(String),
}

/// Local user created or refreshed from a provider profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Tokens obtained from the provider. Used once to finish the exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct ExchangeResult {
    pub access_token: String,
    pub id_token: Option<String>,
    pub state: Option<String>,
}

impl std::fmt::Debug for ExchangeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeResult")
            .field("access_token", &"<redacted>")
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("state", &self.state)
            .finish()
    }
}

/// Identity provider catalogue.
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    /// Find an active provider for the organization.
    async fn find_provider(
        &self,
        provider_id: &str,
        scope: &OrganizationScope,
    ) -> Result<Option<IdentityProviderDescriptor>, DirectoryError>;
}

/// Local user store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create the local user for a provider profile, or refresh it.
    async fn create_or_update_from_profile(
        &self,
        provider: &IdentityProviderDescriptor,
        profile: &str,
    ) -> Result<UserRecord, DirectoryError>;

    /// Authorities currently granted to a local user.
    async fn authorities_for_user(&self, user_id: &str) -> Result<Vec<String>, DirectoryError>;
}

/// Turns a federated principal into the client's session response.
#[async_trait]
pub trait SessionEstablisher: Send + Sync {
    async fn establish(
        &self,
        principal: &Principal,
        exchange: &ExchangeResult,
    ) -> Result<Response, DirectoryError>;
}
