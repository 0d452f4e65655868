// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory collaborators for the federation flow.
//!
//! Used by the standalone binary and by tests. A deployment backed by the
//! management API's persistence layer provides its own implementations of
//! the `federation::directory` traits.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;
use crate::federation::{
    DirectoryError, ExchangeResult, IdentityProviderDescriptor, OrganizationScope,
    ProviderDirectory, SessionEstablisher, UserDirectory, UserRecord,
};

/// Authority granted to users created on their first federated login.
pub const DEFAULT_USER_AUTHORITY: &str = "ORGANIZATION:USER";

struct StoredUser {
    record: UserRecord,
    authorities: Vec<String>,
}

#[derive(Default)]
struct DirectoryData {
    providers: HashMap<(OrganizationScope, String), IdentityProviderDescriptor>,
    users: HashMap<String, StoredUser>,
    /// (provider ID, provider subject) → local user ID
    external_ids: HashMap<(String, String), String>,
}

/// Provider catalogue and user store kept in process memory.
pub struct InMemoryDirectory {
    data: RwLock<DirectoryData>,
    default_authorities: Vec<String>,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(DirectoryData::default()),
            default_authorities: vec![DEFAULT_USER_AUTHORITY.to_string()],
        }
    }

    /// Register providers for an organization.
    pub fn with_providers(
        mut self,
        scope: &OrganizationScope,
        providers: impl IntoIterator<Item = IdentityProviderDescriptor>,
    ) -> Self {
        let data = self.data.get_mut();
        for provider in providers {
            data.providers
                .insert((scope.clone(), provider.id.clone()), provider);
        }
        self
    }

    /// Authorities given to newly created users.
    pub fn with_default_authorities<I, S>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_authorities = authorities.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the authorities of an existing user.
    pub async fn grant_authorities(
        &self,
        user_id: &str,
        authorities: Vec<String>,
    ) -> Result<(), DirectoryError> {
        let mut data = self.data.write().await;
        let user = data
            .users
            .get_mut(user_id)
            .ok_or_else(|| DirectoryError::Backend(format!("unknown user `{user_id}`")))?;
        user.authorities = authorities;
        Ok(())
    }

    pub async fn user_count(&self) -> usize {
        self.data.read().await.users.len()
    }
}

/// Fields read from a provider user-info document.
#[derive(Debug, Deserialize)]
struct ProviderProfile {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
}

impl ProviderProfile {
    fn parse(profile: &str) -> Result<Self, DirectoryError> {
        serde_json::from_str(profile).map_err(|e| DirectoryError::InvalidProfile(e.to_string()))
    }

    /// Provider-side user identifier (`sub`, or `id` for OAuth2-only providers).
    fn subject(&self) -> Result<String, DirectoryError> {
        let raw = self.sub.as_ref().or(self.id.as_ref());
        match raw {
            Some(Value::String(subject)) if !subject.is_empty() => Ok(subject.clone()),
            Some(Value::Number(subject)) => Ok(subject.to_string()),
            _ => Err(DirectoryError::InvalidProfile(
                "profile has no `sub` or `id`".to_string(),
            )),
        }
    }

    fn first_name(&self) -> Option<&str> {
        self.given_name.as_deref().or(self.firstname.as_deref())
    }

    fn last_name(&self) -> Option<&str> {
        self.family_name.as_deref().or(self.lastname.as_deref())
    }
}

#[async_trait]
impl ProviderDirectory for InMemoryDirectory {
    async fn find_provider(
        &self,
        provider_id: &str,
        scope: &OrganizationScope,
    ) -> Result<Option<IdentityProviderDescriptor>, DirectoryError> {
        let data = self.data.read().await;
        Ok(data
            .providers
            .get(&(scope.clone(), provider_id.to_string()))
            .cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn create_or_update_from_profile(
        &self,
        provider: &IdentityProviderDescriptor,
        profile: &str,
    ) -> Result<UserRecord, DirectoryError> {
        let profile = ProviderProfile::parse(profile)?;
        let external_key = (provider.id.clone(), profile.subject()?);

        let mut data = self.data.write().await;
        let existing = data.external_ids.get(&external_key).cloned();

        let user_id = match existing {
            Some(user_id) => user_id,
            None => {
                let user_id = Uuid::new_v4().to_string();
                data.external_ids.insert(external_key, user_id.clone());
                data.users.insert(
                    user_id.clone(),
                    StoredUser {
                        record: UserRecord {
                            id: user_id.clone(),
                            email: String::new(),
                            first_name: String::new(),
                            last_name: String::new(),
                        },
                        authorities: self.default_authorities.clone(),
                    },
                );
                user_id
            }
        };

        let user = data
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DirectoryError::Backend(format!("user `{user_id}` vanished")))?;
        if let Some(email) = &profile.email {
            user.record.email = email.clone();
        }
        if let Some(first_name) = profile.first_name() {
            user.record.first_name = first_name.to_string();
        }
        if let Some(last_name) = profile.last_name() {
            user.record.last_name = last_name.to_string();
        }
        Ok(user.record.clone())
    }

    async fn authorities_for_user(&self, user_id: &str) -> Result<Vec<String>, DirectoryError> {
        let data = self.data.read().await;
        Ok(data
            .users
            .get(user_id)
            .map(|user| user.authorities.clone())
            .unwrap_or_default())
    }
}

/// Session summary returned by [`JsonSessionEstablisher`].
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub principal: Principal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Answers a successful federation with a JSON summary of the principal.
#[derive(Debug, Default, Clone)]
pub struct JsonSessionEstablisher;

#[async_trait]
impl SessionEstablisher for JsonSessionEstablisher {
    async fn establish(
        &self,
        principal: &Principal,
        exchange: &ExchangeResult,
    ) -> Result<Response, DirectoryError> {
        Ok(Json(SessionSummary {
            principal: principal.clone(),
            state: exchange.state.clone(),
        })
        .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(id: &str) -> IdentityProviderDescriptor {
        IdentityProviderDescriptor {
            id: id.to_string(),
            token_endpoint: "https://idp/token".to_string(),
            token_introspection_endpoint: None,
            user_info_endpoint: "https://idp/userinfo".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            authorization_header: "Bearer %s".to_string(),
        }
    }

    #[tokio::test]
    async fn providers_are_scoped_by_organization() {
        let scope = OrganizationScope::default();
        let directory = InMemoryDirectory::new().with_providers(&scope, [provider("github")]);

        assert!(directory.find_provider("github", &scope).await.unwrap().is_some());
        assert!(directory
            .find_provider("github", &OrganizationScope::new("OTHER"))
            .await
            .unwrap()
            .is_none());
        assert!(directory.find_provider("gitlab", &scope).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_login_creates_user_with_default_authorities() {
        let directory = InMemoryDirectory::new();
        let user = directory
            .create_or_update_from_profile(
                &provider("oidc"),
                r#"{"sub":"abc","email":"jane@example.com","given_name":"Jane","family_name":"Doe"}"#,
            )
            .await
            .unwrap();

        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.last_name, "Doe");
        assert_eq!(
            directory.authorities_for_user(&user.id).await.unwrap(),
            vec![DEFAULT_USER_AUTHORITY]
        );
    }

    #[tokio::test]
    async fn later_logins_update_the_same_user() {
        let directory = InMemoryDirectory::new();
        let first = directory
            .create_or_update_from_profile(&provider("github"), r#"{"id":42,"email":"old@example.com"}"#)
            .await
            .unwrap();
        let second = directory
            .create_or_update_from_profile(&provider("github"), r#"{"id":42,"email":"new@example.com"}"#)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "new@example.com");
        assert_eq!(directory.user_count().await, 1);
    }

    #[tokio::test]
    async fn same_subject_on_other_provider_is_another_user() {
        let directory = InMemoryDirectory::new();
        let a = directory
            .create_or_update_from_profile(&provider("a"), r#"{"sub":"1"}"#)
            .await
            .unwrap();
        let b = directory
            .create_or_update_from_profile(&provider("b"), r#"{"sub":"1"}"#)
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn profile_without_subject_is_invalid() {
        let directory = InMemoryDirectory::new();
        let result = directory
            .create_or_update_from_profile(&provider("oidc"), r#"{"email":"x@example.com"}"#)
            .await;
        assert!(matches!(result, Err(DirectoryError::InvalidProfile(_))));

        let result = directory
            .create_or_update_from_profile(&provider("oidc"), "<html>")
            .await;
        assert!(matches!(result, Err(DirectoryError::InvalidProfile(_))));
    }

    #[tokio::test]
    async fn granted_authorities_replace_defaults() {
        let directory = InMemoryDirectory::new().with_default_authorities(Vec::<String>::new());
        let user = directory
            .create_or_update_from_profile(&provider("oidc"), r#"{"sub":"abc"}"#)
            .await
            .unwrap();
        assert!(directory.authorities_for_user(&user.id).await.unwrap().is_empty());

        directory
            .grant_authorities(&user.id, vec!["ORGANIZATION:ADMIN".to_string()])
            .await
            .unwrap();
        assert_eq!(
            directory.authorities_for_user(&user.id).await.unwrap(),
            vec!["ORGANIZATION:ADMIN"]
        );
        assert!(directory.grant_authorities("missing", vec![]).await.is_err());
    }
}
