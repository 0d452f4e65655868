// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External identity provider configuration.

use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the access token in the authorization template.
const TOKEN_PLACEHOLDER: &str = "%s";

/// Default organization used for provider lookups.
pub const DEFAULT_ORGANIZATION: &str = "DEFAULT";

/// Organization a provider lookup is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationScope(String);

impl OrganizationScope {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrganizationScope {
    fn default() -> Self {
        Self::new(DEFAULT_ORGANIZATION)
    }
}

impl std::fmt::Display for OrganizationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// OAuth2 / OIDC provider descriptor, as supplied by the provider directory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderDescriptor {
    pub id: String,
    pub token_endpoint: String,
    /// Only providers with an introspection endpoint support token exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_introspection_endpoint: Option<String>,
    pub user_info_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    /// Template for the user-info `Authorization` header, e.g. `Bearer %s`
    #[serde(default = "default_authorization_header")]
    pub authorization_header: String,
}

fn default_authorization_header() -> String {
    format!("Bearer {TOKEN_PLACEHOLDER}")
}

impl IdentityProviderDescriptor {
    /// Format the user-info `Authorization` header for an access token.
    ///
    /// The first `%s` receives the token. A template without a placeholder
    /// is sent unchanged.
    pub fn user_info_authorization(&self, access_token: &str) -> String {
        self.authorization_header
            .replacen(TOKEN_PLACEHOLDER, access_token, 1)
    }

    /// HTTP Basic credentials built from the client ID and secret.
    pub fn basic_authorization(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", Base64::encode_string(credentials.as_bytes()))
    }
}

impl std::fmt::Debug for IdentityProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProviderDescriptor")
            .field("id", &self.id)
            .field("token_endpoint", &self.token_endpoint)
            .field("token_introspection_endpoint", &self.token_introspection_endpoint)
            .field("user_info_endpoint", &self.user_info_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authorization_header", &self.authorization_header)
            .finish()
    }
}
