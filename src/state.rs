// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthenticationGate, TokenVerifier};
use crate::config::{AppConfig, ConfigError};
use crate::federation::{http_client, FederationExchanger, OrganizationScope};
use crate::store::{InMemoryDirectory, JsonSessionEstablisher};

#[derive(Clone)]
pub struct AppState {
    pub gate: AuthenticationGate,
    pub federation: Arc<FederationExchanger>,
    /// Organization the identity providers are looked up in
    pub organization: OrganizationScope,
}

impl AppState {
    pub fn new(
        gate: AuthenticationGate,
        federation: FederationExchanger,
        organization: OrganizationScope,
    ) -> Self {
        Self {
            gate,
            federation: Arc::new(federation),
            organization,
        }
    }

    /// Wire the standalone server: in-memory directory seeded from the
    /// configured provider file, JSON session summaries.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let verifier = TokenVerifier::with_leeway(&config.jwt_secret, config.jwt_leeway_secs);
        let gate = AuthenticationGate::new(Arc::new(verifier), config.cookie.clone());

        let directory = Arc::new(
            InMemoryDirectory::new().with_providers(&config.organization, config.load_providers()?),
        );
        let exchanger = FederationExchanger::new(
            http_client(config.federation_timeout, config.trust_all)?,
            directory.clone(),
            directory,
            Arc::new(JsonSessionEstablisher),
        );

        Ok(Self::new(gate, exchanger, config.organization.clone()))
    }
}
