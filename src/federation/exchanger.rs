// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth2 / OIDC federation with external identity providers.
//!
//! Both flows are a short pipeline of typed steps:
//!
//! - token exchange: `lookup → introspect → user info → bind → session`
//! - authorization code: `lookup → redeem code → user info → bind → session`
//!
//! Every step returns early with a [`FederationError`] that already knows its
//! HTTP status. Provider calls are made once, with the client timeout, and
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    StatusCode,
};
use axum::response::{IntoResponse, Response};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, Level};
use utoipa::ToSchema;

use super::directory::{ExchangeResult, ProviderDirectory, SessionEstablisher, UserDirectory};
use super::error::FederationError;
use super::provider::{IdentityProviderDescriptor, OrganizationScope};
use crate::auth::Principal;

/// Default timeout for each provider call.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const APPLICATION_JSON: &str = "application/json";
const ACCESS_TOKEN_PROPERTY: &str = "access_token";
const ID_TOKEN_PROPERTY: &str = "id_token";
const ACTIVE_PROPERTY: &str = "active";
const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Authorization code returned to the client by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCodePayload {
    pub client_id: String,
    pub redirect_uri: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Outcome of a successful federation.
#[derive(Debug)]
pub struct FederatedSession {
    pub principal: Principal,
    /// Response produced by the session establisher
    pub response: Response,
}

impl IntoResponse for FederatedSession {
    fn into_response(self) -> Response {
        let mut response = self.response;
        response.extensions_mut().insert(self.principal);
        response
    }
}

/// Build the HTTP client used for provider calls.
///
/// `trust_all` disables certificate validation and must stay off outside
/// test environments.
pub fn http_client(timeout: Duration, trust_all: bool) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .danger_accept_invalid_certs(trust_all)
        .build()
}

/// Drives both federation flows. Shared by every request.
#[derive(Clone)]
pub struct FederationExchanger {
    http: Client,
    providers: Arc<dyn ProviderDirectory>,
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionEstablisher>,
}

impl FederationExchanger {
    pub fn new(
        http: Client,
        providers: Arc<dyn ProviderDirectory>,
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionEstablisher>,
    ) -> Self {
        Self {
            http,
            providers,
            users,
            sessions,
        }
    }

    /// Exchange a provider-issued access token for a local session.
    ///
    /// The provider is resolved before the token is looked at, so an unknown
    /// provider is reported as such even when no token was sent.
    pub async fn introspect_and_authenticate(
        &self,
        provider_id: &str,
        scope: &OrganizationScope,
        token: Option<&str>,
    ) -> Result<FederatedSession, FederationError> {
        let provider = self.lookup(provider_id, scope).await?;
        let endpoint = provider
            .token_introspection_endpoint
            .as_deref()
            .ok_or(FederationError::ExchangeUnsupported)?;
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(FederationError::MissingToken)?;

        self.introspect(&provider, endpoint, token).await?;

        let exchange = ExchangeResult {
            access_token: token.to_string(),
            id_token: None,
            state: None,
        };
        self.authenticate_user(&provider, exchange).await
    }

    /// Redeem an authorization code and open a local session.
    pub async fn exchange_authorization_code(
        &self,
        provider_id: &str,
        scope: &OrganizationScope,
        payload: &AuthorizationCodePayload,
    ) -> Result<FederatedSession, FederationError> {
        let provider = self.lookup(provider_id, scope).await?;
        let exchange = self.redeem_code(&provider, payload).await?;
        self.authenticate_user(&provider, exchange).await
    }

    async fn lookup(
        &self,
        provider_id: &str,
        scope: &OrganizationScope,
    ) -> Result<IdentityProviderDescriptor, FederationError> {
        self.providers
            .find_provider(provider_id, scope)
            .await?
            .ok_or_else(|| {
                debug!(provider = provider_id, organization = %scope, "Identity provider not found");
                FederationError::ProviderNotFound(provider_id.to_string())
            })
    }

    async fn introspect(
        &self,
        provider: &IdentityProviderDescriptor,
        endpoint: &str,
        token: &str,
    ) -> Result<(), FederationError> {
        let response = self
            .http
            .post(endpoint)
            .header(ACCEPT, APPLICATION_JSON)
            .header(AUTHORIZATION, provider.basic_authorization())
            .form(&[("token", token)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let body = response.text().await?;
            log_upstream_failure("Token exchange", &provider.id, status, &body);
            return Err(FederationError::IntrospectionRejected {
                status,
                content_type,
                body,
            });
        }

        let payload = read_json(response).await?;
        if is_active(&payload) {
            Ok(())
        } else {
            debug!(provider = %provider.id, "Introspected token is not active");
            Err(FederationError::TokenInactive(payload))
        }
    }

    async fn redeem_code(
        &self,
        provider: &IdentityProviderDescriptor,
        payload: &AuthorizationCodePayload,
    ) -> Result<ExchangeResult, FederationError> {
        let form = [
            ("client_id", payload.client_id.as_str()),
            ("redirect_uri", payload.redirect_uri.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("code", payload.code.as_str()),
            ("grant_type", AUTHORIZATION_CODE_GRANT),
        ];

        let response = self
            .http
            .post(&provider.token_endpoint)
            .header(ACCEPT, APPLICATION_JSON)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log_upstream_failure("Exchange authorization code", &provider.id, status, &body);
            return Err(FederationError::CodeExchangeRejected(status));
        }

        let body = read_json(response).await?;
        let access_token = body
            .get(ACCESS_TOKEN_PROPERTY)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                FederationError::UpstreamInvalidResponse(format!(
                    "token response has no `{ACCESS_TOKEN_PROPERTY}`"
                ))
            })?
            .to_string();
        let id_token = body
            .get(ID_TOKEN_PROPERTY)
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(ExchangeResult {
            access_token,
            id_token,
            state: payload.state.clone(),
        })
    }

    /// Fetch the end-user profile and finish the federation.
    async fn authenticate_user(
        &self,
        provider: &IdentityProviderDescriptor,
        exchange: ExchangeResult,
    ) -> Result<FederatedSession, FederationError> {
        let profile = self.fetch_user_info(provider, &exchange).await?;
        let principal = self.bind_profile(provider, &profile).await?;

        info!(
            provider = %provider.id,
            user_id = %principal.id,
            "Federated user authenticated"
        );

        let response = self.sessions.establish(&principal, &exchange).await?;
        Ok(FederatedSession {
            principal,
            response,
        })
    }

    async fn fetch_user_info(
        &self,
        provider: &IdentityProviderDescriptor,
        exchange: &ExchangeResult,
    ) -> Result<String, FederationError> {
        let response = self
            .http
            .get(&provider.user_info_endpoint)
            .header(ACCEPT, APPLICATION_JSON)
            .header(
                AUTHORIZATION,
                provider.user_info_authorization(&exchange.access_token),
            )
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            log_upstream_failure("User info", &provider.id, status, &body);
            return Err(FederationError::UserInfoRejected(status));
        }
        Ok(body)
    }

    /// Map a provider profile to a local user and build its principal.
    pub async fn bind_profile(
        &self,
        provider: &IdentityProviderDescriptor,
        profile: &str,
    ) -> Result<Principal, FederationError> {
        let user = self
            .users
            .create_or_update_from_profile(provider, profile)
            .await?;
        let authorities = self.users.authorities_for_user(&user.id).await?;
        Ok(Principal::from_user(&user, authorities))
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, FederationError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| FederationError::UpstreamInvalidResponse(format!("body is not JSON: {e}")))
}

/// Read the introspection `active` flag. Anything unreadable counts as active.
fn is_active(payload: &Value) -> bool {
    match payload.get(ACTIVE_PROPERTY) {
        Some(Value::Bool(active)) => *active,
        Some(Value::String(text)) => text.trim() != "false",
        Some(Value::Number(number)) => number.as_f64().map_or(true, |value| value != 0.0),
        _ => true,
    }
}

/// Provider bodies may contain token material; only print them under debug.
fn log_upstream_failure(step: &str, provider: &str, status: StatusCode, body: &str) {
    if tracing::enabled!(Level::DEBUG) {
        error!(provider, %status, body, "{step} failed");
    } else {
        error!(provider, %status, "{step} failed");
    }
}
