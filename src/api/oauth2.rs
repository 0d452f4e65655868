// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth2 / OIDC federation endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::federation::AuthorizationCodePayload;
use crate::state::AppState;

/// Query string of the token exchange endpoint.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TokenExchangeQuery {
    /// Access token issued by the identity provider
    pub token: Option<String>,
}

fn validate(payload: &AuthorizationCodePayload) -> Result<(), ApiError> {
    let missing = [
        ("clientId", &payload.client_id),
        ("redirectUri", &payload.redirect_uri),
        ("code", &payload.code),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());

    match missing {
        Some((field, _)) => Err(ApiError::bad_request(format!("`{field}` must not be empty"))),
        None => Ok(()),
    }
}

/// Redeem an authorization code with an identity provider.
#[utoipa::path(
    post,
    path = "/auth/oauth2/{identity}",
    tag = "OAuth2",
    params(("identity" = String, Path, description = "Identity provider ID")),
    request_body = AuthorizationCodePayload,
    responses(
        (status = 200, description = "Session established", body = crate::store::SessionSummary),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Provider refused the code"),
        (status = 404, description = "Unknown identity provider"),
        (status = 502, description = "Provider unreachable or answered garbage"),
        (status = 504, description = "Provider timed out"),
    )
)]
pub async fn exchange_authorization_code(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    payload: Result<Json<AuthorizationCodePayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    if let Err(e) = validate(&payload) {
        return e.into_response();
    }

    state
        .federation
        .exchange_authorization_code(&identity, &state.organization, &payload)
        .await
        .into_response()
}

/// Trade a provider access token for a local session.
#[utoipa::path(
    post,
    path = "/auth/oauth2/{identity}/exchange",
    tag = "OAuth2",
    params(
        ("identity" = String, Path, description = "Identity provider ID"),
        TokenExchangeQuery
    ),
    responses(
        (status = 200, description = "Session established", body = crate::store::SessionSummary),
        (status = 400, description = "Missing token or provider has no introspection endpoint"),
        (status = 401, description = "Token is not active"),
        (status = 404, description = "Unknown identity provider"),
        (status = 502, description = "Provider unreachable or answered garbage"),
        (status = 504, description = "Provider timed out"),
    )
)]
pub async fn token_exchange(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Query(query): Query<TokenExchangeQuery>,
) -> Response {
    state
        .federation
        .introspect_and_authenticate(&identity, &state.organization, query.token.as_deref())
        .await
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(client_id: &str, redirect_uri: &str, code: &str) -> AuthorizationCodePayload {
        AuthorizationCodePayload {
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            code: code.to_string(),
            state: None,
        }
    }

    #[test]
    fn complete_payload_is_valid() {
        assert!(validate(&payload("c", "https://app/cb", "abc")).is_ok());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let err = validate(&payload("c", "https://app/cb", " ")).unwrap_err();
        assert_eq!(err.message, "`code` must not be empty");

        let err = validate(&payload("", "", "abc")).unwrap_err();
        assert_eq!(err.message, "`clientId` must not be empty");
    }
}
