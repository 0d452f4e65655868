// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Federation errors and their HTTP mapping.

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::directory::DirectoryError;

/// Message returned when a provider has no introspection endpoint.
pub const EXCHANGE_UNSUPPORTED_MESSAGE: &str =
    "Token exchange is not supported for this identity provider";

#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    #[error("identity provider `{0}` not found")]
    ProviderNotFound(String),

    #[error("{}", EXCHANGE_UNSUPPORTED_MESSAGE)]
    ExchangeUnsupported,

    #[error("missing `token` query parameter")]
    MissingToken,

    /// Introspection answered 200 with `active: false`; the payload is echoed
    #[error("token is not active")]
    TokenInactive(Value),

    /// Introspection answered non-200; status and body are forwarded
    #[error("token introspection returned {status}")]
    IntrospectionRejected {
        status: StatusCode,
        content_type: Option<String>,
        body: String,
    },

    /// Token endpoint refused the authorization code
    #[error("authorization code exchange returned {0}")]
    CodeExchangeRejected(StatusCode),

    /// User-info endpoint answered non-200; only the status is forwarded
    #[error("user info request returned {0}")]
    UserInfoRejected(StatusCode),

    #[error("identity provider response is invalid: {0}")]
    UpstreamInvalidResponse(String),

    #[error("identity provider unreachable: {0}")]
    UpstreamUnreachable(#[from] reqwest::Error),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

#[derive(Serialize)]
struct FederationErrorBody {
    error: String,
    error_code: String,
}

impl FederationError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            FederationError::ProviderNotFound(_) => "provider_not_found",
            FederationError::ExchangeUnsupported => "exchange_unsupported",
            FederationError::MissingToken => "missing_token",
            FederationError::TokenInactive(_) => "token_inactive",
            FederationError::IntrospectionRejected { .. } => "introspection_rejected",
            FederationError::CodeExchangeRejected(_) => "code_exchange_rejected",
            FederationError::UserInfoRejected(_) => "user_info_rejected",
            FederationError::UpstreamInvalidResponse(_) => "upstream_invalid_response",
            FederationError::UpstreamUnreachable(_) => "upstream_unreachable",
            FederationError::Directory(_) => "directory_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FederationError::ProviderNotFound(_) => StatusCode::NOT_FOUND,
            FederationError::ExchangeUnsupported | FederationError::MissingToken => {
                StatusCode::BAD_REQUEST
            }
            FederationError::TokenInactive(_) | FederationError::CodeExchangeRejected(_) => {
                StatusCode::UNAUTHORIZED
            }
            FederationError::IntrospectionRejected { status, .. } => *status,
            FederationError::UserInfoRejected(status) => *status,
            FederationError::UpstreamInvalidResponse(_) => StatusCode::BAD_GATEWAY,
            FederationError::UpstreamUnreachable(e) if e.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            FederationError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            FederationError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FederationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            FederationError::TokenInactive(payload) => (status, Json(payload)).into_response(),
            FederationError::IntrospectionRejected {
                content_type, body, ..
            } => {
                let mut response = (status, body).into_response();
                if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
                    response.headers_mut().insert(CONTENT_TYPE, value);
                }
                response
            }
            FederationError::CodeExchangeRejected(_) | FederationError::UserInfoRejected(_) => {
                status.into_response()
            }
            other => {
                let body = Json(FederationErrorBody {
                    error: other.to_string(),
                    error_code: other.error_code().to_string(),
                });
                (status, body).into_response()
            }
        }
    }
}
