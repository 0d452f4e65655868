// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::claims::ClaimShapeError;
use super::verifier::{FailureClass, VerificationFailure};

/// Authentication error type.
///
/// Absent credentials and unrecognized schemes are not errors: the gate lets
/// those requests through unauthenticated. Every variant here ends the
/// request (or the handler) with the status from [`AuthError::status_code`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A handler required a principal but the request is unauthenticated
    #[error("Authentication is required")]
    MissingCredentials,
    /// Token failed integrity, structure or time checks
    #[error("Invalid token: {0}")]
    VerificationFailed(#[from] VerificationFailure),
    /// Token verified but its claims have an unexpected shape
    #[error("Invalid token claims: {0}")]
    ClaimShapeInvalid(#[from] ClaimShapeError),
    /// Authentication cookie could not be URL-decoded
    #[error("Authentication cookie is not valid URL-encoded text")]
    InvalidCookieEncoding,
    /// Principal lacks a required authority
    #[error("Insufficient permissions for this operation")]
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::VerificationFailed(_) => "invalid_token",
            AuthError::ClaimShapeInvalid(_) => "invalid_claims",
            AuthError::InvalidCookieEncoding => "invalid_cookie",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::VerificationFailed(_)
            | AuthError::ClaimShapeInvalid(_)
            | AuthError::InvalidCookieEncoding => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
        }
    }

    /// Whether this is a token fault (malformed, bad signature, expired).
    ///
    /// Token faults are routine and logged at WARN; everything else that
    /// rejects a request is logged at ERROR.
    pub fn is_token_fault(&self) -> bool {
        matches!(
            self,
            AuthError::VerificationFailed(failure) if failure.class() == FailureClass::InvalidToken
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
