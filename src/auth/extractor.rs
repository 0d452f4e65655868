// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential extraction and Axum extractors for the bound principal.
//!
//! [`extract_credential`] finds the raw token for the gate. The `Auth` and
//! `OptionalAuth` extractors only read what the gate already bound:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal is Principal
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::cookie::{decode_cookie_value, find_cookie, AUTH_COOKIE_NAME};
use super::principal::{current, Principal};
use super::AuthError;

/// Authorization scheme marker.
pub const BEARER_SCHEME: &str = "Bearer";

/// What the request carries in the way of credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Neither the header nor the auth cookie is present
    Absent,
    /// A candidate was found but it does not mention the bearer scheme
    UnrecognizedScheme,
    /// Raw token to verify
    Token(String),
}

/// Locate the candidate token in the request.
///
/// The `Authorization` header wins when present and non-empty; otherwise the
/// URL-decoded auth cookie is used.
pub fn extract_credential(headers: &HeaderMap) -> Result<Credential, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .filter(|value| !value.is_empty());

    let source = match header {
        Some(value) => value,
        None => match find_cookie(headers, AUTH_COOKIE_NAME) {
            Some(raw) => decode_cookie_value(raw)?,
            None => return Ok(Credential::Absent),
        },
    };

    if source.is_empty() {
        return Ok(Credential::Absent);
    }

    Ok(match strip_scheme(&source) {
        Some(token) => Credential::Token(token),
        None => Credential::UnrecognizedScheme,
    })
}

/// Strip the bearer scheme from a credential source.
///
/// The marker only has to appear somewhere in the value; the token is what
/// follows the first `BEARER_SCHEME.len()` characters, trimmed. Existing
/// clients depend on this loose match, so `"XBearer abc"` yields `"abc"`.
pub fn strip_scheme(source: &str) -> Option<String> {
    if !source.contains(BEARER_SCHEME) {
        return None;
    }
    let rest: String = source.chars().skip(BEARER_SCHEME.chars().count()).collect();
    Some(rest.trim().to_string())
}

/// Extractor for the authenticated principal.
///
/// Rejects with 401 when the gate let the request through unauthenticated.
pub struct Auth(pub Principal);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current(&parts.extensions)
            .cloned()
            .map(Auth)
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Optional authentication extractor.
///
/// Returns `None` for unauthenticated requests instead of rejecting.
pub struct OptionalAuth(pub Option<Principal>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(current(&parts.extensions).cloned()))
    }
}
