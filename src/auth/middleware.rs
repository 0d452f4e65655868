// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate for Axum.
//!
//! Every request passes through [`auth_middleware`]. The gate extracts a
//! candidate token, verifies it and binds the resulting [`Principal`] into
//! the request extensions. Requests without a credential (or with an
//! unrecognized scheme) continue unauthenticated; requests whose token is
//! refused are answered with 401 and a cookie that clears the stale session.
//!
//! ```rust,ignore
//! let gate = AuthenticationGate::new(Arc::new(TokenVerifier::new(secret)), CookieSettings::default());
//!
//! let app = Router::new()
//!     .route("/user", get(current_user))
//!     .layer(axum::middleware::from_fn_with_state(gate, auth_middleware));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn, Level};

use super::extractor::{extract_credential, Credential};
use super::principal::{bind, Principal};
use super::verifier::TokenVerifier;
use super::{AuthError, CookieSettings};

/// Result of evaluating one request.
#[derive(Debug)]
pub enum GateOutcome {
    /// No usable credential; continue without a principal
    Anonymous,
    /// Token verified; continue with this principal bound
    Authenticated(Principal),
    /// Token refused; stop with 401
    Rejected(AuthError),
}

/// Request-time authentication gate.
///
/// Cheap to clone; the verifier is shared by every request.
#[derive(Debug, Clone)]
pub struct AuthenticationGate {
    verifier: Arc<TokenVerifier>,
    cookies: CookieSettings,
}

impl AuthenticationGate {
    pub fn new(verifier: Arc<TokenVerifier>, cookies: CookieSettings) -> Self {
        Self { verifier, cookies }
    }

    /// Extract, verify and build the principal for one request.
    pub fn evaluate(&self, headers: &HeaderMap) -> GateOutcome {
        let token = match extract_credential(headers) {
            Ok(Credential::Token(token)) => token,
            Ok(Credential::Absent) => {
                debug!("Authorization header/cookie not found");
                return GateOutcome::Anonymous;
            }
            Ok(Credential::UnrecognizedScheme) => {
                debug!("Authorization schema not found");
                return GateOutcome::Anonymous;
            }
            Err(e) => return GateOutcome::Rejected(e),
        };

        match self.authenticate(&token) {
            Ok(principal) => GateOutcome::Authenticated(principal),
            Err(e) => GateOutcome::Rejected(e),
        }
    }

    fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.verifier.verify(token)?;
        Principal::from_claims(&claims)
    }

    /// Build the 401 response for a refused credential.
    pub fn reject(&self, error: AuthError) -> Response {
        if tracing::enabled!(Level::DEBUG) {
            error!(error = %error, "Invalid token");
        } else if error.is_token_fault() {
            warn!("Invalid token");
        } else {
            error!("Invalid token");
        }

        let clear_cookie = self.cookies.clear_auth_cookie();
        let mut response = error.into_response();
        match clear_cookie {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => error!(error = %e, "Auth cookie settings produce an invalid header"),
        }
        response
    }
}

/// Authentication middleware function.
pub async fn auth_middleware(
    State(gate): State<AuthenticationGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.evaluate(request.headers()) {
        GateOutcome::Anonymous => next.run(request).await,
        GateOutcome::Authenticated(principal) => {
            bind(request.extensions_mut(), principal);
            next.run(request).await
        }
        GateOutcome::Rejected(error) => gate.reject(error),
    }
}
