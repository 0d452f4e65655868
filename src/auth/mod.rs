// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Request-time authentication for the management API.
//!
//! ## Auth Flow
//!
//! 1. The client sends `Authorization: Bearer <token>`, or the
//!    `Auth-Graviteeio-APIM` cookie holding the URL-encoded header value
//! 2. The gate:
//!    - Extracts the token (header first, then cookie)
//!    - Verifies the HS256 signature and the `exp`/`nbf` window
//!    - Extracts:
//!      - `sub` → principal ID
//!      - `permissions[].authority` → authorities
//!      - `email`, `firstname`, `lastname`
//! 3. The principal is bound into the request extensions
//!
//! ## Security
//!
//! - Requests without credentials continue unauthenticated; handlers that
//!   need a principal use the `Auth` extractor
//! - A refused token ends the request with 401 and clears the auth cookie

pub mod claims;
pub mod cookie;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod principal;
pub mod verifier;

pub use claims::ClaimSet;
pub use cookie::{CookieSettings, AUTH_COOKIE_NAME};
pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use middleware::{auth_middleware, AuthenticationGate, GateOutcome};
pub use principal::Principal;
pub use verifier::{TokenVerifier, VerificationFailure};
