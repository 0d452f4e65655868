// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC-SHA256 token verification.
//!
//! One [`TokenVerifier`] is built at startup from the shared secret and
//! shared by every request. It holds no mutable state.

use std::collections::HashSet;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::claims::ClaimSet;

/// Why a token was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is not yet valid")]
    NotYetValid,
    #[error("token verification failed: {0}")]
    Other(String),
}

/// Coarse classification of a [`VerificationFailure`], used for log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The token itself is bad (structure, signature, time window)
    InvalidToken,
    /// Anything else (key material, crypto backend)
    Other,
}

impl VerificationFailure {
    pub fn class(&self) -> FailureClass {
        match self {
            VerificationFailure::Other(_) => FailureClass::Other,
            _ => FailureClass::InvalidToken,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerificationFailure {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => VerificationFailure::Expired,
            ErrorKind::ImmatureSignature => VerificationFailure::NotYetValid,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                VerificationFailure::InvalidSignature
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => VerificationFailure::Malformed,
            _ => VerificationFailure::Other(err.to_string()),
        }
    }
}

/// Verifies signed tokens against a fixed HS256 secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for the given secret with no clock-skew leeway.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_leeway(secret, 0)
    }

    /// Create a verifier tolerating `leeway` seconds of clock skew on
    /// `exp` and `nbf`.
    pub fn with_leeway(secret: impl AsRef<[u8]>, leeway: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Time claims are enforced when present but not required, and the
        // management API does not scope tokens by audience.
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    /// Check structure, signature and time window, then return the claims.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, VerificationFailure> {
        let token_data = decode::<ClaimSet>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &Algorithm::HS256)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) const TEST_SECRET: &str = "management-api-test-secret";

    /// Sign claims the way the issuing side does.
    pub(crate) fn sign(claims: &ClaimSet, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    pub(crate) fn valid_claims() -> ClaimSet {
        let mut claims = ClaimSet::new("user_123").with_authorities(["READ", "WRITE"]);
        claims.email = "jane@example.com".to_string();
        claims.firstname = "Jane".to_string();
        claims.lastname = "Doe".to_string();
        claims.iat = Some(Utc::now().timestamp());
        claims.exp = Some(Utc::now().timestamp() + 3600);
        claims
    }

    #[test]
    fn verifies_valid_token() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let claims = valid_claims();
        let verified = verifier.verify(&sign(&claims, TEST_SECRET)).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn accepts_token_without_expiry() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let claims = ClaimSet::new("user_123");
        assert!(verifier.verify(&sign(&claims, TEST_SECRET)).is_ok());
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let token = sign(&valid_claims(), "another-secret");
        assert_eq!(
            verifier.verify(&token),
            Err(VerificationFailure::InvalidSignature)
        );
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let mut claims = valid_claims();
        claims.exp = Some(Utc::now().timestamp() - 600);
        assert_eq!(
            verifier.verify(&sign(&claims, TEST_SECRET)),
            Err(VerificationFailure::Expired)
        );
    }

    #[test]
    fn leeway_tolerates_small_skew() {
        let verifier = TokenVerifier::with_leeway(TEST_SECRET, 120);
        let mut claims = valid_claims();
        claims.exp = Some(Utc::now().timestamp() - 30);
        assert!(verifier.verify(&sign(&claims, TEST_SECRET)).is_ok());
    }

    #[test]
    fn rejects_token_not_yet_valid() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let mut claims = valid_claims();
        claims.nbf = Some(Utc::now().timestamp() + 600);
        assert_eq!(
            verifier.verify(&sign(&claims, TEST_SECRET)),
            Err(VerificationFailure::NotYetValid)
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        for token in ["", "not-a-token", "a.b", "a.b.c"] {
            let failure = verifier.verify(token).unwrap_err();
            assert_eq!(failure.class(), FailureClass::InvalidToken, "{token}");
        }
    }

    #[test]
    fn rejects_other_algorithms() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let token = encode(
            &Header::new(Algorithm::HS512),
            &valid_claims(),
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn verification_is_repeatable() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let token = sign(&valid_claims(), TEST_SECRET);
        assert_eq!(verifier.verify(&token), verifier.verify(&token));
    }
}
