// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim set carried by management API tokens.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Claim holding the granted permissions.
pub const PERMISSIONS_CLAIM: &str = "permissions";

/// Claims extracted from a verified token.
///
/// Only the claims below are recognized; anything else in the payload is
/// ignored. The optional name fields default to an empty string when they
/// are absent, null or not strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Subject (user ID)
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Raw permissions claim, decoded on demand by [`ClaimSet::to_authorities`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Value>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub firstname: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub lastname: String,

    /// Expiration timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not before timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// One entry of the `permissions` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub authority: String,
}

/// The claims verified fine but do not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ClaimShapeError(String);

impl ClaimShapeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl ClaimSet {
    /// Start a claim set for the given subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    /// Replace the permissions claim with the given authorities, in order.
    pub fn with_authorities<I, S>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions: Vec<Permission> = authorities
            .into_iter()
            .map(|authority| Permission {
                authority: authority.into(),
            })
            .collect();
        self.permissions = serde_json::to_value(permissions).ok();
        self
    }

    /// The token subject. Must be present and non-empty.
    pub fn subject(&self) -> Result<&str, ClaimShapeError> {
        match self.subject.as_deref() {
            Some(subject) if !subject.is_empty() => Ok(subject),
            _ => Err(ClaimShapeError::new("token has no subject")),
        }
    }

    /// Decode the `permissions` claim into authority strings, keeping order.
    ///
    /// An absent or null claim yields no authorities. Any malformed entry
    /// fails the whole decode; partial authority sets are never returned.
    pub fn to_authorities(&self) -> Result<Vec<String>, ClaimShapeError> {
        let raw = match &self.permissions {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(raw) => raw,
        };

        let permissions = Vec::<Permission>::deserialize(raw).map_err(|e| {
            ClaimShapeError::new(format!("`{PERMISSIONS_CLAIM}` claim is malformed: {e}"))
        })?;

        permissions
            .into_iter()
            .map(|permission| {
                if permission.authority.trim().is_empty() {
                    Err(ClaimShapeError::new(format!(
                        "`{PERMISSIONS_CLAIM}` claim contains an empty authority"
                    )))
                } else {
                    Ok(permission.authority)
                }
            })
            .collect()
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => value,
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_from(payload: Value) -> ClaimSet {
        serde_json::from_value(payload).unwrap()
    }

    #[test]
    fn authorities_keep_claim_order() {
        let claims = claims_from(json!({
            "sub": "user_123",
            "permissions": [{"authority": "READ"}, {"authority": "WRITE"}]
        }));
        assert_eq!(claims.to_authorities().unwrap(), vec!["READ", "WRITE"]);
    }

    #[test]
    fn absent_or_null_permissions_mean_no_authorities() {
        assert!(claims_from(json!({"sub": "u"})).to_authorities().unwrap().is_empty());
        assert!(claims_from(json!({"sub": "u", "permissions": null}))
            .to_authorities()
            .unwrap()
            .is_empty());
        assert!(claims_from(json!({"sub": "u", "permissions": []}))
            .to_authorities()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn extra_fields_in_permission_records_are_ignored() {
        let claims = claims_from(json!({
            "sub": "u",
            "permissions": [{"authority": "ADMIN", "scope": "ORGANIZATION"}]
        }));
        assert_eq!(claims.to_authorities().unwrap(), vec!["ADMIN"]);
    }

    #[test]
    fn malformed_permissions_fail_fast() {
        let cases = [
            json!("READ"),
            json!(["READ"]),
            json!([{"authority": "READ"}, {"role": "WRITE"}]),
            json!([{"authority": 42}]),
            json!([{"authority": null}]),
            json!([{"authority": "  "}]),
        ];
        for permissions in cases {
            let claims = claims_from(json!({"sub": "u", "permissions": permissions}));
            assert!(
                claims.to_authorities().is_err(),
                "expected failure for {:?}",
                claims.permissions
            );
        }
    }

    #[test]
    fn name_claims_default_to_empty() {
        let claims = claims_from(json!({
            "sub": "u",
            "email": null,
            "firstname": 12,
            "unknown": {"nested": true}
        }));
        assert_eq!(claims.email, "");
        assert_eq!(claims.firstname, "");
        assert_eq!(claims.lastname, "");
    }

    #[test]
    fn subject_must_be_non_empty() {
        assert!(claims_from(json!({})).subject().is_err());
        assert!(claims_from(json!({"sub": ""})).subject().is_err());
        assert_eq!(ClaimSet::new("user_1").subject().unwrap(), "user_1");
    }

    #[test]
    fn with_authorities_encodes_permission_records() {
        let claims = ClaimSet::new("u").with_authorities(["READ", "WRITE"]);
        let encoded = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            encoded["permissions"],
            json!([{"authority": "READ"}, {"authority": "WRITE"}])
        );
        assert_eq!(claims_from(encoded), claims);
    }
}
