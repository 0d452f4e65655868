// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8083` |
//! | `JWT_SECRET` | HMAC-SHA256 secret shared with the token issuer | Required |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp`/`nbf` | `0` |
//! | `AUTH_COOKIE_PATH` | Path attribute of the auth cookie | `/` |
//! | `AUTH_COOKIE_DOMAIN` | Domain attribute of the auth cookie | Unset |
//! | `AUTH_COOKIE_SECURE` | Secure attribute of the auth cookie | `false` |
//! | `ORGANIZATION_ID` | Organization used for identity provider lookups | `DEFAULT` |
//! | `FEDERATION_HTTP_TIMEOUT_SECS` | Timeout of each identity provider call | `10` |
//! | `SECURITY_TRUST_ALL` | Accept any provider TLS certificate (test only) | `false` |
//! | `IDENTITY_PROVIDERS_FILE` | JSON array of identity provider descriptors | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::CookieSettings;
use crate::federation::exchanger::DEFAULT_HTTP_TIMEOUT;
use crate::federation::{IdentityProviderDescriptor, OrganizationScope};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const COOKIE_PATH_ENV: &str = "AUTH_COOKIE_PATH";
pub const COOKIE_DOMAIN_ENV: &str = "AUTH_COOKIE_DOMAIN";
pub const COOKIE_SECURE_ENV: &str = "AUTH_COOKIE_SECURE";
pub const ORGANIZATION_ENV: &str = "ORGANIZATION_ID";
pub const FEDERATION_TIMEOUT_ENV: &str = "FEDERATION_HTTP_TIMEOUT_SECS";
pub const TRUST_ALL_ENV: &str = "SECURITY_TRUST_ALL";
pub const PROVIDERS_FILE_ENV: &str = "IDENTITY_PROVIDERS_FILE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8083;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable `{0}` is not set")]
    Missing(&'static str),

    #[error("environment variable `{name}` has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },

    #[error("cannot load identity providers from {path}: {reason}")]
    Providers { path: PathBuf, reason: String },

    #[error("cannot build the identity provider HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Service configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_leeway_secs: u64,
    pub cookie: CookieSettings,
    pub organization: OrganizationScope,
    pub federation_timeout: Duration,
    pub trust_all: bool,
    pub providers_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_leeway_secs", &self.jwt_leeway_secs)
            .field("cookie", &self.cookie)
            .field("organization", &self.organization)
            .field("federation_timeout", &self.federation_timeout)
            .field("trust_all", &self.trust_all)
            .field("providers_file", &self.providers_file)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let jwt_secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let cookie = CookieSettings {
            path: get(COOKIE_PATH_ENV).unwrap_or_else(|| "/".to_string()),
            domain: get(COOKIE_DOMAIN_ENV),
            secure: parse_or(COOKIE_SECURE_ENV, get(COOKIE_SECURE_ENV), false)?,
            http_only: true,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?,
            jwt_secret,
            jwt_leeway_secs: parse_or(JWT_LEEWAY_ENV, get(JWT_LEEWAY_ENV), 0)?,
            cookie,
            organization: get(ORGANIZATION_ENV)
                .map(OrganizationScope::new)
                .unwrap_or_default(),
            federation_timeout: Duration::from_secs(parse_or(
                FEDERATION_TIMEOUT_ENV,
                get(FEDERATION_TIMEOUT_ENV),
                DEFAULT_HTTP_TIMEOUT.as_secs(),
            )?),
            trust_all: parse_or(TRUST_ALL_ENV, get(TRUST_ALL_ENV), false)?,
            providers_file: get(PROVIDERS_FILE_ENV).map(PathBuf::from),
            log_format,
        })
    }

    /// Bind address as `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Provider descriptors from `IDENTITY_PROVIDERS_FILE`, if configured.
    pub fn load_providers(&self) -> Result<Vec<IdentityProviderDescriptor>, ConfigError> {
        match &self.providers_file {
            Some(path) => load_providers_file(path),
            None => Ok(Vec::new()),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn load_providers_file(path: &Path) -> Result<Vec<IdentityProviderDescriptor>, ConfigError> {
    let error = |reason: String| ConfigError::Providers {
        path: path.to_path_buf(),
        reason,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| error(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| error(e.to_string()))
}
