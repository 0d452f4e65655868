// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication cookie handling.
//!
//! The cookie is issued elsewhere; this side only reads it as a fallback
//! credential and clears it when the token inside is refused.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

use super::AuthError;

/// Name of the cookie carrying the URL-encoded token.
pub const AUTH_COOKIE_NAME: &str = "Auth-Graviteeio-APIM";

/// Find a cookie value by name across every `Cookie` header.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}

/// Decode a form-URL-encoded cookie value (`+` is a space).
pub fn decode_cookie_value(raw: &str) -> Result<String, AuthError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| AuthError::InvalidCookieEncoding)
}

/// Attributes shared with the component that issues the auth cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: true,
        }
    }
}

impl CookieSettings {
    /// `Set-Cookie` value that deletes the named cookie on the client.
    pub fn clearing_cookie(&self, name: &str) -> String {
        let mut cookie = format!("{name}=; Max-Age=0; Path={}", self.path);
        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie
    }

    /// Header value clearing the authentication cookie.
    pub fn clear_auth_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.clearing_cookie(AUTH_COOKIE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookies(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(COOKIE, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn finds_cookie_among_others() {
        let headers = headers_with_cookies(&["theme=dark; Auth-Graviteeio-APIM=Bearer%20abc; lang=en"]);
        assert_eq!(find_cookie(&headers, AUTH_COOKIE_NAME), Some("Bearer%20abc"));
    }

    #[test]
    fn finds_cookie_in_second_header() {
        let headers = headers_with_cookies(&["theme=dark", "Auth-Graviteeio-APIM=xyz"]);
        assert_eq!(find_cookie(&headers, AUTH_COOKIE_NAME), Some("xyz"));
    }

    #[test]
    fn cookie_names_match_exactly() {
        let headers = headers_with_cookies(&["Auth-Graviteeio-APIM-old=xyz"]);
        assert_eq!(find_cookie(&headers, AUTH_COOKIE_NAME), None);
    }

    #[test]
    fn decodes_percent_and_plus() {
        assert_eq!(decode_cookie_value("Bearer%20abc").unwrap(), "Bearer abc");
        assert_eq!(decode_cookie_value("Bearer+abc").unwrap(), "Bearer abc");
        assert_eq!(decode_cookie_value("plain").unwrap(), "plain");
    }

    #[test]
    fn rejects_non_utf8_encoding() {
        assert!(matches!(
            decode_cookie_value("Bearer%FF%FE"),
            Err(AuthError::InvalidCookieEncoding)
        ));
    }

    #[test]
    fn clearing_cookie_expires_immediately() {
        let settings = CookieSettings {
            path: "/management".to_string(),
            domain: Some("example.com".to_string()),
            secure: true,
            http_only: true,
        };
        assert_eq!(
            settings.clearing_cookie(AUTH_COOKIE_NAME),
            "Auth-Graviteeio-APIM=; Max-Age=0; Path=/management; Domain=example.com; Secure; HttpOnly"
        );
    }

    #[test]
    fn default_clearing_cookie_is_a_valid_header() {
        let value = CookieSettings::default().clear_auth_cookie().unwrap();
        assert_eq!(value, "Auth-Graviteeio-APIM=; Max-Age=0; Path=/; HttpOnly");
    }
}
