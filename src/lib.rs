// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Management API authentication server.
//!
//! Authenticates every request from a signed HS256 token carried in the
//! `Authorization` header or the `Auth-Graviteeio-APIM` cookie, and federates
//! users from external OAuth2 / OIDC identity providers.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token gate and request principal
//! - `federation` - OAuth2 / OIDC provider exchanges
//! - `store` - In-memory provider and user directory

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod federation;
pub mod state;
pub mod store;
