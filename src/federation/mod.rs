// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Federation Module
//!
//! Trades credentials from an external OAuth2 / OIDC provider for a local
//! principal. The principal is built through the same [`Principal`] shape
//! the token gate produces.
//!
//! [`Principal`]: crate::auth::Principal

pub mod directory;
pub mod error;
pub mod exchanger;
pub mod provider;


pub use directory::{
    DirectoryError, ExchangeResult, ProviderDirectory, SessionEstablisher, UserDirectory,
    UserRecord,
};
pub use error::FederationError;
pub use exchanger::{http_client, AuthorizationCodePayload, FederatedSession, FederationExchanger};
pub use provider::{IdentityProviderDescriptor, OrganizationScope};
