// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, Principal};

/// Response for GET /user
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// Local user ID (token subject)
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Granted authorities, in token order
    pub authorities: Vec<String>,
}

impl From<Principal> for UserMeResponse {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            email: principal.email,
            first_name: principal.first_name,
            last_name: principal.last_name,
            authorities: principal.authorities,
        }
    }
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/user",
    tag = "Users",
    security(("bearer" = []), ("cookie" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(principal): Auth) -> Json<UserMeResponse> {
    Json(principal.into())
}
