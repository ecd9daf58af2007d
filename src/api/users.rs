// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{ApiJson, AppState};
use crate::auth::{hash_password, verify_password};
use crate::error::{ApiResult, AppError};
use crate::models::{User, UserDetails};
use crate::store;
use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailBody {
    pub email: Option<String>,
}

fn required(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `local@domain` with a dotted domain and no whitespace or path separators.
fn plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
        && !email
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '\\')
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupBody>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let (Some(name), Some(email), Some(password)) = (
        required(&body.name),
        required(&body.email),
        body.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request("Name, email and password are required"));
    };
    if !plausible_email(email) {
        return Err(AppError::bad_request("Invalid email address"));
    }
    let (name, email, password) = (name.to_string(), email.to_lowercase(), password.to_string());

    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")??;
    let created = state.with_db(|conn| store::create_user(conn, &name, &email, &hash))?;
    match created {
        Some(user) => {
            tracing::info!(user_id = user.id, "user signed up");
            Ok((StatusCode::CREATED, Json(user)))
        }
        None => Err(AppError::Conflict("User already exists".into())),
    }
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> ApiResult<Json<User>> {
    let (Some(email), Some(password)) = (required(&body.email), body.password.as_deref()) else {
        return Err(AppError::bad_request("Email and password are required"));
    };
    let email = email.to_lowercase();
    let found = state.with_db(|conn| store::find_credentials(conn, &email))?;
    let invalid = || AppError::Unauthorized("Invalid email or password".into());
    let Some((user, stored)) = found else {
        return Err(invalid());
    };
    let password = password.to_string();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .context("Password verification task failed")??;
    if !verified {
        return Err(invalid());
    }
    Ok(Json(user))
}


pub async fn details(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EmailBody>,
) -> ApiResult<Json<UserDetails>> {
    let Some(email) = required(&body.email) else {
        return Err(AppError::bad_request("Email is required"));
    };
    let email = email.to_lowercase();
    state
        .with_db(|conn| store::user_details(conn, &email))?
        .map(Json)
        .ok_or_else(|| AppError::not_found("User not found"))
}
