// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login and profile routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileUpdate, User};
use crate::routes::{json_body, validated};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Login is public; everything else here sits behind `require_auth`.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/login", post(login))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/profile", get(get_profile).put(update_profile))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// One-time code from `wx.login`
    #[validate(length(min = 1, max = 128))]
    pub code: String,
    /// Profile data the client already has, applied as a partial update
    #[serde(default)]
    #[validate(nested)]
    pub user_info: Option<ProfileUpdate>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

/// Exchange a login code for a session token, creating the user on first login.
async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let request = validated(json_body(payload)?)?;

    let identity = state.identity.exchange(&request.code).await?;
    let now = now_rfc3339();

    let existing = state.db.get_user_by_openid(&identity.openid).await?;
    let user = match existing {
        Some(user) => user,
        None => {
            let user = User::new(
                identity.openid.clone(),
                identity.unionid.clone(),
                request.user_info.as_ref(),
                &now,
            );
            if state.db.create_user(&user).await? {
                tracing::info!(user_id = %user.id, "Created user on first login");
                return issue_session(&state, user);
            }
            // Lost a race with a concurrent first login for the same openid.
            state
                .db
                .get_user_by_openid(&identity.openid)
                .await?
                .ok_or_else(|| AppError::Database("user vanished after create".to_string()))?
        }
    };

    let mut user = user;
    // Backfilled once; never overwritten after that.
    if user.unionid.is_none() && identity.unionid.is_some() {
        user.unionid = identity.unionid;
        user.updated_at = Some(now.clone());
        state.db.update_user(&user).await?;
    }
    let profile_updated = match &request.user_info {
        Some(info) if !info.is_empty() => {
            user = state
                .db
                .update_profile(&user.id, info, &now)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
            true
        }
        _ => false,
    };

    tracing::info!(user_id = %user.id, profile_updated, "User logged in");
    issue_session(&state, user)
}

fn issue_session(state: &AppState, user: User) -> Result<Json<LoginResponse>> {
    let access_token = state.tokens.issue_default(&user.id)?;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user,
    }))
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_profile(Extension(auth): Extension<AuthUser>) -> Json<User> {
    Json(auth.user)
}

/// Apply a partial profile update; absent fields are left untouched.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<User>> {
    let update = validated(json_body(payload)?)?;
    if update.is_empty() {
        return Ok(Json(auth.user));
    }

    let user = state
        .db
        .update_profile(&auth.user_id, &update, &now_rfc3339())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    tracing::info!(user_id = %auth.user_id, "Profile updated");

    Ok(Json(user))
}
