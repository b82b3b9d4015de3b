// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in routes (require authentication via bearer token).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CheckinRecord, CheckinStats, NewCheckin};
use crate::routes::{json_body, validated, MessageResponse};
use crate::services::stats::{stats_now, today_bounds_now};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Default page size for record listings.
pub const DEFAULT_LIST_LIMIT: u32 = 100;
/// Hard ceiling on the page size a client may request.
pub const MAX_LIST_LIMIT: u32 = 500;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/checkin", post(create_checkin))
        .route(
            "/api/checkin/records",
            get(list_checkins).delete(clear_checkins),
        )
        .route(
            "/api/checkin/records/{id}",
            get(get_checkin).delete(delete_checkin),
        )
        .route("/api/checkin/stats", get(get_stats))
        .route("/api/checkin/today", get(get_today))
}

fn record_not_found() -> AppError {
    AppError::NotFound("Check-in record not found".to_string())
}

// ─── Records ─────────────────────────────────────────────────

async fn create_checkin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: std::result::Result<Json<NewCheckin>, JsonRejection>,
) -> Result<Json<CheckinRecord>> {
    let new = validated(json_body(payload)?)?;

    let record = CheckinRecord::new(&auth.user_id, new, &now_rfc3339());
    state.db.create_checkin(&record).await?;

    tracing::info!(
        user_id = %auth.user_id,
        record_id = %record.id,
        checkin_type = %record.checkin_type,
        "Check-in recorded"
    );

    Ok(Json(record))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

/// List the caller's records, newest first.
async fn list_checkins(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<CheckinRecord>>> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let limit = params.limit.min(MAX_LIST_LIMIT);

    tracing::debug!(
        user_id = %auth.user_id,
        skip = params.skip,
        limit,
        "Fetching check-in records"
    );

    let records = state
        .db
        .list_checkins(&auth.user_id, params.skip, limit)
        .await?;
    Ok(Json(records))
}

async fn get_checkin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(record_id): Path<String>,
) -> Result<Json<CheckinRecord>> {
    state
        .db
        .get_checkin(&record_id, &auth.user_id)
        .await?
        .map(Json)
        .ok_or_else(record_not_found)
}

async fn delete_checkin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(record_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    if !state.db.delete_checkin(&record_id, &auth.user_id).await? {
        return Err(record_not_found());
    }

    tracing::info!(user_id = %auth.user_id, record_id = %record_id, "Check-in deleted");
    Ok(Json(MessageResponse {
        message: "deleted".to_string(),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClearResponse {
    pub message: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub deleted: usize,
}

/// Delete every record the caller owns.
async fn clear_checkins(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ClearResponse>> {
    let deleted = state.db.clear_checkins(&auth.user_id).await?;
    tracing::info!(user_id = %auth.user_id, deleted, "Cleared check-ins");

    Ok(Json(ClearResponse {
        message: "cleared".to_string(),
        deleted,
    }))
}

// ─── Stats ───────────────────────────────────────────────────

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<CheckinStats>> {
    let timestamps = state.db.checkin_timestamps(&auth.user_id).await?;
    Ok(Json(stats_now(timestamps, state.config.timezone)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TodayResponse {
    pub checked: bool,
}

/// Whether the caller has checked in today. Advisory only.
async fn get_today(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<TodayResponse>> {
    let (start, end) = today_bounds_now(state.config.timezone).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("could not resolve today's bounds"))
    })?;
    let checked = state
        .db
        .has_checkin_between(&auth.user_id, start, end)
        .await?;
    Ok(Json(TodayResponse { checked }))
}
