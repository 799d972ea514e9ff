// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Leaderboard endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{ApiPath, ApiQuery, ChainQuery};
use crate::auth::AdminAccess;
use crate::error::ApiError;
use crate::service::leaderboard::{self, LeaderboardMetric, LeaderboardPeriod};
use crate::state::AppState;
use crate::storage::LeaderboardEntry;

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// `wagered` (default), `profit`, `wins` or `xp`.
    pub metric: Option<String>,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub period: LeaderboardPeriod,
    pub metric: LeaderboardMetric,
    pub chain_id: u64,
    pub entries: Vec<LeaderboardEntry>,
    /// `null` until the first snapshot has been generated.
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveLeaderboardResponse {
    pub metric: LeaderboardMetric,
    pub chain_id: u64,
    pub entries: Vec<LeaderboardEntry>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateResponse {
    pub snapshots: usize,
    pub generated_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/leaderboard/{period}",
    tag = "Leaderboard",
    params(
        ("period" = String, Path, description = "`daily`, `weekly`, `monthly` or `all_time`"),
        LeaderboardQuery
    ),
    responses(
        (status = 200, body = LeaderboardResponse),
        (status = 400, description = "Unknown period or metric")
    )
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    ApiPath(period): ApiPath<String>,
    ApiQuery(query): ApiQuery<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let period: LeaderboardPeriod = period.parse()?;
    let metric: LeaderboardMetric = match query.metric.as_deref() {
        Some(raw) => raw.parse()?,
        None => LeaderboardMetric::default(),
    };
    let chain_id = query.chain_id.unwrap_or(state.default_chain_id);

    let snapshot = leaderboard::get_snapshot(&state.db, chain_id, period, metric)?;
    let (entries, generated_at) = match snapshot {
        Some(s) => (s.entries, Some(s.generated_at)),
        None => (Vec::new(), None),
    };

    Ok(Json(LeaderboardResponse {
        period,
        metric,
        chain_id,
        entries,
        generated_at,
    }))
}

/// All-time ranking computed on request, cached briefly.
#[utoipa::path(
    get,
    path = "/api/leaderboard/live/{metric}",
    tag = "Leaderboard",
    params(
        ("metric" = String, Path, description = "`wagered`, `profit`, `wins` or `xp`"),
        ChainQuery
    ),
    responses(
        (status = 200, body = LiveLeaderboardResponse),
        (status = 400, description = "Unknown metric")
    )
)]
pub async fn get_live_leaderboard(
    State(state): State<AppState>,
    ApiPath(metric): ApiPath<String>,
    ApiQuery(query): ApiQuery<ChainQuery>,
) -> Result<Json<LiveLeaderboardResponse>, ApiError> {
    let metric: LeaderboardMetric = metric.parse()?;
    let chain_id = query.resolve(&state);

    let ranking = leaderboard::live(
        &state.db,
        &state.live_leaderboards,
        chain_id,
        metric,
        state.leaderboard_size,
        Utc::now(),
    )?;

    Ok(Json(LiveLeaderboardResponse {
        metric,
        chain_id,
        entries: ranking.entries,
        generated_at: ranking.generated_at,
    }))
}

/// Regenerate every snapshot for the configured chains now.
#[utoipa::path(
    post,
    path = "/api/leaderboard/regenerate",
    tag = "Leaderboard",
    security(("admin_key" = [])),
    responses(
        (status = 200, body = RegenerateResponse),
        (status = 401, description = "Missing admin key"),
        (status = 403, description = "Invalid admin key"),
        (status = 503, description = "Admin API not configured")
    )
)]
pub async fn regenerate(
    State(state): State<AppState>,
    _admin: AdminAccess,
) -> Result<Json<RegenerateResponse>, ApiError> {
    let now = Utc::now();
    let chain_ids = leaderboard::active_chain_ids(&state.db, state.default_chain_id)?;
    let snapshots =
        leaderboard::regenerate_all(&state.db, &chain_ids, state.leaderboard_size, now)?;
    state.live_leaderboards.clear();

    Ok(Json(RegenerateResponse {
        snapshots,
        generated_at: now,
    }))
}
