// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Public activity feed and platform totals.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{games::GameResponse, ApiQuery};
use crate::error::ApiError;
use crate::models::{amount, clamp_limit};
use crate::service::activity::{self, DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// Default 20, max 100.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItemResponse {
    #[serde(flatten)]
    pub game: GameResponse,
    /// `0x1234…abcd`
    pub short_address: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityResponse {
    pub items: Vec<ActivityItemResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatsResponse {
    pub total_games: u64,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub total_wagered: u128,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub total_payout: u128,
    pub unique_players: u64,
    #[serde(rename = "games24h")]
    pub games_24h: u64,
    #[serde(rename = "wagered24h", with = "amount")]
    #[schema(value_type = String)]
    pub wagered_24h: u128,
}

#[utoipa::path(
    get,
    path = "/api/activity/recent",
    tag = "Activity",
    params(ActivityQuery),
    responses((status = 200, body = ActivityResponse))
)]
pub async fn recent(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let limit = clamp_limit(query.limit, DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT);
    let items = activity::recent(&state.db, limit)?
        .into_iter()
        .map(|item| ActivityItemResponse {
            game: item.game.into(),
            short_address: item.short_address,
            display_name: item.display_name,
        })
        .collect();
    Ok(Json(ActivityResponse { items }))
}

#[utoipa::path(
    get,
    path = "/api/activity/stats",
    tag = "Activity",
    responses((status = 200, body = PlatformStatsResponse))
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<PlatformStatsResponse>, ApiError> {
    let stats = activity::stats(&state.db, &state.platform_stats, Utc::now())?;
    Ok(Json(PlatformStatsResponse {
        total_games: stats.total_games,
        total_wagered: stats.total_wagered,
        total_payout: stats.total_payout,
        unique_players: stats.unique_players,
        games_24h: stats.games_24h,
        wagered_24h: stats.wagered_24h,
    }))
}
