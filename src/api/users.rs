// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Player profile endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{games::GameResponse, ApiJson, ApiPath, ApiQuery, ChainQuery};
use crate::auth::{AuthError, WalletAuth};
use crate::error::ApiError;
use crate::models::{amount, clamp_limit, signed_amount, WalletAddress};
use crate::progression::{level_progress, LevelProgress, VipTier};
use crate::referral::ReferralCode;
use crate::service::{games, users};
use crate::state::AppState;
use crate::storage::StoredUser;

pub const DEFAULT_GAMES_LIMIT: usize = 20;
pub const MAX_GAMES_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[schema(example = "0x742d35cc6634c0532925a3b844bc9e7595f4ab12")]
    pub wallet_address: String,
    /// Defaults to the server's chain.
    pub chain_id: Option<u64>,
    pub display_name: Option<String>,
    #[schema(example = "VYRE2024")]
    pub referral_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub wallet_address: WalletAddress,
    pub chain_id: u64,
    pub display_name: Option<String>,
    pub xp: u64,
    pub level: u32,
    pub vip_tier: VipTier,
    pub referral_code: ReferralCode,
    pub referred_by: Option<WalletAddress>,
    pub games_played: u64,
    pub games_won: u64,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub total_wagered: u128,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub total_payout: u128,
    pub progress: LevelProgress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for UserProfile {
    fn from(user: StoredUser) -> Self {
        Self {
            progress: level_progress(user.xp),
            wallet_address: user.wallet_address,
            chain_id: user.chain_id,
            display_name: user.display_name,
            xp: user.xp,
            level: user.level,
            vip_tier: user.vip_tier,
            referral_code: user.referral_code,
            referred_by: user.referred_by,
            games_played: user.games_played,
            games_won: user.games_won,
            total_wagered: user.total_wagered,
            total_payout: user.total_payout,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub wallet_address: WalletAddress,
    pub chain_id: u64,
    pub level: u32,
    pub xp: u64,
    pub games_played: u64,
    pub games_won: u64,
    /// Percentage, two decimals.
    pub win_rate: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub total_wagered: u128,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub total_payout: u128,
    /// Payout minus wagered; may be negative.
    #[serde(with = "signed_amount")]
    #[schema(value_type = String, example = "-250000000000000000")]
    pub profit: i128,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GamesQuery {
    pub chain_id: Option<u64>,
    /// Default 20, max 100.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserGamesResponse {
    pub wallet_address: WalletAddress,
    pub games: Vec<GameResponse>,
}

/// Register a player, or return the existing profile.
///
/// A bare wallet registers anonymously. Setting `displayName` or
/// `referralCode` needs a session owned by `walletAddress`.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    security((), ("bearer" = [])),
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 200, description = "User already registered", body = UserProfile),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Profile details sent without a session"),
        (status = 403, description = "Session belongs to another wallet"),
        (status = 404, description = "Referral code not found")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    session: Option<WalletAuth>,
    ApiJson(request): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let wallet = WalletAddress::parse(&request.wallet_address)?;
    let chain_id = request.chain_id.unwrap_or(state.default_chain_id);

    if request.display_name.is_some() || request.referral_code.is_some() {
        let Some(WalletAuth(session)) = session else {
            return Err(match state.jwt {
                Some(_) => AuthError::MissingAuthHeader,
                None => AuthError::NotConfigured,
            }
            .into());
        };
        if !session.owns(&wallet) {
            return Err(ApiError::forbidden("Cannot register another user's profile"));
        }
    }

    let (user, created) = users::register(
        &state.db,
        chain_id,
        &wallet,
        request.display_name.as_deref(),
        request.referral_code.as_deref(),
        Utc::now(),
    )?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/users/{wallet}",
    tag = "Users",
    params(("wallet" = String, Path, description = "Wallet address"), ChainQuery),
    responses(
        (status = 200, body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(wallet): ApiPath<String>,
    ApiQuery(query): ApiQuery<ChainQuery>,
) -> Result<Json<UserProfile>, ApiError> {
    let wallet = WalletAddress::parse(&wallet)?;
    let user = users::get_user(&state.db, query.resolve(&state), &wallet)?;
    Ok(Json(user.into()))
}

/// Change the caller's display name.
#[utoipa::path(
    put,
    path = "/api/users/{wallet}",
    tag = "Users",
    security(("bearer" = [])),
    params(("wallet" = String, Path, description = "Wallet address")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, body = UserProfile),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Session belongs to another wallet"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    WalletAuth(session): WalletAuth,
    ApiPath(wallet): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let wallet = WalletAddress::parse(&wallet)?;
    if !session.owns(&wallet) {
        return Err(ApiError::forbidden("Cannot modify another user's profile"));
    }

    let user = users::update_display_name(
        &state.db,
        session.chain_id,
        &wallet,
        &request.display_name,
        Utc::now(),
    )?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/api/users/{wallet}/stats",
    tag = "Users",
    params(("wallet" = String, Path, description = "Wallet address"), ChainQuery),
    responses(
        (status = 200, body = UserStatsResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_stats(
    State(state): State<AppState>,
    ApiPath(wallet): ApiPath<String>,
    ApiQuery(query): ApiQuery<ChainQuery>,
) -> Result<Json<UserStatsResponse>, ApiError> {
    let wallet = WalletAddress::parse(&wallet)?;
    let user = users::get_user(&state.db, query.resolve(&state), &wallet)?;
    let stats = users::stats(&user);

    Ok(Json(UserStatsResponse {
        wallet_address: user.wallet_address,
        chain_id: user.chain_id,
        level: user.level,
        xp: user.xp,
        games_played: stats.games_played,
        games_won: stats.games_won,
        win_rate: stats.win_rate,
        total_wagered: stats.total_wagered,
        total_payout: stats.total_payout,
        profit: stats.profit,
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/{wallet}/games",
    tag = "Users",
    params(("wallet" = String, Path, description = "Wallet address"), GamesQuery),
    responses((status = 200, body = UserGamesResponse))
)]
pub async fn get_user_games(
    State(state): State<AppState>,
    ApiPath(wallet): ApiPath<String>,
    ApiQuery(query): ApiQuery<GamesQuery>,
) -> Result<Json<UserGamesResponse>, ApiError> {
    let wallet = WalletAddress::parse(&wallet)?;
    let chain_id = query.chain_id.unwrap_or(state.default_chain_id);
    let limit = clamp_limit(query.limit, DEFAULT_GAMES_LIMIT, MAX_GAMES_LIMIT);

    let games = games::recent_for_wallet(&state.db, chain_id, &wallet, limit)?;
    Ok(Json(UserGamesResponse {
        wallet_address: wallet,
        games: games.into_iter().map(GameResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{bearer, body_json, send, send_json, signed_in_state};
    use crate::api::router;
    use axum::http::Method;
    use serde_json::json;

    const WALLET: &str = "0x742d35cc6634c0532925a3b844bc9e7595f4ab12";

    #[tokio::test]
    async fn register_then_fetch() {
        let (state, token) = signed_in_state(WALLET);
        let app = router(state);

        let response = send_json(
            &app,
            Method::POST,
            "/api/users",
            json!({ "walletAddress": "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12", "displayName": "Ace" }),
            &[bearer(&token)],
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["walletAddress"], WALLET);
        assert_eq!(created["level"], 0);
        assert_eq!(created["totalWagered"], "0");
        assert_eq!(created["progress"]["nextLevelXp"], 50);

        let again = send_json(&app, Method::POST, "/api/users", json!({ "walletAddress": WALLET }), &[]).await;
        assert_eq!(again.status(), StatusCode::OK);

        let fetched = send(&app, Method::GET, &format!("/api/users/{WALLET}"), &[]).await;
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(body_json(fetched).await["displayName"], "Ace");
    }

    #[tokio::test]
    async fn profile_details_need_the_owners_session() {
        let referrer = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let (state, token) = signed_in_state(WALLET);
        let stranger = state
            .jwt
            .as_ref()
            .unwrap()
            .issue(&WalletAddress::parse(referrer).unwrap(), 8453, Utc::now())
            .unwrap()
            .token;
        let app = router(state);

        let created = send_json(&app, Method::POST, "/api/users", json!({ "walletAddress": referrer }), &[]).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let code = body_json(created).await["referralCode"].as_str().unwrap().to_string();

        let body = json!({ "walletAddress": WALLET, "referralCode": code, "displayName": "pwned" });
        let anonymous = send_json(&app, Method::POST, "/api/users", body.clone(), &[]).await;
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
        let foreign = send_json(&app, Method::POST, "/api/users", body, &[bearer(&stranger)]).await;
        assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

        let missing = send(&app, Method::GET, &format!("/api/users/{WALLET}"), &[]).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let owned = send_json(
            &app,
            Method::POST,
            "/api/users",
            json!({ "walletAddress": WALLET, "referralCode": code }),
            &[bearer(&token)],
        )
        .await;
        assert_eq!(owned.status(), StatusCode::CREATED);
        assert_eq!(body_json(owned).await["referredBy"], referrer);
    }

    #[tokio::test]
    async fn profile_details_without_sign_in_configured_is_503() {
        let app = router(AppState::for_tests());
        let response = send_json(
            &app,
            Method::POST,
            "/api/users",
            json!({ "walletAddress": WALLET, "displayName": "Ace" }),
            &[],
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_user_is_404() {
        let app = router(AppState::for_tests());
        let response = send(&app, Method::GET, &format!("/api/users/{WALLET}"), &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "User not found" }));
    }

    #[tokio::test]
    async fn malformed_wallet_is_400() {
        let app = router(AppState::for_tests());
        let response = send(&app, Method::GET, "/api/users/0x1234", &[]).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send_json(&app, Method::POST, "/api/users", json!({ "walletAddress": "nope" }), &[]).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid wallet address format");
    }

    #[tokio::test]
    async fn update_requires_owning_session() {
        let (state, token) = signed_in_state(WALLET);
        let app = router(state);
        send_json(&app, Method::POST, "/api/users", json!({ "walletAddress": WALLET }), &[]).await;

        let body = json!({ "displayName": "High Roller" });
        let anonymous = send_json(&app, Method::PUT, &format!("/api/users/{WALLET}"), body.clone(), &[]).await;
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let other = "0x1111111111111111111111111111111111111111";
        let forbidden = send_json(
            &app,
            Method::PUT,
            &format!("/api/users/{other}"),
            body.clone(),
            &[bearer(&token)],
        )
        .await;
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let ok = send_json(&app, Method::PUT, &format!("/api/users/{WALLET}"), body, &[bearer(&token)]).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_json(ok).await["displayName"], "High Roller");

        let invalid = send_json(
            &app,
            Method::PUT,
            &format!("/api/users/{WALLET}"),
            json!({ "displayName": "<script>" }),
            &[bearer(&token)],
        )
        .await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stats_and_games_for_new_player() {
        let app = router(AppState::for_tests());
        send_json(&app, Method::POST, "/api/users", json!({ "walletAddress": WALLET }), &[]).await;

        let stats = send(&app, Method::GET, &format!("/api/users/{WALLET}/stats"), &[]).await;
        assert_eq!(stats.status(), StatusCode::OK);
        let stats = body_json(stats).await;
        assert_eq!(stats["winRate"], 0.0);
        assert_eq!(stats["profit"], "0");

        let games = send(&app, Method::GET, &format!("/api/users/{WALLET}/games?limit=5"), &[]).await;
        assert_eq!(games.status(), StatusCode::OK);
        assert_eq!(body_json(games).await["games"], json!([]));
    }
}
