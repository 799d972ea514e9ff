// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

use axum::{
    extract::{FromRequest, FromRequestParts},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    IntoParams, Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthenticatedWallet, ADMIN_KEY_HEADER},
    error::ApiError,
    events::{EventType, GameOutcome},
    models::WalletAddress,
    progression::{LevelProgress, VipTier},
    referral::ReferralCode,
    service::leaderboard::{LeaderboardMetric, LeaderboardPeriod},
    state::AppState,
    storage::{LeaderboardEntry, StoredChain},
};

pub mod activity;
pub mod auth;
pub mod chains;
pub mod events;
pub mod games;
pub mod health;
pub mod leaderboard;
pub mod referrals;
pub mod users;

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `?chainId=` with the configured default as fallback.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ChainQuery {
    pub chain_id: Option<u64>,
}

impl ChainQuery {
    pub fn resolve(&self, state: &AppState) -> u64 {
        self.chain_id.unwrap_or(state.default_chain_id)
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/chains", get(chains::list_chains))
        .route("/users", post(users::register_user))
        .route("/users/{wallet}", get(users::get_user).put(users::update_user))
        .route("/users/{wallet}/stats", get(users::get_user_stats))
        .route("/users/{wallet}/games", get(users::get_user_games))
        .route("/games", post(games::ingest_game))
        .route("/referrals/validate/{code}", get(referrals::validate_code))
        .route("/referrals/apply", post(referrals::apply_referral))
        .route("/referrals/claim", post(referrals::claim_earnings))
        .route("/referrals/{wallet}", get(referrals::get_referral_summary))
        .route("/referrals/{wallet}/earnings", get(referrals::list_earnings))
        .route("/leaderboard/regenerate", post(leaderboard::regenerate))
        .route("/leaderboard/live/{metric}", get(leaderboard::get_live_leaderboard))
        .route("/leaderboard/{period}", get(leaderboard::get_leaderboard))
        .route("/events", post(events::log_event))
        .route("/events/funnel", get(events::get_funnel))
        .route("/activity/recent", get(activity::recent))
        .route("/activity/stats", get(activity::stats))
        .route("/auth/nonce", get(auth::get_nonce))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/me", get(auth::me));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "admin_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ADMIN_KEY_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        chains::list_chains,
        users::register_user,
        users::get_user,
        users::update_user,
        users::get_user_stats,
        users::get_user_games,
        games::ingest_game,
        referrals::validate_code,
        referrals::get_referral_summary,
        referrals::list_earnings,
        referrals::apply_referral,
        referrals::claim_earnings,
        leaderboard::get_leaderboard,
        leaderboard::get_live_leaderboard,
        leaderboard::regenerate,
        events::log_event,
        events::get_funnel,
        activity::recent,
        activity::stats,
        auth::get_nonce,
        auth::verify,
        auth::me
    ),
    components(
        schemas(
            WalletAddress,
            ReferralCode,
            GameOutcome,
            EventType,
            VipTier,
            LevelProgress,
            LeaderboardPeriod,
            LeaderboardMetric,
            LeaderboardEntry,
            StoredChain,
            AuthenticatedWallet,
            health::ReadyResponse,
            health::HealthResponse,
            chains::ChainsResponse,
            users::RegisterUserRequest,
            users::UpdateUserRequest,
            users::UserProfile,
            users::UserStatsResponse,
            users::UserGamesResponse,
            games::IngestGameRequest,
            games::IngestGameResponse,
            games::GameResponse,
            referrals::ValidateCodeResponse,
            referrals::ReferralSummaryResponse,
            referrals::EarningsResponse,
            referrals::ApplyReferralRequest,
            referrals::ClaimResponse,
            leaderboard::LeaderboardResponse,
            leaderboard::LiveLeaderboardResponse,
            leaderboard::RegenerateResponse,
            events::LogEventRequest,
            events::LogEventResponse,
            events::FunnelResponse,
            activity::ActivityResponse,
            activity::PlatformStatsResponse,
            auth::NonceResponse,
            auth::VerifyRequest,
            auth::VerifyResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Chains", description = "Supported chains"),
        (name = "Users", description = "Player profiles and progression"),
        (name = "Games", description = "Settled round ingestion"),
        (name = "Referrals", description = "Two-tier referral program"),
        (name = "Leaderboard", description = "Periodic and live rankings"),
        (name = "Events", description = "Client analytics and funnel"),
        (name = "Activity", description = "Public feed and platform totals"),
        (name = "Auth", description = "Wallet signature sign-in")
    )
)]
pub struct ApiDoc;


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::{body_json, send};

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::for_tests());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn openapi_lists_security_schemes() {
        let app = router(AppState::for_tests());
        let response = send(&app, axum::http::Method::GET, "/api-doc/openapi.json", &[]).await;
        let doc = body_json(response).await;
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
        assert_eq!(doc["components"]["securitySchemes"]["admin_key"]["name"], ADMIN_KEY_HEADER);
        assert!(doc["paths"]["/api/leaderboard/{period}"].is_object());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = router(AppState::for_tests());
        let response = send(&app, axum::http::Method::GET, "/health/live", &[]).await;
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn rejections_use_api_error_shape() {
        let app = router(AppState::for_tests());
        let response = test_support::send_json(
            &app,
            axum::http::Method::POST,
            "/api/events",
            serde_json::json!({ "nope": true }),
            &[],
        )
        .await;
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }
}
