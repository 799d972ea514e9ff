// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Settled-round ingestion (admin only).

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ApiJson;
use crate::auth::AdminAccess;
use crate::error::ApiError;
use crate::events::GameOutcome;
use crate::models::{amount, parse_amount, WalletAddress};
use crate::service::games::{record_round, RecordedRound, SettledRound};
use crate::state::AppState;
use crate::storage::StoredGame;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestGameRequest {
    pub wallet_address: String,
    pub chain_id: Option<u64>,
    /// Wager in wei, decimal string.
    #[schema(example = "10000000000000000")]
    pub bet_amount: String,
    /// Amount paid back to the player in wei, decimal string.
    #[schema(example = "20000000000000000")]
    pub payout: String,
    pub outcome: GameOutcome,
    /// Settlement transaction; re-ingesting the same hash is a no-op.
    pub tx_hash: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: Uuid,
    pub chain_id: u64,
    pub wallet_address: WalletAddress,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub bet_amount: u128,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub payout: u128,
    pub outcome: GameOutcome,
    pub xp_awarded: u64,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StoredGame> for GameResponse {
    fn from(game: StoredGame) -> Self {
        Self {
            id: game.id,
            chain_id: game.chain_id,
            wallet_address: game.wallet_address,
            bet_amount: game.bet_amount,
            payout: game.payout,
            outcome: game.outcome,
            xp_awarded: game.xp_awarded,
            tx_hash: game.tx_hash,
            created_at: game.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestGameResponse {
    /// False when the `txHash` was already ingested.
    pub recorded: bool,
    pub game: GameResponse,
    /// Player level after the round; absent for duplicates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Referral earnings accrued by this round.
    pub referral_earnings: usize,
}

#[utoipa::path(
    post,
    path = "/api/games",
    tag = "Games",
    security(("admin_key" = [])),
    request_body = IngestGameRequest,
    responses(
        (status = 201, description = "Round recorded", body = IngestGameResponse),
        (status = 200, description = "Duplicate txHash, nothing changed", body = IngestGameResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing admin key"),
        (status = 403, description = "Invalid admin key"),
        (status = 503, description = "Admin API not configured")
    )
)]
pub async fn ingest_game(
    State(state): State<AppState>,
    _admin: AdminAccess,
    ApiJson(request): ApiJson<IngestGameRequest>,
) -> Result<(StatusCode, Json<IngestGameResponse>), ApiError> {
    let round = SettledRound {
        chain_id: request.chain_id.unwrap_or(state.default_chain_id),
        wallet: WalletAddress::parse(&request.wallet_address)?,
        bet_amount: parse_amount(&request.bet_amount)?,
        payout: parse_amount(&request.payout)?,
        outcome: request.outcome,
        tx_hash: request.tx_hash.map(|h| h.trim().to_ascii_lowercase()),
        settled_at: request.settled_at,
    };

    let (status, body) = match record_round(&state.db, round, Utc::now())? {
        RecordedRound::New { game, user, earnings } => (
            StatusCode::CREATED,
            IngestGameResponse {
                recorded: true,
                game: game.into(),
                level: Some(user.level),
                referral_earnings: earnings.len(),
            },
        ),
        RecordedRound::Duplicate(game) => (
            StatusCode::OK,
            IngestGameResponse {
                recorded: false,
                game: game.into(),
                level: None,
                referral_earnings: 0,
            },
        ),
    };
    Ok((status, Json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::api::test_support::{admin_key, admin_state, body_json, send_json};
    use crate::auth::ADMIN_KEY_HEADER;
    use axum::http::Method;
    use serde_json::json;

    fn round(tx_hash: &str) -> serde_json::Value {
        json!({
            "walletAddress": "0x1111111111111111111111111111111111111111",
            "betAmount": "10000000000000000",
            "payout": "25000000000000000",
            "outcome": "blackjack",
            "txHash": tx_hash,
        })
    }

    #[tokio::test]
    async fn ingest_is_idempotent_on_tx_hash() {
        let app = router(admin_state());
        let hash = format!("0x{}", "ab".repeat(32));
        let headers = [admin_key()];

        let first = send_json(&app, Method::POST, "/api/games", round(&hash), &headers).await;
        assert_eq!(first.status(), StatusCode::CREATED);
        let first = body_json(first).await;
        assert_eq!(first["recorded"], true);
        assert_eq!(first["game"]["xpAwarded"], 26);
        assert_eq!(first["game"]["betAmount"], "10000000000000000");

        let second = send_json(&app, Method::POST, "/api/games", round(&hash), &headers).await;
        assert_eq!(second.status(), StatusCode::OK);
        let second = body_json(second).await;
        assert_eq!(second["recorded"], false);
        assert_eq!(second["game"]["id"], first["game"]["id"]);
    }

    #[tokio::test]
    async fn ingest_requires_admin_key() {
        let app = router(admin_state());
        let hash = format!("0x{}", "cd".repeat(32));

        let missing = send_json(&app, Method::POST, "/api/games", round(&hash), &[]).await;
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = send_json(
            &app,
            Method::POST,
            "/api/games",
            round(&hash),
            &[(ADMIN_KEY_HEADER, "nope".to_string())],
        )
        .await;
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

        let unconfigured = router(AppState::for_tests());
        let response = send_json(
            &unconfigured,
            Method::POST,
            "/api/games",
            round(&hash),
            &[admin_key()],
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn rejects_signed_amounts() {
        let app = router(admin_state());
        let mut body = round(&format!("0x{}", "ef".repeat(32)));
        body["betAmount"] = json!("-5");
        let response = send_json(&app, Method::POST, "/api/games", body, &[admin_key()]).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
