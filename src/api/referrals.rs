// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Referral program endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{users::UserProfile, ApiJson, ApiPath, ApiQuery, ChainQuery};
use crate::auth::WalletAuth;
use crate::error::ApiError;
use crate::models::{amount, clamp_limit, WalletAddress};
use crate::referral::ReferralCode;
use crate::service::{referrals, users};
use crate::state::AppState;
use crate::storage::StoredEarning;

pub const DEFAULT_EARNINGS_LIMIT: usize = 50;
pub const MAX_EARNINGS_LIMIT: usize = 200;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidateCodeResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummaryResponse {
    pub wallet_address: WalletAddress,
    pub referral_code: ReferralCode,
    pub referred_by: Option<WalletAddress>,
    /// Direct referees.
    pub tier1_count: u64,
    /// Referees of direct referees.
    pub tier2_count: u64,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub pending_earnings: u128,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub claimed_earnings: u128,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarningResponse {
    pub id: Uuid,
    pub referee: WalletAddress,
    /// 1 for direct referrals, 2 for second-tier.
    pub tier: u8,
    pub game_id: Uuid,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub amount: u128,
    pub claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<StoredEarning> for EarningResponse {
    fn from(earning: StoredEarning) -> Self {
        Self {
            id: earning.id,
            referee: earning.referee,
            tier: earning.tier.into(),
            game_id: earning.game_id,
            amount: earning.amount,
            claimed: earning.claimed,
            claimed_at: earning.claimed_at,
            created_at: earning.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarningsResponse {
    pub wallet_address: WalletAddress,
    pub earnings: Vec<EarningResponse>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EarningsQuery {
    pub chain_id: Option<u64>,
    /// Default 50, max 200.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReferralRequest {
    #[schema(example = "VYRE2024")]
    pub referral_code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub claimed_count: usize,
    #[serde(with = "amount")]
    #[schema(value_type = String)]
    pub claimed_amount: u128,
}

#[utoipa::path(
    get,
    path = "/api/referrals/validate/{code}",
    tag = "Referrals",
    params(("code" = String, Path, description = "Referral code")),
    responses((status = 200, body = ValidateCodeResponse))
)]
pub async fn validate_code(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<ValidateCodeResponse>, ApiError> {
    let valid = referrals::validate_code(&state.db, &code)?;
    Ok(Json(ValidateCodeResponse { valid }))
}

#[utoipa::path(
    get,
    path = "/api/referrals/{wallet}",
    tag = "Referrals",
    params(("wallet" = String, Path, description = "Wallet address"), ChainQuery),
    responses(
        (status = 200, body = ReferralSummaryResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_referral_summary(
    State(state): State<AppState>,
    ApiPath(wallet): ApiPath<String>,
    ApiQuery(query): ApiQuery<ChainQuery>,
) -> Result<Json<ReferralSummaryResponse>, ApiError> {
    let wallet = WalletAddress::parse(&wallet)?;
    let summary = referrals::summary(&state.db, query.resolve(&state), &wallet)?;
    Ok(Json(ReferralSummaryResponse {
        wallet_address: wallet,
        referral_code: summary.referral_code,
        referred_by: summary.referred_by,
        tier1_count: summary.tier1_count,
        tier2_count: summary.tier2_count,
        pending_earnings: summary.pending_earnings,
        claimed_earnings: summary.claimed_earnings,
    }))
}

#[utoipa::path(
    get,
    path = "/api/referrals/{wallet}/earnings",
    tag = "Referrals",
    params(("wallet" = String, Path, description = "Wallet address"), EarningsQuery),
    responses((status = 200, body = EarningsResponse))
)]
pub async fn list_earnings(
    State(state): State<AppState>,
    ApiPath(wallet): ApiPath<String>,
    ApiQuery(query): ApiQuery<EarningsQuery>,
) -> Result<Json<EarningsResponse>, ApiError> {
    let wallet = WalletAddress::parse(&wallet)?;
    let chain_id = query.chain_id.unwrap_or(state.default_chain_id);
    let limit = clamp_limit(query.limit, DEFAULT_EARNINGS_LIMIT, MAX_EARNINGS_LIMIT);

    let earnings = referrals::earnings(&state.db, chain_id, &wallet, limit)?;
    Ok(Json(EarningsResponse {
        wallet_address: wallet,
        earnings: earnings.into_iter().map(EarningResponse::from).collect(),
    }))
}

/// Link the signed-in wallet to a referrer.
#[utoipa::path(
    post,
    path = "/api/referrals/apply",
    tag = "Referrals",
    security(("bearer" = [])),
    request_body = ApplyReferralRequest,
    responses(
        (status = 200, body = UserProfile),
        (status = 400, description = "Invalid code or self-referral"),
        (status = 404, description = "Referral code not found"),
        (status = 409, description = "Referrer already set or cycle")
    )
)]
pub async fn apply_referral(
    State(state): State<AppState>,
    WalletAuth(session): WalletAuth,
    ApiJson(request): ApiJson<ApplyReferralRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = users::apply_referral(
        &state.db,
        session.chain_id,
        &session.wallet_address,
        request.referral_code.trim(),
        Utc::now(),
    )?;
    Ok(Json(user.into()))
}

/// Mark every pending earning of the signed-in wallet as claimed.
#[utoipa::path(
    post,
    path = "/api/referrals/claim",
    tag = "Referrals",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ClaimResponse),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn claim_earnings(
    State(state): State<AppState>,
    WalletAuth(session): WalletAuth,
) -> Result<Json<ClaimResponse>, ApiError> {
    let result = referrals::claim(&state.db, session.chain_id, &session.wallet_address, Utc::now())?;
    Ok(Json(ClaimResponse {
        claimed_count: result.count,
        claimed_amount: result.amount,
    }))
}
