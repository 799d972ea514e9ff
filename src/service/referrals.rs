// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Referral dashboard and claims.

use chrono::{DateTime, Utc};
use tracing::info;

use super::{users::get_user, ServiceResult};
use crate::models::WalletAddress;
use crate::referral::{is_valid_referral_code, ReferralCode};
use crate::storage::{CasinoDb, ClaimResult, ReferralRepository, StoredEarning, UserRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralSummary {
    pub referral_code: ReferralCode,
    pub referred_by: Option<WalletAddress>,
    pub tier1_count: u64,
    pub tier2_count: u64,
    pub pending_earnings: u128,
    pub claimed_earnings: u128,
}

/// Whether `code` is well-formed and belongs to a registered player.
pub fn validate_code(db: &CasinoDb, code: &str) -> ServiceResult<bool> {
    if !is_valid_referral_code(code) {
        return Ok(false);
    }
    let code = ReferralCode::parse(code)?;
    Ok(UserRepository::new(db).get_by_referral_code(&code)?.is_some())
}

pub fn summary(db: &CasinoDb, chain_id: u64, wallet: &WalletAddress) -> ServiceResult<ReferralSummary> {
    let user = get_user(db, chain_id, wallet)?;
    let (tier1_count, tier2_count) = UserRepository::new(db).referee_counts(chain_id, wallet)?;
    let (pending_earnings, claimed_earnings) = ReferralRepository::new(db).totals(chain_id, wallet)?;

    Ok(ReferralSummary {
        referral_code: user.referral_code,
        referred_by: user.referred_by,
        tier1_count,
        tier2_count,
        pending_earnings,
        claimed_earnings,
    })
}

pub fn earnings(
    db: &CasinoDb,
    chain_id: u64,
    wallet: &WalletAddress,
    limit: usize,
) -> ServiceResult<Vec<StoredEarning>> {
    Ok(ReferralRepository::new(db).list(chain_id, wallet, limit)?)
}

/// Claim every pending earning of `wallet`.
pub fn claim(
    db: &CasinoDb,
    chain_id: u64,
    wallet: &WalletAddress,
    now: DateTime<Utc>,
) -> ServiceResult<ClaimResult> {
    let result = ReferralRepository::new(db).claim_all(chain_id, wallet, now)?;
    info!(
        wallet = %wallet,
        chain_id,
        count = result.count,
        amount = %result.amount,
        "Referral earnings claimed"
    );
    Ok(result)
}
