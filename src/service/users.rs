// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Player registration, profiles and referral linking.

use chrono::{DateTime, Utc};
use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::models::{round2, validate_display_name, WalletAddress};
use crate::referral::ReferralCode;
use crate::storage::{CasinoDb, StoreError, StoredUser, UserRepository};

/// Resolve a referral code to the referrer's wallet for `wallet` on `chain_id`.
fn resolve_referrer(
    db: &CasinoDb,
    chain_id: u64,
    wallet: &WalletAddress,
    code: &str,
) -> ServiceResult<WalletAddress> {
    let code = ReferralCode::parse(code)?;
    let referrer = UserRepository::new(db)
        .get_by_referral_code(&code)?
        .ok_or(ServiceError::NotFound("Referral code"))?;

    if referrer.chain_id != chain_id {
        return Err(ServiceError::BadRequest(
            "Referral code belongs to another chain".to_string(),
        ));
    }
    if &referrer.wallet_address == wallet {
        return Err(ServiceError::BadRequest("Cannot refer yourself".to_string()));
    }
    Ok(referrer.wallet_address)
}

/// Register a player, or return the existing record.
///
/// Returns `(user, created)`.
pub fn register(
    db: &CasinoDb,
    chain_id: u64,
    wallet: &WalletAddress,
    display_name: Option<&str>,
    referral_code: Option<&str>,
    now: DateTime<Utc>,
) -> ServiceResult<(StoredUser, bool)> {
    let repo = UserRepository::new(db);
    if let Some(existing) = repo.get(chain_id, wallet)? {
        return Ok((existing, false));
    }

    let display_name = display_name.map(validate_display_name).transpose()?;
    let referrer = referral_code
        .map(|code| resolve_referrer(db, chain_id, wallet, code))
        .transpose()?;

    match repo.create(chain_id, wallet, display_name, referrer.as_ref(), now) {
        Ok(user) => {
            info!(
                wallet = %user.wallet_address,
                chain_id,
                referred = user.referred_by.is_some(),
                "User registered"
            );
            Ok((user, true))
        }
        // Lost a race with a concurrent registration of the same wallet.
        Err(StoreError::Conflict(_)) => repo
            .get(chain_id, wallet)?
            .map(|user| (user, false))
            .ok_or(ServiceError::NotFound("User")),
        Err(e) => Err(e.into()),
    }
}

/// Fetch a player, registering them without a referrer if unknown.
pub fn ensure_user(
    db: &CasinoDb,
    chain_id: u64,
    wallet: &WalletAddress,
    now: DateTime<Utc>,
) -> ServiceResult<StoredUser> {
    register(db, chain_id, wallet, None, None, now).map(|(user, _)| user)
}

pub fn get_user(db: &CasinoDb, chain_id: u64, wallet: &WalletAddress) -> ServiceResult<StoredUser> {
    UserRepository::new(db)
        .get(chain_id, wallet)?
        .ok_or(ServiceError::NotFound("User"))
}

pub fn update_display_name(
    db: &CasinoDb,
    chain_id: u64,
    wallet: &WalletAddress,
    raw: &str,
    now: DateTime<Utc>,
) -> ServiceResult<StoredUser> {
    let name = validate_display_name(raw)?;
    match UserRepository::new(db).update_display_name(chain_id, wallet, name, now) {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound(_)) => Err(ServiceError::NotFound("User")),
        Err(e) => Err(e.into()),
    }
}

/// Link an authenticated player to a referrer after registration.
pub fn apply_referral(
    db: &CasinoDb,
    chain_id: u64,
    wallet: &WalletAddress,
    code: &str,
    now: DateTime<Utc>,
) -> ServiceResult<StoredUser> {
    let referrer = resolve_referrer(db, chain_id, wallet, code)?;
    ensure_user(db, chain_id, wallet, now)?;
    let user = UserRepository::new(db).set_referrer(chain_id, wallet, &referrer, now)?;
    info!(wallet = %wallet, referrer = %referrer, chain_id, "Referral applied");
    Ok(user)
}

/// Aggregate play statistics for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub games_played: u64,
    pub games_won: u64,
    /// Percentage of rounds won, two decimals.
    pub win_rate: f64,
    pub total_wagered: u128,
    pub total_payout: u128,
    pub profit: i128,
}

pub fn stats(user: &StoredUser) -> UserStats {
    let win_rate = if user.games_played == 0 {
        0.0
    } else {
        round2(user.games_won as f64 / user.games_played as f64 * 100.0)
    };
    UserStats {
        games_played: user.games_played,
        games_won: user.games_won,
        win_rate,
        total_wagered: user.total_wagered,
        total_payout: user.total_payout,
        profit: user.profit(),
    }
}
