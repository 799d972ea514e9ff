// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Settled game rounds.
//!
//! Recording a round is the hottest write path: the game row, its indexes,
//! the player's XP and aggregates, and any referral earnings are all written
//! in one redb write transaction.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::referrals::StoredEarning;
use super::users::{create_in_txn, load_user, save_user, StoredUser};
use crate::events::GameOutcome;
use crate::models::{amount, WalletAddress};
use crate::referral::{referral_share, ReferralTier};
use crate::storage::db::{
    composite_key, decode, encode, make_prefix, make_prefix_end, time_key, time_key_upper,
    user_key, CasinoDb, StoreError, StoreResult, GAMES, GAME_TX_INDEX, REFERRAL_EARNINGS,
    WALLET_GAMES,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredGame {
    pub id: Uuid,
    pub chain_id: u64,
    pub wallet_address: WalletAddress,
    #[serde(with = "amount")]
    pub bet_amount: u128,
    #[serde(with = "amount")]
    pub payout: u128,
    pub outcome: GameOutcome,
    pub xp_awarded: u64,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredGame {
    fn time_key(&self) -> [u8; 24] {
        time_key(self.created_at, self.id)
    }
}

/// Result of [`GameRepository::record_settled`].
#[derive(Debug, Clone)]
pub enum SettleOutcome {
    Recorded {
        game: StoredGame,
        user: StoredUser,
        earnings: Vec<StoredEarning>,
    },
    /// A round with the same transaction hash was already recorded.
    Duplicate(StoredGame),
}

pub struct GameRepository<'a> {
    db: &'a CasinoDb,
}

impl<'a> GameRepository<'a> {
    pub fn new(db: &'a CasinoDb) -> Self {
        Self { db }
    }

    pub fn find_by_tx_hash(&self, tx_hash: &str) -> StoreResult<Option<StoredGame>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(GAME_TX_INDEX)?;
        let games = read_txn.open_table(GAMES)?;
        let game_key = match index.get(tx_hash.to_ascii_lowercase().as_str())? {
            Some(value) => value.value().to_vec(),
            None => return Ok(None),
        };
        match games.get(game_key.as_slice())? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Record a settled round, award XP and accrue referral earnings.
    ///
    /// The player is registered on the fly if unknown. Idempotent on
    /// `tx_hash`: a repeat returns [`SettleOutcome::Duplicate`] and changes
    /// nothing.
    pub fn record_settled(&self, game: StoredGame) -> StoreResult<SettleOutcome> {
        let now = game.created_at;
        let write_txn = self.db.begin_write()?;

        let tx_hash = game.tx_hash.as_ref().map(|h| h.to_ascii_lowercase());
        if let Some(hash) = tx_hash.as_deref() {
            let existing_key = {
                let index = write_txn.open_table(GAME_TX_INDEX)?;
                let found = index.get(hash)?.map(|v| v.value().to_vec());
                found
            };
            if let Some(existing_key) = existing_key {
                let games = write_txn.open_table(GAMES)?;
                let bytes = games
                    .get(existing_key.as_slice())?
                    .ok_or(StoreError::InvalidKey("game_tx_index"))?
                    .value()
                    .to_vec();
                return Ok(SettleOutcome::Duplicate(decode(&bytes)?));
            }
        }

        let player_key = user_key(game.chain_id, game.wallet_address.as_str());
        let mut user = match load_user(&write_txn, &player_key)? {
            Some(user) => user,
            None => create_in_txn(&write_txn, game.chain_id, &game.wallet_address, now)?,
        };
        user.apply_round(game.bet_amount, game.payout, game.outcome, game.xp_awarded, now);
        save_user(&write_txn, &user)?;

        let game_key = game.time_key();
        {
            let json = encode(&game)?;
            let mut games = write_txn.open_table(GAMES)?;
            games.insert(game_key.as_slice(), json.as_slice())?;

            let mut by_wallet = write_txn.open_table(WALLET_GAMES)?;
            let wallet_key = composite_key(&player_key, &game_key);
            by_wallet.insert(wallet_key.as_slice(), game_key.as_slice())?;

            if let Some(hash) = tx_hash.as_deref() {
                let mut index = write_txn.open_table(GAME_TX_INDEX)?;
                index.insert(hash, game_key.as_slice())?;
            }
        }

        // Tier 1 is the player's referrer, tier 2 that referrer's referrer.
        let mut earnings = Vec::new();
        let mut upline = user.referred_by.clone();
        for tier in [ReferralTier::Direct, ReferralTier::Indirect] {
            let Some(referrer) = upline.take() else {
                break;
            };
            let amount = referral_share(game.bet_amount, tier);
            if amount > 0 {
                earnings.push(StoredEarning {
                    id: Uuid::new_v4(),
                    chain_id: game.chain_id,
                    referrer: referrer.clone(),
                    referee: game.wallet_address.clone(),
                    tier,
                    game_id: game.id,
                    amount,
                    claimed: false,
                    claimed_at: None,
                    created_at: now,
                });
            }
            upline = load_user(&write_txn, &user_key(game.chain_id, referrer.as_str()))?
                .and_then(|r| r.referred_by);
        }

        {
            let mut table = write_txn.open_table(REFERRAL_EARNINGS)?;
            for earning in &earnings {
                let key = earning.storage_key();
                let json = encode(earning)?;
                table.insert(key.as_slice(), json.as_slice())?;
            }
        }

        write_txn.commit()?;
        Ok(SettleOutcome::Recorded {
            game,
            user,
            earnings,
        })
    }

    /// Most recent rounds of one player, newest first.
    pub fn list_by_wallet(
        &self,
        chain_id: u64,
        wallet: &WalletAddress,
        limit: usize,
    ) -> StoreResult<Vec<StoredGame>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(WALLET_GAMES)?;
        let games = read_txn.open_table(GAMES)?;

        let player_key = user_key(chain_id, wallet.as_str());
        let start = make_prefix(&player_key);
        let end = make_prefix_end(&player_key);

        let mut out = Vec::with_capacity(limit.min(128));
        for entry in index.range(start.as_slice()..end.as_slice())? {
            if out.len() >= limit {
                break;
            }
            let (_, game_key) = entry?;
            if let Some(value) = games.get(game_key.value())? {
                out.push(decode(value.value())?);
            }
        }
        Ok(out)
    }

    /// Most recent rounds across all players, newest first.
    pub fn list_recent(&self, limit: usize) -> StoreResult<Vec<StoredGame>> {
        let read_txn = self.db.begin_read()?;
        let games = read_txn.open_table(GAMES)?;

        let mut out = Vec::with_capacity(limit.min(128));
        for entry in games.iter()? {
            if out.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    /// Every round created at or after `since`, newest first.
    pub fn scan_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<StoredGame>> {
        let read_txn = self.db.begin_read()?;
        let games = read_txn.open_table(GAMES)?;
        let upper = time_key_upper(since);

        let mut out = Vec::new();
        for entry in games.range(..upper.as_slice())? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }
}
