// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Settled-round ingestion.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::ServiceResult;
use crate::events::GameOutcome;
use crate::models::{ValidationError, WalletAddress};
use crate::progression::xp_for_round;
use crate::storage::{CasinoDb, GameRepository, SettleOutcome, StoredEarning, StoredGame, StoredUser};

/// A round reported as settled on-chain.
#[derive(Debug, Clone)]
pub struct SettledRound {
    pub chain_id: u64,
    pub wallet: WalletAddress,
    pub bet_amount: u128,
    pub payout: u128,
    pub outcome: GameOutcome,
    pub tx_hash: Option<String>,
    /// Settlement time; defaults to the ingestion time.
    pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub enum RecordedRound {
    New {
        game: StoredGame,
        user: StoredUser,
        earnings: Vec<StoredEarning>,
    },
    Duplicate(StoredGame),
}

impl RecordedRound {
    pub fn game(&self) -> &StoredGame {
        match self {
            RecordedRound::New { game, .. } | RecordedRound::Duplicate(game) => game,
        }
    }
}

/// `0x` followed by 64 hex digits.
pub fn is_valid_tx_hash(raw: &str) -> bool {
    raw.len() == 66 && raw.starts_with("0x") && raw[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Record a round, award XP and accrue referral earnings.
pub fn record_round(
    db: &CasinoDb,
    round: SettledRound,
    now: DateTime<Utc>,
) -> ServiceResult<RecordedRound> {
    if let Some(hash) = round.tx_hash.as_deref() {
        if !is_valid_tx_hash(hash) {
            return Err(ValidationError::Invalid("Invalid transaction hash format".to_string()).into());
        }
    }

    let created_at = round.settled_at.map_or(now, |at| at.min(now));
    let game = StoredGame {
        id: Uuid::new_v4(),
        chain_id: round.chain_id,
        wallet_address: round.wallet,
        bet_amount: round.bet_amount,
        payout: round.payout,
        outcome: round.outcome,
        xp_awarded: xp_for_round(round.bet_amount, round.outcome),
        tx_hash: round.tx_hash,
        created_at,
    };

    match GameRepository::new(db).record_settled(game)? {
        SettleOutcome::Recorded { game, user, earnings } => {
            info!(
                game_id = %game.id,
                wallet = %game.wallet_address,
                outcome = ?game.outcome,
                xp = game.xp_awarded,
                level = user.level,
                earnings = earnings.len(),
                "Round recorded"
            );
            Ok(RecordedRound::New { game, user, earnings })
        }
        SettleOutcome::Duplicate(game) => {
            debug!(game_id = %game.id, tx_hash = ?game.tx_hash, "Duplicate round ignored");
            Ok(RecordedRound::Duplicate(game))
        }
    }
}

pub fn recent_for_wallet(
    db: &CasinoDb,
    chain_id: u64,
    wallet: &WalletAddress,
    limit: usize,
) -> ServiceResult<Vec<StoredGame>> {
    Ok(GameRepository::new(db).list_by_wallet(chain_id, wallet, limit)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{XP_PER_ROUND, XP_WIN_BONUS};
    use crate::service::ServiceError;

    const ONE_ETH: u128 = 1_000_000_000_000_000_000;

    fn round(tx_hash: Option<String>) -> SettledRound {
        SettledRound {
            chain_id: 8453,
            wallet: WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap(),
            bet_amount: ONE_ETH / 100,
            payout: ONE_ETH / 50,
            outcome: GameOutcome::Win,
            tx_hash,
            settled_at: None,
        }
    }

    fn hash(byte: char) -> String {
        format!("0x{}", byte.to_string().repeat(64))
    }

    #[test]
    fn awards_xp_from_bet_and_outcome() {
        let db = CasinoDb::in_memory().unwrap();
        let RecordedRound::New { game, user, .. } = record_round(&db, round(None), Utc::now()).unwrap()
        else {
            panic!("expected new round");
        };
        // 0.01 ETH = 1 volume xp
        assert_eq!(game.xp_awarded, XP_PER_ROUND + XP_WIN_BONUS + 1);
        assert_eq!(user.xp, game.xp_awarded);
    }

    #[test]
    fn reingesting_same_tx_hash_does_not_double_award() {
        let db = CasinoDb::in_memory().unwrap();
        let first = record_round(&db, round(Some(hash('a'))), Utc::now()).unwrap();
        let second = record_round(&db, round(Some(hash('a'))), Utc::now()).unwrap();

        assert!(matches!(second, RecordedRound::Duplicate(_)));
        assert_eq!(second.game().id, first.game().id);

        let user = crate::service::users::get_user(&db, 8453, &round(None).wallet).unwrap();
        assert_eq!(user.games_played, 1);
        assert_eq!(user.xp, first.game().xp_awarded);
    }

    #[test]
    fn rejects_malformed_tx_hash() {
        let db = CasinoDb::in_memory().unwrap();
        let result = record_round(&db, round(Some("0x1234".to_string())), Utc::now());
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn future_settlement_is_clamped_to_now() {
        let db = CasinoDb::in_memory().unwrap();
        let now = Utc::now();
        let mut r = round(None);
        r.settled_at = Some(now + chrono::Duration::days(1));
        let recorded = record_round(&db, r, now).unwrap();
        assert_eq!(recorded.game().created_at, now);
    }
}
