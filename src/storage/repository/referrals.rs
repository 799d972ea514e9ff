// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Referral earnings ledger.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{amount, WalletAddress};
use crate::referral::ReferralTier;
use crate::storage::db::{
    composite_key, decode, encode, make_prefix, make_prefix_end, time_key, user_key, CasinoDb,
    StoreResult, REFERRAL_EARNINGS,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEarning {
    pub id: Uuid,
    pub chain_id: u64,
    pub referrer: WalletAddress,
    pub referee: WalletAddress,
    pub tier: ReferralTier,
    pub game_id: Uuid,
    #[serde(with = "amount")]
    pub amount: u128,
    pub claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StoredEarning {
    /// `referrer_user_key|time key`, grouping a referrer's ledger newest first.
    pub(crate) fn storage_key(&self) -> Vec<u8> {
        composite_key(
            &user_key(self.chain_id, self.referrer.as_str()),
            &time_key(self.created_at, self.id),
        )
    }
}

/// Outcome of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimResult {
    pub count: usize,
    pub amount: u128,
}

pub struct ReferralRepository<'a> {
    db: &'a CasinoDb,
}

impl<'a> ReferralRepository<'a> {
    pub fn new(db: &'a CasinoDb) -> Self {
        Self { db }
    }

    /// Earnings of a referrer, newest first.
    pub fn list(
        &self,
        chain_id: u64,
        referrer: &WalletAddress,
        limit: usize,
    ) -> StoreResult<Vec<StoredEarning>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REFERRAL_EARNINGS)?;
        let prefix = user_key(chain_id, referrer.as_str());
        let start = make_prefix(&prefix);
        let end = make_prefix_end(&prefix);

        let mut out = Vec::new();
        for entry in table.range(start.as_slice()..end.as_slice())? {
            if out.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    /// `(pending, claimed)` totals in wei.
    pub fn totals(&self, chain_id: u64, referrer: &WalletAddress) -> StoreResult<(u128, u128)> {
        let mut pending = 0u128;
        let mut claimed = 0u128;
        for earning in self.list(chain_id, referrer, usize::MAX)? {
            if earning.claimed {
                claimed = claimed.saturating_add(earning.amount);
            } else {
                pending = pending.saturating_add(earning.amount);
            }
        }
        Ok((pending, claimed))
    }

    /// Mark every pending earning as claimed, atomically.
    pub fn claim_all(
        &self,
        chain_id: u64,
        referrer: &WalletAddress,
        now: DateTime<Utc>,
    ) -> StoreResult<ClaimResult> {
        let prefix = user_key(chain_id, referrer.as_str());
        let start = make_prefix(&prefix);
        let end = make_prefix_end(&prefix);

        let write_txn = self.db.begin_write()?;
        let mut result = ClaimResult { count: 0, amount: 0 };
        {
            let mut table = write_txn.open_table(REFERRAL_EARNINGS)?;

            // Collect first; the table cannot be written while a range is live.
            let mut pending = Vec::new();
            for entry in table.range(start.as_slice()..end.as_slice())? {
                let (key, value) = entry?;
                let earning: StoredEarning = decode(value.value())?;
                if !earning.claimed {
                    pending.push((key.value().to_vec(), earning));
                }
            }

            for (key, mut earning) in pending {
                earning.claimed = true;
                earning.claimed_at = Some(now);
                result.count += 1;
                result.amount = result.amount.saturating_add(earning.amount);
                let json = encode(&earning)?;
                table.insert(key.as_slice(), json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: u64 = 8453;

    fn wallet(byte: char) -> WalletAddress {
        WalletAddress::parse(&format!("0x{}", byte.to_string().repeat(40))).unwrap()
    }

    fn seed(db: &CasinoDb, amounts: &[u128]) {
        let write_txn = db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(REFERRAL_EARNINGS).unwrap();
            for (i, amount) in amounts.iter().enumerate() {
                let earning = StoredEarning {
                    id: Uuid::new_v4(),
                    chain_id: CHAIN,
                    referrer: wallet('a'),
                    referee: wallet('b'),
                    tier: ReferralTier::Direct,
                    game_id: Uuid::new_v4(),
                    amount: *amount,
                    claimed: false,
                    claimed_at: None,
                    created_at: Utc::now() - chrono::Duration::seconds(i as i64),
                };
                let json = encode(&earning).unwrap();
                table.insert(earning.storage_key().as_slice(), json.as_slice()).unwrap();
            }
        }
        write_txn.commit().unwrap();
    }

    #[test]
    fn claim_marks_everything_once() {
        let db = CasinoDb::in_memory().unwrap();
        seed(&db, &[100, 250, 50]);
        let repo = ReferralRepository::new(&db);

        assert_eq!(repo.totals(CHAIN, &wallet('a')).unwrap(), (400, 0));

        let first = repo.claim_all(CHAIN, &wallet('a'), Utc::now()).unwrap();
        assert_eq!(first, ClaimResult { count: 3, amount: 400 });
        assert_eq!(repo.totals(CHAIN, &wallet('a')).unwrap(), (0, 400));

        let second = repo.claim_all(CHAIN, &wallet('a'), Utc::now()).unwrap();
        assert_eq!(second, ClaimResult { count: 0, amount: 0 });
    }

    #[test]
    fn list_is_scoped_and_limited() {
        let db = CasinoDb::in_memory().unwrap();
        seed(&db, &[1, 2, 3]);
        let repo = ReferralRepository::new(&db);

        let page = repo.list(CHAIN, &wallet('a'), 2).unwrap();
        assert_eq!(page.len(), 2);
        // Newest first: the first seeded earning is the newest.
        assert_eq!(page[0].amount, 1);
        assert!(repo.list(CHAIN, &wallet('b'), 10).unwrap().is_empty());
        assert!(repo.list(1, &wallet('a'), 10).unwrap().is_empty());
    }
}
