// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Persisted leaderboard snapshots, one per `chain_id:period:metric` key.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::WalletAddress;
use crate::storage::db::{decode, encode, CasinoDb, StoreResult, LEADERBOARD_SNAPSHOTS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based rank.
    pub rank: u32,
    pub wallet_address: WalletAddress,
    pub display_name: Option<String>,
    /// Metric value as a decimal string (wei amounts, counts or XP).
    #[schema(example = "1500000000000000000")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    pub entries: Vec<LeaderboardEntry>,
    pub generated_at: DateTime<Utc>,
}

pub struct LeaderboardRepository<'a> {
    db: &'a CasinoDb,
}

impl<'a> LeaderboardRepository<'a> {
    pub fn new(db: &'a CasinoDb) -> Self {
        Self { db }
    }

    pub fn get(&self, key: &str) -> StoreResult<Option<StoredSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LEADERBOARD_SNAPSHOTS)?;
        match table.get(key)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Replace a batch of snapshots in one transaction.
    pub fn put_all(&self, snapshots: &[(String, StoredSnapshot)]) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(LEADERBOARD_SNAPSHOTS)?;
            for (key, snapshot) in snapshots {
                let json = encode(snapshot)?;
                table.insert(key.as_str(), json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}
