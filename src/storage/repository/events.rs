// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Append-only analytics event log.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::EventPayload;
use crate::models::WalletAddress;
use crate::storage::db::{decode, encode, time_key, time_key_upper, CasinoDb, StoreResult, EVENT_LOGS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub id: Uuid,
    pub wallet_address: Option<WalletAddress>,
    pub session_id: Option<String>,
    pub event: EventPayload,
    pub created_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Identity used for funnel counting: wallet, else session. Events with
    /// neither are anonymous and never counted.
    pub fn actor(&self) -> Option<String> {
        match (&self.wallet_address, &self.session_id) {
            (Some(wallet), _) => Some(wallet.to_string()),
            (None, Some(session)) => Some(format!("session:{session}")),
            (None, None) => None,
        }
    }
}

pub struct EventRepository<'a> {
    db: &'a CasinoDb,
}

impl<'a> EventRepository<'a> {
    pub fn new(db: &'a CasinoDb) -> Self {
        Self { db }
    }

    pub fn insert(&self, event: &StoredEvent) -> StoreResult<()> {
        let key = time_key(event.created_at, event.id);
        let json = encode(event)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(EVENT_LOGS)?;
            table.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Events created at or after `since`, newest first.
    pub fn scan_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<StoredEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENT_LOGS)?;
        let upper = time_key_upper(since);

        let mut out = Vec::new();
        for entry in table.range(..upper.as_slice())? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }
}
