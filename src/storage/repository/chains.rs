// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Supported chains.

use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::db::{decode, encode, CasinoDb, StoreResult, CHAINS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredChain {
    #[schema(example = 8453)]
    pub id: u64,
    #[schema(example = "Base")]
    pub name: String,
    pub rpc_url: Option<String>,
    /// Casino contract address on this chain.
    pub casino_address: Option<String>,
    pub active: bool,
}

pub struct ChainRepository<'a> {
    db: &'a CasinoDb,
}

impl<'a> ChainRepository<'a> {
    pub fn new(db: &'a CasinoDb) -> Self {
        Self { db }
    }

    pub fn upsert(&self, chain: &StoredChain) -> StoreResult<()> {
        let json = encode(chain)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHAINS)?;
            table.insert(chain.id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: u64) -> StoreResult<Option<StoredChain>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAINS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// All chains ordered by id.
    pub fn list(&self) -> StoreResult<Vec<StoredChain>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAINS)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }
}
