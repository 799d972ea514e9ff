// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Embedded casino database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `chains`: chain id → serialized StoredChain
//! - `users`: `chain_id:wallet` → serialized StoredUser
//! - `referral_codes`: code → user key
//! - `referrals`: `referrer_user_key|referee_wallet` → linked-at millis
//! - `games`: time key → serialized StoredGame
//! - `wallet_games`: `user_key|time key` → game time key
//! - `game_tx_index`: tx hash → game time key
//! - `referral_earnings`: `referrer_user_key|time key` → serialized StoredEarning
//! - `event_logs`: time key → serialized StoredEvent
//! - `leaderboard_snapshots`: `chain_id:period:metric` → serialized StoredSnapshot
//!
//! A time key is the inverted millisecond timestamp (big-endian) followed by
//! the record's UUID bytes, so forward scans return newest records first.
//!
//! redb allows a single writer at a time. Every read-modify-write in the
//! repositories runs inside one write transaction and cannot lose updates.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const CHAINS: TableDefinition<u64, &[u8]> = TableDefinition::new("chains");

pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Globally unique referral code → owning user key.
pub(crate) const REFERRAL_CODES: TableDefinition<&str, &str> =
    TableDefinition::new("referral_codes");

/// Direct referral edges, scanned by referrer prefix.
pub(crate) const REFERRALS: TableDefinition<&str, i64> = TableDefinition::new("referrals");

pub(crate) const GAMES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("games");

pub(crate) const WALLET_GAMES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("wallet_games");

pub(crate) const GAME_TX_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("game_tx_index");

pub(crate) const REFERRAL_EARNINGS: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("referral_earnings");

pub(crate) const EVENT_LOGS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("event_logs");

pub(crate) const LEADERBOARD_SNAPSHOTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("leaderboard_snapshots");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("corrupt key in {0}")]
    InvalidKey(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Key Helpers
// =============================================================================

/// Length of a time key: 8 bytes inverted timestamp + 16 bytes UUID.
pub(crate) const TIME_KEY_LEN: usize = 24;

/// Build a newest-first time key.
pub(crate) fn time_key(at: DateTime<Utc>, id: Uuid) -> [u8; TIME_KEY_LEN] {
    let mut key = [0u8; TIME_KEY_LEN];
    // Invert timestamp for descending order (newest first)
    key[..8].copy_from_slice(&(!(at.timestamp_millis() as u64)).to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

/// Decode the timestamp embedded in a time key.
pub(crate) fn time_key_timestamp(key: &[u8]) -> Option<DateTime<Utc>> {
    let bytes: [u8; 8] = key.get(..8)?.try_into().ok()?;
    let millis = !u64::from_be_bytes(bytes) as i64;
    Utc.timestamp_millis_opt(millis).single()
}

/// Smallest time key that still covers everything at or after `since`.
///
/// Scanning `..time_key_upper(since)` yields records with
/// `created_at >= since`, newest first.
pub(crate) fn time_key_upper(since: DateTime<Utc>) -> [u8; TIME_KEY_LEN] {
    let mut key = [0xFFu8; TIME_KEY_LEN];
    key[..8].copy_from_slice(&(!(since.timestamp_millis() as u64)).to_be_bytes());
    key
}

/// Storage key for a user: `chain_id:wallet`.
pub(crate) fn user_key(chain_id: u64, wallet: &str) -> String {
    format!("{chain_id}:{wallet}")
}

/// `prefix|` as bytes, the start of a composite range.
pub(crate) fn make_prefix(prefix: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + 1);
    out.extend_from_slice(prefix.as_bytes());
    out.push(b'|');
    out
}

/// Upper bound for a composite range (prefix with 0xFF bytes appended).
pub(crate) fn make_prefix_end(prefix: &str) -> Vec<u8> {
    let mut end = make_prefix(prefix);
    end.extend_from_slice(&[0xFF; TIME_KEY_LEN + 1]);
    end
}

/// `prefix|time_key`.
pub(crate) fn composite_key(prefix: &str, time_key: &[u8]) -> Vec<u8> {
    let mut key = make_prefix(prefix);
    key.extend_from_slice(time_key);
    key
}

pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

// =============================================================================
// CasinoDb
// =============================================================================

/// Embedded ACID casino database.
pub struct CasinoDb {
    db: Database,
}

impl CasinoDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Volatile database for tests and ephemeral runs.
    pub fn in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CHAINS)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(REFERRAL_CODES)?;
            let _ = write_txn.open_table(REFERRALS)?;
            let _ = write_txn.open_table(GAMES)?;
            let _ = write_txn.open_table(WALLET_GAMES)?;
            let _ = write_txn.open_table(GAME_TX_INDEX)?;
            let _ = write_txn.open_table(REFERRAL_EARNINGS)?;
            let _ = write_txn.open_table(EVENT_LOGS)?;
            let _ = write_txn.open_table(LEADERBOARD_SNAPSHOTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn begin_read(&self) -> StoreResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Readiness probe: opens a read transaction and touches a table.
    pub fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAINS)?;
        let _ = table.first()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
