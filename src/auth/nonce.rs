// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Sign-in Nonces
//!
//! A nonce is 32 random hex characters, bound to the address that requested
//! it, valid for [`NONCE_TTL`] and consumable exactly once.
//!
//! ## Backends
//!
//! | Backend | Expiry | Single use |
//! |---------|--------|------------|
//! | Memory | per-entry deadline in a bounded LRU | `pop` |
//! | Redis | `SET … EX ttl NX` | `GETDEL` |
//!
//! Neither backend needs a sweeper: expired memory entries are discarded
//! on lookup or evicted by capacity; Redis expires keys natively.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::WalletAddress;

pub const NONCE_TTL: Duration = Duration::from_secs(300);

/// Upper bound on outstanding nonces held in memory.
pub const MEMORY_NONCE_CAPACITY: usize = 10_000;

const REDIS_KEY_PREFIX: &str = "vyre:nonce:";

#[derive(Debug, thiserror::Error)]
pub enum NonceError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("nonce collision")]
    Collision,

    #[error("nonce store lock poisoned")]
    Poisoned,
}

/// What a nonce was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceRecord {
    pub address: WalletAddress,
    pub chain_id: u64,
    /// Exact message the wallet is expected to sign.
    pub message: String,
}

/// 16 random bytes, hex encoded.
pub fn generate_nonce() -> String {
    alloy::hex::encode(rand::random::<[u8; 16]>())
}

// =============================================================================
// Memory backend
// =============================================================================

struct MemoryEntry {
    record: NonceRecord,
    deadline: Instant,
}

pub struct MemoryNonceStore {
    entries: Mutex<LruCache<String, MemoryEntry>>,
    ttl: Duration,
}

impl MemoryNonceStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    fn insert(&self, nonce: &str, record: NonceRecord) -> Result<(), NonceError> {
        let mut entries = self.entries.lock().map_err(|_| NonceError::Poisoned)?;
        if entries
            .peek(nonce)
            .is_some_and(|entry| entry.deadline > Instant::now())
        {
            return Err(NonceError::Collision);
        }
        entries.put(
            nonce.to_string(),
            MemoryEntry {
                record,
                deadline: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    fn take(&self, nonce: &str) -> Result<Option<NonceRecord>, NonceError> {
        let mut entries = self.entries.lock().map_err(|_| NonceError::Poisoned)?;
        Ok(entries
            .pop(nonce)
            .filter(|entry| entry.deadline > Instant::now())
            .map(|entry| entry.record))
    }
}

// =============================================================================
// Redis backend
// =============================================================================

pub struct RedisNonceStore {
    manager: ConnectionManager,
    ttl: Duration,
}

impl RedisNonceStore {
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self, NonceError> {
        info!("Connecting to Redis nonce store");
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        info!("Redis nonce store connected");
        Ok(Self { manager, ttl })
    }

    async fn insert(&self, nonce: &str, record: &NonceRecord) -> Result<(), NonceError> {
        let mut conn = self.manager.clone();
        let value = serde_json::to_string(record)?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(format!("{REDIS_KEY_PREFIX}{nonce}"))
            .arg(value)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        match reply {
            Some(_) => Ok(()),
            None => Err(NonceError::Collision),
        }
    }

    async fn take(&self, nonce: &str) -> Result<Option<NonceRecord>, NonceError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = redis::cmd("GETDEL")
            .arg(format!("{REDIS_KEY_PREFIX}{nonce}"))
            .query_async(&mut conn)
            .await?;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), NonceError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

// =============================================================================
// NonceStore
// =============================================================================

pub enum NonceStore {
    Memory(MemoryNonceStore),
    Redis(RedisNonceStore),
}

impl NonceStore {
    pub fn memory() -> Self {
        NonceStore::Memory(MemoryNonceStore::new(MEMORY_NONCE_CAPACITY, NONCE_TTL))
    }

    pub async fn redis(url: &str) -> Result<Self, NonceError> {
        Ok(NonceStore::Redis(RedisNonceStore::connect(url, NONCE_TTL).await?))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            NonceStore::Memory(_) => "memory",
            NonceStore::Redis(_) => "redis",
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            NonceStore::Memory(store) => store.ttl,
            NonceStore::Redis(store) => store.ttl,
        }
    }

    /// Store a nonce for `record.address`.
    pub async fn issue(&self, nonce: &str, record: NonceRecord) -> Result<(), NonceError> {
        match self {
            NonceStore::Memory(store) => store.insert(nonce, record),
            NonceStore::Redis(store) => store.insert(nonce, &record).await,
        }
    }

    /// Atomically remove and return a live nonce.
    ///
    /// The nonce is gone after this call whatever the caller does with it.
    pub async fn consume(&self, nonce: &str) -> Result<Option<NonceRecord>, NonceError> {
        match self {
            NonceStore::Memory(store) => store.take(nonce),
            NonceStore::Redis(store) => store.take(nonce).await,
        }
    }

    pub async fn health_check(&self) -> Result<(), NonceError> {
        match self {
            NonceStore::Memory(store) => store
                .entries
                .lock()
                .map(|_| ())
                .map_err(|_| NonceError::Poisoned),
            NonceStore::Redis(store) => store.ping().await,
        }
    }
}
