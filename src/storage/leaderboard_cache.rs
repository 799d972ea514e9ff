// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! LRU cache for live leaderboard rankings.
//!
//! Live rankings are computed from every user on a chain, so each result is
//! kept for a short TTL keyed by `chain_id:metric`.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lru::LruCache;

use super::repository::LeaderboardEntry;

/// Default freshness window of a live ranking.
pub const LIVE_LEADERBOARD_TTL: Duration = Duration::from_secs(30);

/// A computed ranking and when it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRanking {
    pub entries: Vec<LeaderboardEntry>,
    pub generated_at: DateTime<Utc>,
}

struct CacheEntry {
    ranking: LiveRanking,
    inserted_at: Instant,
}

/// In-process cache of live rankings.
pub struct LiveLeaderboardCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl LiveLeaderboardCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Cached ranking, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<LiveRanking> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.ranking.clone());
            }
            cache.pop(key);
        }
        None
    }

    pub fn put(&self, key: &str, ranking: LiveRanking) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key.to_string(),
                CacheEntry {
                    ranking,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Drop every cached ranking, e.g. after a snapshot regeneration.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl Default for LiveLeaderboardCache {
    fn default() -> Self {
        Self::new(16, LIVE_LEADERBOARD_TTL)
    }
}
