// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

use std::sync::Arc;

use crate::auth::{AdminKeyVerifier, JwtManager, NonceStore};
use crate::service::activity::PlatformStatsCache;
use crate::storage::{CasinoDb, LiveLeaderboardCache};

/// Default number of entries kept per leaderboard snapshot.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 100;

/// Shared application state, built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<CasinoDb>,
    pub nonces: Arc<NonceStore>,
    /// `None` when `JWT_SECRET` is unset; wallet auth routes answer 503.
    pub jwt: Option<Arc<JwtManager>>,
    /// `None` when `ADMIN_API_KEY` is unset; admin routes answer 503.
    pub admin: Option<Arc<AdminKeyVerifier>>,
    pub live_leaderboards: Arc<LiveLeaderboardCache>,
    pub platform_stats: Arc<PlatformStatsCache>,
    /// Chain used when a request does not name one.
    pub default_chain_id: u64,
    pub leaderboard_size: usize,
}

impl AppState {
    pub fn new(db: Arc<CasinoDb>, nonces: NonceStore, default_chain_id: u64) -> Self {
        Self {
            db,
            nonces: Arc::new(nonces),
            jwt: None,
            admin: None,
            live_leaderboards: Arc::new(LiveLeaderboardCache::default()),
            platform_stats: Arc::new(PlatformStatsCache::default()),
            default_chain_id,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }

    pub fn with_jwt(mut self, jwt: Arc<JwtManager>) -> Self {
        self.jwt = Some(jwt);
        self
    }

    pub fn with_admin(mut self, admin: Arc<AdminKeyVerifier>) -> Self {
        self.admin = Some(admin);
        self
    }

    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size.max(1);
        self
    }

    /// In-memory state on chain 8453 with auth disabled.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let db = CasinoDb::in_memory().expect("in-memory database");
        Self::new(Arc::new(db), NonceStore::memory(), 8453)
    }
}
