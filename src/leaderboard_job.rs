// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Leaderboard Refresher
//!
//! Background task that regenerates every leaderboard snapshot on a fixed
//! interval (default 300 s). The first sweep runs immediately at start-up so
//! snapshots exist before the first interval elapses.
//!
//! ## Shutdown
//!
//! Stops when its `CancellationToken` is cancelled. A sweep already in
//! progress is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::service::leaderboard;
use crate::storage::{CasinoDb, LiveLeaderboardCache};

/// Default interval between regeneration sweeps.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

pub struct LeaderboardRefresher {
    db: Arc<CasinoDb>,
    live: Arc<LiveLeaderboardCache>,
    chain_ids: Vec<u64>,
    size: usize,
    interval: Duration,
}

impl LeaderboardRefresher {
    pub fn new(
        db: Arc<CasinoDb>,
        live: Arc<LiveLeaderboardCache>,
        chain_ids: Vec<u64>,
        size: usize,
    ) -> Self {
        Self {
            db,
            live,
            chain_ids,
            size,
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_secs(1));
        self
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(refresher.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            chains = self.chain_ids.len(),
            "Leaderboard refresher starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Leaderboard refresher shutting down");
                return;
            }

            self.refresh_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Leaderboard refresher shutting down");
                    return;
                }
            }
        }
    }

    /// One sweep over every chain. Failures are logged and retried next tick.
    async fn refresh_step(&self) {
        let db = Arc::clone(&self.db);
        let chain_ids = self.chain_ids.clone();
        let size = self.size;

        let result = tokio::task::spawn_blocking(move || {
            leaderboard::regenerate_all(&db, &chain_ids, size, Utc::now())
        })
        .await;

        match result {
            Ok(Ok(written)) => {
                self.live.clear();
                info!(snapshots = written, "Leaderboard refresh complete");
            }
            Ok(Err(e)) => warn!(error = %e, "Leaderboard refresh failed, will retry"),
            Err(e) => warn!(error = %e, "Leaderboard refresh task panicked"),
        }
    }
}
