// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Storage Module
//!
//! Persistent state lives in a single embedded redb file under `DATA_DIR`.
//!
//! ```text
//! {DATA_DIR}/
//!   casino.redb     # users, games, referrals, events, snapshots
//! ```
//!
//! Repositories are thin typed views over [`CasinoDb`]; they borrow it and
//! open their own transactions. The only in-process cache is the live
//! leaderboard cache.

pub mod db;
pub mod leaderboard_cache;
pub mod repository;

pub use db::{CasinoDb, StoreError, StoreResult};
pub use leaderboard_cache::{LiveLeaderboardCache, LiveRanking, LIVE_LEADERBOARD_TTL};
pub use repository::{
    ChainRepository, ClaimResult, EventRepository, GameRepository, LeaderboardEntry,
    LeaderboardRepository, ReferralRepository, SettleOutcome, StoredChain, StoredEarning,
    StoredEvent, StoredGame, StoredSnapshot, StoredUser, UserRepository,
};

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "casino.redb";
