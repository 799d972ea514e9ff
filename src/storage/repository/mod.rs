// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Repository layer providing typed access to the casino database.
//!
//! Each repository borrows the [`CasinoDb`](super::CasinoDb) and owns the
//! record type it persists.

pub mod chains;
pub mod events;
pub mod games;
pub mod leaderboard;
pub mod referrals;
pub mod users;

pub use chains::{ChainRepository, StoredChain};
pub use events::{EventRepository, StoredEvent};
pub use games::{GameRepository, SettleOutcome, StoredGame};
pub use leaderboard::{LeaderboardEntry, LeaderboardRepository, StoredSnapshot};
pub use referrals::{ClaimResult, ReferralRepository, StoredEarning};
pub use users::{StoredUser, UserRepository};
