// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Leaderboards
//!
//! Rankings are computed per chain for each `(period, metric)` pair.
//! Windowed periods aggregate the rounds settled inside a rolling window;
//! `all_time` reads the per-user aggregates directly.
//!
//! Entries are ordered by value descending, then wallet ascending, and
//! ranked from 1. Snapshots are persisted under `chain_id:period:metric`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use super::ServiceResult;
use crate::models::{ValidationError, WalletAddress};
use crate::storage::repository::users::saturating_profit;
use crate::storage::{
    CasinoDb, ChainRepository, GameRepository, LeaderboardEntry, LeaderboardRepository,
    LiveLeaderboardCache, LiveRanking, StoredSnapshot, UserRepository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardPeriod {
    Daily,
    Weekly,
    Monthly,
    AllTime,
}

impl LeaderboardPeriod {
    pub const ALL: [LeaderboardPeriod; 4] = [
        LeaderboardPeriod::Daily,
        LeaderboardPeriod::Weekly,
        LeaderboardPeriod::Monthly,
        LeaderboardPeriod::AllTime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeaderboardPeriod::Daily => "daily",
            LeaderboardPeriod::Weekly => "weekly",
            LeaderboardPeriod::Monthly => "monthly",
            LeaderboardPeriod::AllTime => "all_time",
        }
    }

    /// Rolling window length; `None` for all time.
    pub fn window(self) -> Option<Duration> {
        match self {
            LeaderboardPeriod::Daily => Some(Duration::hours(24)),
            LeaderboardPeriod::Weekly => Some(Duration::days(7)),
            LeaderboardPeriod::Monthly => Some(Duration::days(30)),
            LeaderboardPeriod::AllTime => None,
        }
    }
}

impl FromStr for LeaderboardPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeaderboardPeriod::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::Invalid(format!("Invalid period: {s}")))
    }
}

impl fmt::Display for LeaderboardPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    #[default]
    Wagered,
    Profit,
    Wins,
    Xp,
}

impl LeaderboardMetric {
    pub const ALL: [LeaderboardMetric; 4] = [
        LeaderboardMetric::Wagered,
        LeaderboardMetric::Profit,
        LeaderboardMetric::Wins,
        LeaderboardMetric::Xp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeaderboardMetric::Wagered => "wagered",
            LeaderboardMetric::Profit => "profit",
            LeaderboardMetric::Wins => "wins",
            LeaderboardMetric::Xp => "xp",
        }
    }
}

impl FromStr for LeaderboardMetric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeaderboardMetric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::Invalid(format!("Invalid metric: {s}")))
    }
}

impl fmt::Display for LeaderboardMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn snapshot_key(chain_id: u64, period: LeaderboardPeriod, metric: LeaderboardMetric) -> String {
    format!("{chain_id}:{period}:{metric}")
}

fn live_key(chain_id: u64, metric: LeaderboardMetric) -> String {
    format!("{chain_id}:{metric}")
}

// =============================================================================
// Aggregation
// =============================================================================

#[derive(Debug, Clone, Default)]
struct Totals {
    display_name: Option<String>,
    wagered: u128,
    payout: u128,
    wins: u64,
    xp: u64,
}

impl Totals {
    /// `(sort key, rendered value)` for `metric`.
    fn score(&self, metric: LeaderboardMetric) -> (i128, String) {
        match metric {
            LeaderboardMetric::Wagered => (clamp_i128(self.wagered), self.wagered.to_string()),
            LeaderboardMetric::Profit => {
                let profit = saturating_profit(self.payout, self.wagered);
                (profit, profit.to_string())
            }
            LeaderboardMetric::Wins => (i128::from(self.wins), self.wins.to_string()),
            LeaderboardMetric::Xp => (i128::from(self.xp), self.xp.to_string()),
        }
    }
}

fn clamp_i128(value: u128) -> i128 {
    i128::try_from(value).unwrap_or(i128::MAX)
}

/// Per-player totals on `chain_id` for `period`.
fn aggregate(
    db: &CasinoDb,
    chain_id: u64,
    period: LeaderboardPeriod,
    now: DateTime<Utc>,
) -> ServiceResult<HashMap<WalletAddress, Totals>> {
    let users = UserRepository::new(db).list_by_chain(chain_id)?;

    let Some(window) = period.window() else {
        return Ok(users
            .into_iter()
            .filter(|u| u.games_played > 0)
            .map(|u| {
                let totals = Totals {
                    display_name: u.display_name,
                    wagered: u.total_wagered,
                    payout: u.total_payout,
                    wins: u.games_won,
                    xp: u.xp,
                };
                (u.wallet_address, totals)
            })
            .collect());
    };

    let names: HashMap<WalletAddress, Option<String>> = users
        .into_iter()
        .map(|u| (u.wallet_address, u.display_name))
        .collect();

    let mut totals: HashMap<WalletAddress, Totals> = HashMap::new();
    for game in GameRepository::new(db).scan_since(now - window)? {
        if game.chain_id != chain_id {
            continue;
        }
        let entry = totals.entry(game.wallet_address.clone()).or_insert_with(|| Totals {
            display_name: names.get(&game.wallet_address).cloned().flatten(),
            ..Totals::default()
        });
        entry.wagered = entry.wagered.saturating_add(game.bet_amount);
        entry.payout = entry.payout.saturating_add(game.payout);
        entry.xp = entry.xp.saturating_add(game.xp_awarded);
        if game.outcome.is_win() {
            entry.wins += 1;
        }
    }
    Ok(totals)
}

fn rank(
    totals: &HashMap<WalletAddress, Totals>,
    metric: LeaderboardMetric,
    size: usize,
) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(i128, &WalletAddress, &Totals, String)> = totals
        .iter()
        .map(|(wallet, t)| {
            let (sort, value) = t.score(metric);
            (sort, wallet, t, value)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    scored
        .into_iter()
        .take(size)
        .enumerate()
        .map(|(i, (_, wallet, t, value))| LeaderboardEntry {
            rank: i as u32 + 1,
            wallet_address: wallet.clone(),
            display_name: t.display_name.clone(),
            value,
        })
        .collect()
}

/// Compute one ranking without persisting it.
pub fn compute(
    db: &CasinoDb,
    chain_id: u64,
    period: LeaderboardPeriod,
    metric: LeaderboardMetric,
    size: usize,
    now: DateTime<Utc>,
) -> ServiceResult<Vec<LeaderboardEntry>> {
    let totals = aggregate(db, chain_id, period, now)?;
    Ok(rank(&totals, metric, size))
}

/// Recompute and persist every `(period, metric)` snapshot for `chain_ids`.
///
/// Returns the number of snapshots written.
pub fn regenerate_all(
    db: &CasinoDb,
    chain_ids: &[u64],
    size: usize,
    now: DateTime<Utc>,
) -> ServiceResult<usize> {
    let mut snapshots = Vec::new();
    for &chain_id in chain_ids {
        for period in LeaderboardPeriod::ALL {
            let totals = aggregate(db, chain_id, period, now)?;
            for metric in LeaderboardMetric::ALL {
                snapshots.push((
                    snapshot_key(chain_id, period, metric),
                    StoredSnapshot {
                        entries: rank(&totals, metric, size),
                        generated_at: now,
                    },
                ));
            }
        }
    }

    LeaderboardRepository::new(db).put_all(&snapshots)?;
    info!(
        chains = chain_ids.len(),
        snapshots = snapshots.len(),
        "Leaderboard snapshots regenerated"
    );
    Ok(snapshots.len())
}

/// `default_chain_id` plus every active registered chain, deduplicated.
pub fn active_chain_ids(db: &CasinoDb, default_chain_id: u64) -> ServiceResult<Vec<u64>> {
    let mut ids = vec![default_chain_id];
    for chain in ChainRepository::new(db).list()? {
        if chain.active && !ids.contains(&chain.id) {
            ids.push(chain.id);
        }
    }
    Ok(ids)
}

pub fn get_snapshot(
    db: &CasinoDb,
    chain_id: u64,
    period: LeaderboardPeriod,
    metric: LeaderboardMetric,
) -> ServiceResult<Option<StoredSnapshot>> {
    Ok(LeaderboardRepository::new(db).get(&snapshot_key(chain_id, period, metric))?)
}

/// All-time ranking for `metric`, served from the live cache when fresh.
pub fn live(
    db: &CasinoDb,
    cache: &LiveLeaderboardCache,
    chain_id: u64,
    metric: LeaderboardMetric,
    size: usize,
    now: DateTime<Utc>,
) -> ServiceResult<LiveRanking> {
    let key = live_key(chain_id, metric);
    if let Some(cached) = cache.get(&key) {
        debug!(key = %key, "Live leaderboard cache hit");
        return Ok(cached);
    }

    let ranking = LiveRanking {
        entries: compute(db, chain_id, LeaderboardPeriod::AllTime, metric, size, now)?,
        generated_at: now,
    };
    cache.put(&key, ranking.clone());
    Ok(ranking)
}
