// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Public activity feed and platform statistics.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::ServiceResult;
use crate::storage::{CasinoDb, GameRepository, StoredGame, UserRepository};

pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;
pub const MAX_ACTIVITY_LIMIT: usize = 100;

/// A settled round as shown in the public feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub game: StoredGame,
    pub short_address: String,
    pub display_name: Option<String>,
}

/// Most recent rounds across every player, newest first.
pub fn recent(db: &CasinoDb, limit: usize) -> ServiceResult<Vec<ActivityItem>> {
    let games = GameRepository::new(db).list_recent(limit)?;
    let users = UserRepository::new(db);

    games
        .into_iter()
        .map(|game| -> ServiceResult<ActivityItem> {
            let display_name = users
                .get(game.chain_id, &game.wallet_address)?
                .and_then(|u| u.display_name);
            Ok(ActivityItem {
                short_address: game.wallet_address.short(),
                display_name,
                game,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformStats {
    pub total_games: u64,
    pub total_wagered: u128,
    pub total_payout: u128,
    pub unique_players: u64,
    pub games_24h: u64,
    pub wagered_24h: u128,
}

/// Freshness window of the cached platform totals.
pub const PLATFORM_STATS_TTL: StdDuration = StdDuration::from_secs(30);

/// Last computed platform totals, reused until the TTL lapses.
pub struct PlatformStatsCache {
    slot: Mutex<Option<(PlatformStats, Instant)>>,
    ttl: StdDuration,
}

impl PlatformStatsCache {
    pub fn new(ttl: StdDuration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    pub fn get(&self) -> Option<PlatformStats> {
        let mut slot = self.slot.lock().ok()?;
        match slot.as_ref() {
            Some((stats, at)) if at.elapsed() < self.ttl => Some(stats.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn put(&self, stats: PlatformStats) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some((stats, Instant::now()));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

impl Default for PlatformStatsCache {
    fn default() -> Self {
        Self::new(PLATFORM_STATS_TTL)
    }
}

/// Platform totals, served from `cache` while fresh.
pub fn stats(
    db: &CasinoDb,
    cache: &PlatformStatsCache,
    now: DateTime<Utc>,
) -> ServiceResult<PlatformStats> {
    if let Some(cached) = cache.get() {
        debug!("Platform stats cache hit");
        return Ok(cached);
    }

    let computed = compute_stats(db, now)?;
    cache.put(computed.clone());
    Ok(computed)
}

/// Totals over every settled round.
fn compute_stats(db: &CasinoDb, now: DateTime<Utc>) -> ServiceResult<PlatformStats> {
    let cutoff = now - Duration::hours(24);
    let mut players = HashSet::new();
    let mut out = PlatformStats::default();

    for game in GameRepository::new(db).list_recent(usize::MAX)? {
        out.total_games += 1;
        out.total_wagered = out.total_wagered.saturating_add(game.bet_amount);
        out.total_payout = out.total_payout.saturating_add(game.payout);
        if game.created_at >= cutoff {
            out.games_24h += 1;
            out.wagered_24h = out.wagered_24h.saturating_add(game.bet_amount);
        }
        players.insert((game.chain_id, game.wallet_address));
    }
    out.unique_players = players.len() as u64;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameOutcome;
    use crate::models::WalletAddress;
    use crate::service::games::{record_round, SettledRound};
    use crate::service::users::register;

    fn wallet(byte: char) -> WalletAddress {
        WalletAddress::parse(&format!("0x{}", byte.to_string().repeat(40))).unwrap()
    }

    fn play(db: &CasinoDb, who: char, bet: u128, at: DateTime<Utc>) {
        record_round(
            db,
            SettledRound {
                chain_id: 8453,
                wallet: wallet(who),
                bet_amount: bet,
                payout: bet * 2,
                outcome: GameOutcome::Win,
                tx_hash: None,
                settled_at: Some(at),
            },
            Utc::now(),
        )
        .unwrap();
    }

    #[test]
    fn recent_is_newest_first_with_names() {
        let db = CasinoDb::in_memory().unwrap();
        let now = Utc::now();
        register(&db, 8453, &wallet('a'), Some("Ace"), None, now).unwrap();
        play(&db, 'a', 10, now - Duration::minutes(5));
        play(&db, 'b', 20, now - Duration::minutes(1));

        let items = recent(&db, 10).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].game.wallet_address, wallet('b'));
        assert_eq!(items[0].display_name, None);
        assert_eq!(items[1].display_name.as_deref(), Some("Ace"));
        assert_eq!(items[1].short_address, "0xaaaa…aaaa");

        assert_eq!(recent(&db, 1).unwrap().len(), 1);
    }

    #[test]
    fn stats_split_last_day() {
        let db = CasinoDb::in_memory().unwrap();
        let now = Utc::now();
        play(&db, 'a', 10, now - Duration::days(2));
        play(&db, 'a', 20, now - Duration::hours(2));
        play(&db, 'b', 30, now - Duration::hours(1));

        let s = stats(&db, &PlatformStatsCache::default(), now).unwrap();
        assert_eq!(s.total_games, 3);
        assert_eq!(s.total_wagered, 60);
        assert_eq!(s.total_payout, 120);
        assert_eq!(s.unique_players, 2);
        assert_eq!(s.games_24h, 2);
        assert_eq!(s.wagered_24h, 50);
    }

    #[test]
    fn stats_are_cached_until_cleared() {
        let db = CasinoDb::in_memory().unwrap();
        let cache = PlatformStatsCache::default();
        let now = Utc::now();
        play(&db, 'a', 10, now);
        assert_eq!(stats(&db, &cache, now).unwrap().total_games, 1);

        play(&db, 'b', 10, now);
        assert_eq!(stats(&db, &cache, now).unwrap().total_games, 1);

        cache.clear();
        assert_eq!(stats(&db, &cache, now).unwrap().total_games, 2);
    }

    #[test]
    fn stale_stats_are_recomputed() {
        let db = CasinoDb::in_memory().unwrap();
        let cache = PlatformStatsCache::new(StdDuration::from_millis(1));
        let now = Utc::now();
        assert_eq!(stats(&db, &cache, now).unwrap().total_games, 0);

        play(&db, 'a', 10, now);
        std::thread::sleep(StdDuration::from_millis(5));
        assert_eq!(stats(&db, &cache, now).unwrap().total_games, 1);
    }
}
