// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # XP, Levels and VIP Tiers
//!
//! Levels follow a quadratic curve: reaching level `L` requires
//! `BASE_XP * L^2` experience, so `level = floor(sqrt(xp / BASE_XP))`.
//! All arithmetic is integer; XP is unsigned, so negative input cannot be
//! represented.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::events::GameOutcome;
use crate::models::round2;

/// XP needed for level 1. Level `L` needs `BASE_XP * L^2`.
pub const BASE_XP: u64 = 50;

/// XP granted for every settled round.
pub const XP_PER_ROUND: u64 = 10;
/// Extra XP for a winning round.
pub const XP_WIN_BONUS: u64 = 5;
/// Extra XP for a natural blackjack (on top of the win bonus).
pub const XP_BLACKJACK_BONUS: u64 = 10;
/// Wager granularity for volume XP (0.01 ETH in wei).
pub const WEI_PER_VOLUME_XP: u128 = 10_000_000_000_000_000;
/// Cap on volume XP per round.
pub const MAX_VOLUME_XP: u64 = 100;

/// Level reached with `xp` experience points.
pub fn calculate_level_from_xp(xp: u64) -> u32 {
    // floor(sqrt(xp / 50)) == isqrt(floor(xp / 50)) for integers.
    (xp / BASE_XP).isqrt() as u32
}

/// Total XP required to reach `level`. Saturates at `u64::MAX`.
pub fn xp_required(level: u32) -> u64 {
    let level = u64::from(level);
    BASE_XP.saturating_mul(level * level)
}

/// Progress of a player within their current level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u64,
    /// XP threshold of the current level.
    pub current_level_xp: u64,
    /// XP threshold of the next level.
    pub next_level_xp: u64,
    pub xp_into_level: u64,
    pub xp_for_next_level: u64,
    /// Percentage in `[0, 100]`, two decimals.
    pub progress: f64,
}

pub fn level_progress(xp: u64) -> LevelProgress {
    let level = calculate_level_from_xp(xp);
    let current_level_xp = xp_required(level);
    let next_level_xp = xp_required(level.saturating_add(1));
    let span = next_level_xp.saturating_sub(current_level_xp);
    let xp_into_level = xp.saturating_sub(current_level_xp);

    let progress = if span == 0 {
        100.0
    } else {
        (xp_into_level as f64 / span as f64 * 100.0).clamp(0.0, 100.0)
    };

    LevelProgress {
        level,
        xp,
        current_level_xp,
        next_level_xp,
        xp_into_level,
        xp_for_next_level: next_level_xp.saturating_sub(xp),
        progress: round2(progress),
    }
}

/// XP awarded for one settled round.
pub fn xp_for_round(bet_amount: u128, outcome: GameOutcome) -> u64 {
    let volume = u64::try_from(bet_amount / WEI_PER_VOLUME_XP)
        .unwrap_or(u64::MAX)
        .min(MAX_VOLUME_XP);

    let bonus = match outcome {
        GameOutcome::Blackjack => XP_WIN_BONUS + XP_BLACKJACK_BONUS,
        GameOutcome::Win => XP_WIN_BONUS,
        GameOutcome::Push | GameOutcome::Loss | GameOutcome::Surrender => 0,
    };

    XP_PER_ROUND + bonus + volume
}

/// Cosmetic player classification derived from level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum VipTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl VipTier {
    pub fn from_level(level: u32) -> Self {
        match level {
            0..=4 => VipTier::Bronze,
            5..=9 => VipTier::Silver,
            10..=19 => VipTier::Gold,
            20..=34 => VipTier::Platinum,
            _ => VipTier::Diamond,
        }
    }
}

impl std::fmt::Display for VipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VipTier::Bronze => "bronze",
            VipTier::Silver => "silver",
            VipTier::Gold => "gold",
            VipTier::Platinum => "platinum",
            VipTier::Diamond => "diamond",
        };
        f.write_str(name)
    }
}
