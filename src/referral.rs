// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Referral codes and the two-tier revenue share.
//!
//! Referral payouts come out of the house edge of each settled wager:
//! tier 1 (the direct referrer) earns [`TIER1_SHARE_BPS`] of it, tier 2 (the
//! referrer's referrer) earns [`TIER2_SHARE_BPS`]. All maths is integer wei,
//! rounding down.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ValidationError;

pub const CODE_LEN: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// House edge applied to every wager, in basis points.
pub const HOUSE_EDGE_BPS: u128 = 100;
/// Tier-1 share of the house edge, in basis points.
pub const TIER1_SHARE_BPS: u128 = 1_000;
/// Tier-2 share of the house edge, in basis points.
pub const TIER2_SHARE_BPS: u128 = 500;

const BPS_DENOMINATOR: u128 = 10_000;

/// An 8-character uppercase alphanumeric referral code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "VYRE2024")]
pub struct ReferralCode(String);

impl ReferralCode {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if is_valid_referral_code(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidReferralCode)
        }
    }

    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Exactly 8 characters from `[A-Z0-9]`.
pub fn is_valid_referral_code(raw: &str) -> bool {
    raw.len() == CODE_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

impl TryFrom<String> for ReferralCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferralCode> for String {
    fn from(value: ReferralCode) -> Self {
        value.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Referral depth of an earning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReferralTier {
    Direct,
    Indirect,
}

impl ReferralTier {
    pub fn share_bps(self) -> u128 {
        match self {
            ReferralTier::Direct => TIER1_SHARE_BPS,
            ReferralTier::Indirect => TIER2_SHARE_BPS,
        }
    }
}

impl From<ReferralTier> for u8 {
    fn from(value: ReferralTier) -> Self {
        match value {
            ReferralTier::Direct => 1,
            ReferralTier::Indirect => 2,
        }
    }
}

impl TryFrom<u8> for ReferralTier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ReferralTier::Direct),
            2 => Ok(ReferralTier::Indirect),
            other => Err(format!("invalid referral tier {other}")),
        }
    }
}

/// House edge retained on a wager.
pub fn house_edge(bet_amount: u128) -> u128 {
    bet_amount / BPS_DENOMINATOR * HOUSE_EDGE_BPS
        + bet_amount % BPS_DENOMINATOR * HOUSE_EDGE_BPS / BPS_DENOMINATOR
}

/// Referral share for a given tier on a wager.
pub fn referral_share(bet_amount: u128, tier: ReferralTier) -> u128 {
    let edge = house_edge(bet_amount);
    edge / BPS_DENOMINATOR * tier.share_bps()
        + edge % BPS_DENOMINATOR * tier.share_bps() / BPS_DENOMINATOR
}
