// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Shared Domain Types
//!
//! Validated newtypes and serde helpers used across the API, service and
//! storage layers.
//!
//! ## Wallet Address Type
//!
//! [`WalletAddress`] only exists in validated form: `0x` followed by exactly
//! 40 hexadecimal characters (42 characters total). It is normalised to
//! lowercase so it can be used directly as a storage key.
//!
//! ## Amounts
//!
//! On-chain amounts are wei values that overflow JavaScript numbers, so they
//! travel as decimal strings. See [`amount`] and [`signed_amount`].

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Input validation failures. Always surfaced to clients as HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid wallet address format")]
    InvalidWalletAddress,

    #[error("Invalid referral code format")]
    InvalidReferralCode,

    #[error("Display name must be 1-32 characters of letters, digits, spaces, '_' or '-'")]
    InvalidDisplayName,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{0}")]
    Invalid(String),
}

// =============================================================================
// Wallet Address
// =============================================================================

/// Ethereum-compatible wallet address, lowercase normalised.
///
/// ```rust,ignore
/// let addr = WalletAddress::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")?;
/// assert_eq!(addr.as_str(), "0x742d35cc6634c0532925a3b844bc9e7595f4ab12");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "0x742d35cc6634c0532925a3b844bc9e7595f4ab12")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub const LEN: usize = 42;

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if is_valid_wallet_address(raw) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(ValidationError::InvalidWalletAddress)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for activity feeds (`0x1234…abcd`).
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[Self::LEN - 4..])
    }

    /// Convert to an alloy address for signature comparison.
    pub fn to_address(&self) -> alloy::primitives::Address {
        // Validated as 20 hex bytes at construction, so parsing cannot fail.
        self.0.parse().unwrap_or_default()
    }
}

/// Returns true for exactly `0x` + 40 hex digits.
pub fn is_valid_wallet_address(raw: &str) -> bool {
    raw.len() == WalletAddress::LEN
        && raw.starts_with("0x")
        && raw[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

impl TryFrom<String> for WalletAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

impl From<alloy::primitives::Address> for WalletAddress {
    fn from(value: alloy::primitives::Address) -> Self {
        Self(format!("{value:#x}"))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Display Name
// =============================================================================

pub const DISPLAY_NAME_MAX_LEN: usize = 32;

/// Validate and trim a user-chosen display name.
pub fn validate_display_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    let ok = !name.is_empty()
        && name.chars().count() <= DISPLAY_NAME_MAX_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-');
    if ok {
        Ok(name.to_string())
    } else {
        Err(ValidationError::InvalidDisplayName)
    }
}

/// Clamp an optional `limit` query parameter.
pub fn clamp_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).clamp(1, max)
}

/// Round to two decimal places for percentage fields.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a wei amount from its decimal string form.
pub fn parse_amount(raw: &str) -> Result<u128, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidAmount(raw.to_string()));
    }
    trimmed
        .parse::<u128>()
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))
}

/// Serde adapter for `u128` wei amounts as decimal strings.
pub mod amount {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_amount(&raw).map_err(D::Error::custom)
    }
}

/// Serde adapter for signed `i128` amounts (profit/loss) as decimal strings.
pub mod signed_amount {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim().parse::<i128>().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_accepts_42_char_hex() {
        let addr = WalletAddress::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12").unwrap();
        assert_eq!(addr.as_str(), "0x742d35cc6634c0532925a3b844bc9e7595f4ab12");
    }

    #[test]
    fn wallet_address_rejects_malformed_input() {
        for raw in [
            "",
            "0x",
            "742d35Cc6634C0532925a3b844Bc9e7595f4aB12",     // no prefix
            "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB1",    // 41 chars
            "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB123",  // 43 chars
            "0x742d35Cc6634C0532925a3b844Bc9e7595f4aBzz",   // non-hex
            "0X742d35Cc6634C0532925a3b844Bc9e7595f4aB12",   // upper-case prefix
            " 0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12",  // whitespace
        ] {
            assert_eq!(
                WalletAddress::parse(raw),
                Err(ValidationError::InvalidWalletAddress),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn wallet_address_deserializes_through_validation() {
        let ok: Result<WalletAddress, _> =
            serde_json::from_str(r#""0x1111111111111111111111111111111111111111""#);
        assert!(ok.is_ok());

        let bad: Result<WalletAddress, _> = serde_json::from_str(r#""0x1234""#);
        assert!(bad.is_err());
    }

    #[test]
    fn wallet_address_converts_to_alloy_address() {
        let addr = WalletAddress::parse("0x00000000000000000000000000000000000000ff").unwrap();
        let alloy_addr = addr.to_address();
        assert_eq!(WalletAddress::from(alloy_addr), addr);

        let mixed = WalletAddress::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12").unwrap();
        assert_eq!(
            mixed.to_address(),
            alloy::primitives::address!("0x742d35cc6634c0532925a3b844bc9e7595f4ab12")
        );
        assert_ne!(mixed.to_address(), alloy::primitives::Address::ZERO);
    }

    #[test]
    fn short_form_keeps_prefix_and_suffix() {
        let addr = WalletAddress::parse("0xabcdef0000000000000000000000000000001234").unwrap();
        assert_eq!(addr.short(), "0xabcd…1234");
    }

    #[test]
    fn display_name_rules() {
        assert_eq!(validate_display_name("  Ace_High-21 ").unwrap(), "Ace_High-21");
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name("<script>").is_err());
        assert!(validate_display_name(&"a".repeat(33)).is_err());
        assert!(validate_display_name(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn amounts_parse_decimal_strings_only() {
        assert_eq!(parse_amount("1000000000000000000").unwrap(), 10u128.pow(18));
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("1.5").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("0x10").is_err());
    }

    #[test]
    fn clamp_limit_applies_default_and_bounds() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
        assert_eq!(clamp_limit(Some(500), 20, 100), 100);
    }
}
