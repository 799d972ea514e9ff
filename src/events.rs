// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Analytics event types and their typed payloads.
//!
//! Clients send `{ eventType, data }`. The pair is decoded into
//! [`EventPayload`], an adjacently tagged union, so every event kind has a
//! fixed shape and unknown fields are rejected at the boundary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::models::ValidationError;

/// Largest accepted serialized `data` object, in bytes.
pub const MAX_EVENT_DATA_BYTES: usize = 4096;

/// Outcome of a settled blackjack round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Win,
    Loss,
    Push,
    Blackjack,
    Surrender,
}

impl GameOutcome {
    pub fn is_win(self) -> bool {
        matches!(self, GameOutcome::Win | GameOutcome::Blackjack)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    WalletConnect,
    WalletDisconnect,
    Signup,
    SessionKeyCreated,
    GameStart,
    GameComplete,
    ReferralLinkClick,
    Deposit,
    Withdrawal,
    Error,
}

impl EventType {
    pub const ALL: [EventType; 11] = [
        EventType::PageView,
        EventType::WalletConnect,
        EventType::WalletDisconnect,
        EventType::Signup,
        EventType::SessionKeyCreated,
        EventType::GameStart,
        EventType::GameComplete,
        EventType::ReferralLinkClick,
        EventType::Deposit,
        EventType::Withdrawal,
        EventType::Error,
    ];

    /// Ordered steps of the acquisition funnel.
    pub const FUNNEL: [EventType; 5] = [
        EventType::PageView,
        EventType::WalletConnect,
        EventType::SessionKeyCreated,
        EventType::GameStart,
        EventType::GameComplete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::PageView => "page_view",
            EventType::WalletConnect => "wallet_connect",
            EventType::WalletDisconnect => "wallet_disconnect",
            EventType::Signup => "signup",
            EventType::SessionKeyCreated => "session_key_created",
            EventType::GameStart => "game_start",
            EventType::GameComplete => "game_complete",
            EventType::ReferralLinkClick => "referral_link_click",
            EventType::Deposit => "deposit",
            EventType::Withdrawal => "withdrawal",
            EventType::Error => "error",
        }
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::Invalid(format!("Invalid eventType: {s}")))
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PageViewData {
    pub path: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WalletConnectData {
    pub connector: Option<String>,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WalletDisconnectData {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SignupData {
    pub referral_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionKeyData {
    /// Unix seconds at which the session key lapses.
    pub expires_at: Option<i64>,
    /// Whether a previously cached key was reused.
    pub reused: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GameStartData {
    pub game_id: Option<String>,
    pub bet_amount: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GameCompleteData {
    pub game_id: Option<String>,
    pub outcome: Option<GameOutcome>,
    pub payout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ReferralClickData {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TransferData {
    pub amount: Option<String>,
    pub token: Option<String>,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ErrorData {
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Event payload discriminated by event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    PageView(PageViewData),
    WalletConnect(WalletConnectData),
    WalletDisconnect(WalletDisconnectData),
    Signup(SignupData),
    SessionKeyCreated(SessionKeyData),
    GameStart(GameStartData),
    GameComplete(GameCompleteData),
    ReferralLinkClick(ReferralClickData),
    Deposit(TransferData),
    Withdrawal(TransferData),
    Error(ErrorData),
}

impl EventPayload {
    /// Decode raw client input into a typed payload.
    ///
    /// A missing or `null` `data` is treated as an empty object.
    pub fn parse(event_type: &str, data: Option<Value>) -> Result<Self, ValidationError> {
        let kind: EventType = event_type.parse()?;

        let data = match data {
            None | Some(Value::Null) => json!({}),
            Some(v) => v,
        };

        if data.to_string().len() > MAX_EVENT_DATA_BYTES {
            return Err(ValidationError::Invalid("Event data too large".to_string()));
        }

        serde_json::from_value(json!({ "eventType": kind.as_str(), "data": data }))
            .map_err(|_| ValidationError::Invalid(format!("Invalid event data for {kind}")))
    }

    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::PageView(_) => EventType::PageView,
            EventPayload::WalletConnect(_) => EventType::WalletConnect,
            EventPayload::WalletDisconnect(_) => EventType::WalletDisconnect,
            EventPayload::Signup(_) => EventType::Signup,
            EventPayload::SessionKeyCreated(_) => EventType::SessionKeyCreated,
            EventPayload::GameStart(_) => EventType::GameStart,
            EventPayload::GameComplete(_) => EventType::GameComplete,
            EventPayload::ReferralLinkClick(_) => EventType::ReferralLinkClick,
            EventPayload::Deposit(_) => EventType::Deposit,
            EventPayload::Withdrawal(_) => EventType::Withdrawal,
            EventPayload::Error(_) => EventType::Error,
        }
    }
}
