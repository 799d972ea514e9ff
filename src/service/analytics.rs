// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Event logging and the acquisition funnel.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::ServiceResult;
use crate::events::{EventPayload, EventType};
use crate::models::{round2, ValidationError, WalletAddress};
use crate::storage::{CasinoDb, EventRepository, StoredEvent};

pub const DEFAULT_FUNNEL_DAYS: u32 = 7;
pub const MAX_FUNNEL_DAYS: u32 = 90;
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Validate and append one client event.
pub fn log_event(
    db: &CasinoDb,
    event_type: &str,
    data: Option<Value>,
    wallet: Option<&str>,
    session_id: Option<&str>,
    now: DateTime<Utc>,
) -> ServiceResult<Uuid> {
    let event = EventPayload::parse(event_type, data)?;
    let wallet_address = wallet.map(WalletAddress::parse).transpose()?;
    let session_id = match session_id.map(str::trim) {
        Some(s) if s.chars().count() > MAX_SESSION_ID_LEN => {
            return Err(ValidationError::Invalid(format!(
                "sessionId must be at most {MAX_SESSION_ID_LEN} characters"
            ))
            .into());
        }
        Some("") | None => None,
        Some(s) => Some(s.to_string()),
    };

    let stored = StoredEvent {
        id: Uuid::new_v4(),
        wallet_address,
        session_id,
        event,
        created_at: now,
    };
    EventRepository::new(db).insert(&stored)?;
    debug!(event_id = %stored.id, event_type = %stored.event.event_type(), "Event logged");
    Ok(stored.id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunnelStep {
    pub step: EventType,
    pub users: u64,
    /// Percentage of the previous step, two decimals.
    pub conversion_from_previous: f64,
    /// Percentage of the first step, two decimals.
    pub conversion_from_start: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunnelReport {
    pub days: u32,
    pub since: DateTime<Utc>,
    pub steps: Vec<FunnelStep>,
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

/// Unique actors reaching each funnel step within the last `days`.
///
/// Steps are counted independently: an actor counts for a step if it logged
/// that event in the window, whether or not it logged the earlier steps.
/// Events without a wallet or session id are skipped.
pub fn funnel(db: &CasinoDb, days: Option<u32>, now: DateTime<Utc>) -> ServiceResult<FunnelReport> {
    let days = days.unwrap_or(DEFAULT_FUNNEL_DAYS).clamp(1, MAX_FUNNEL_DAYS);
    let since = now - Duration::days(i64::from(days));

    let mut actors: Vec<HashSet<String>> = vec![HashSet::new(); EventType::FUNNEL.len()];
    for event in EventRepository::new(db).scan_since(since)? {
        let kind = event.event.event_type();
        let Some(actor) = event.actor() else {
            continue;
        };
        if let Some(i) = EventType::FUNNEL.iter().position(|step| *step == kind) {
            actors[i].insert(actor);
        }
    }

    let start = actors.first().map_or(0, |s| s.len() as u64);
    let mut previous = start;
    let steps = EventType::FUNNEL
        .iter()
        .zip(&actors)
        .map(|(&step, set)| {
            let users = set.len() as u64;
            let entry = FunnelStep {
                step,
                users,
                conversion_from_previous: if step == EventType::FUNNEL[0] {
                    percentage(users, users)
                } else {
                    percentage(users, previous)
                },
                conversion_from_start: percentage(users, start),
            };
            previous = users;
            entry
        })
        .collect();

    Ok(FunnelReport { days, since, steps })
}
