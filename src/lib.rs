// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Vyre Casino API - Web3 Blackjack Platform Backend
//!
//! Off-chain companion to the on-chain blackjack contract: player profiles,
//! XP and VIP progression, a two-tier referral program, leaderboards,
//! analytics events and wallet-signature sign-in.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and OpenAPI document
//! - `auth` - Wallet sign-in, session JWTs and the admin key
//! - `service` - Business operations shared by handlers and jobs
//! - `storage` - Embedded redb database and repositories
//! - `leaderboard_job` - Periodic snapshot regeneration
//! - `session` - Session-key transaction dispatch with passkey fallback

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod leaderboard_job;
pub mod models;
pub mod progression;
pub mod referral;
pub mod service;
pub mod session;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod tls;
