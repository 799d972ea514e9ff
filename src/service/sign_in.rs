// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Wallet sign-in: nonce issuance and signature verification.
//!
//! 1. The client requests a nonce for its address and receives the exact
//!    message to sign.
//! 2. The wallet signs the message with `personal_sign`.
//! 3. The client posts `{ address, signature, nonce }`. The nonce is
//!    consumed first, so a failed attempt burns it.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{users::ensure_user, ServiceResult};
use crate::auth::{
    generate_nonce, sign_in_message, verify_wallet_signature, AuthError, JwtManager, NonceRecord,
    NonceStore,
};
use crate::models::WalletAddress;
use crate::storage::CasinoDb;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedNonce {
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub wallet_address: WalletAddress,
}

pub async fn issue_nonce(
    nonces: &NonceStore,
    address: &WalletAddress,
    chain_id: u64,
    now: DateTime<Utc>,
) -> ServiceResult<IssuedNonce> {
    let nonce = generate_nonce();
    let message = sign_in_message(address, &nonce, chain_id, now);
    nonces
        .issue(
            &nonce,
            NonceRecord {
                address: address.clone(),
                chain_id,
                message: message.clone(),
            },
        )
        .await?;

    let ttl = chrono::Duration::from_std(nonces.ttl()).unwrap_or(chrono::Duration::zero());
    Ok(IssuedNonce {
        nonce,
        message,
        expires_at: now + ttl,
    })
}

/// Verify a signed nonce and open a session for the signer.
pub async fn verify_sign_in(
    db: &CasinoDb,
    nonces: &NonceStore,
    jwt: Option<&JwtManager>,
    address: &WalletAddress,
    signature: &str,
    nonce: &str,
    now: DateTime<Utc>,
) -> ServiceResult<SignedIn> {
    let jwt = jwt.ok_or(AuthError::NotConfigured)?;

    // Burned before the address check: a leaked nonce can be spent by anyone
    // presenting it, but only ever redeemed by the wallet it was issued to.
    let record = match nonces.consume(nonce).await? {
        Some(record) if &record.address == address => record,
        Some(_) => {
            warn!(wallet = %address, "Nonce presented by a different address");
            return Err(AuthError::InvalidNonce.into());
        }
        None => return Err(AuthError::InvalidNonce.into()),
    };

    verify_wallet_signature(address, &record.message, signature)?;

    ensure_user(db, record.chain_id, address, now)?;
    let issued = jwt.issue(address, record.chain_id, now)?;
    info!(
        wallet = %address,
        chain_id = record.chain_id,
        session_id = %issued.session_id,
        "Wallet signed in"
    );

    Ok(SignedIn {
        token: issued.token,
        expires_at: issued.expires_at,
        wallet_address: address.clone(),
    })
}
