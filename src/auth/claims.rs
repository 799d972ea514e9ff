// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Session JWT claims and the authenticated wallet representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::WalletAddress;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: lowercase wallet address
    pub sub: String,
    /// Chain the wallet signed in on
    pub chain_id: u64,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    /// Session identifier
    pub jti: String,
}

/// Authenticated wallet extracted from a verified session token.
///
/// This is the type handlers receive through the `WalletAuth` extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedWallet {
    pub wallet_address: WalletAddress,
    pub chain_id: u64,
    pub session_id: String,
    /// Token expiration (Unix seconds)
    pub expires_at: i64,
}

impl AuthenticatedWallet {
    /// Whether this session belongs to `wallet`.
    pub fn owns(&self, wallet: &WalletAddress) -> bool {
        &self.wallet_address == wallet
    }
}

impl TryFrom<SessionClaims> for AuthenticatedWallet {
    type Error = crate::models::ValidationError;

    fn try_from(claims: SessionClaims) -> Result<Self, Self::Error> {
        Ok(Self {
            wallet_address: WalletAddress::parse(&claims.sub)?,
            chain_id: claims.chain_id,
            session_id: claims.jti,
            expires_at: claims.exp,
        })
    }
}
