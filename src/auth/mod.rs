// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Authentication Module
//!
//! Wallet-signature sign-in and admin API key checks.
//!
//! ## Auth Flow
//!
//! 1. Client calls `GET /api/auth/nonce?address=0x…` and receives a
//!    single-use nonce plus the exact message to sign
//! 2. Wallet signs the message with EIP-191 `personal_sign`
//! 3. Client posts `{ address, signature, nonce }` to `/api/auth/verify`
//! 4. Server consumes the nonce, recovers the signer and, if it matches,
//!    issues an HS256 session JWT
//! 5. Client sends `Authorization: Bearer <JWT>` on protected routes
//!
//! ## Security
//!
//! - Nonces expire after 300 seconds and are bound to the requesting address
//! - JWT issuer and audience are pinned; clock skew tolerance is 60 seconds
//! - The admin key is compared in constant time
//! - Missing secrets disable the corresponding routes with 503

pub mod admin;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwt;
pub mod nonce;
pub mod signature;

pub use admin::AdminKeyVerifier;
pub use claims::{AuthenticatedWallet, SessionClaims};
pub use error::AuthError;
pub use extractor::{AdminAccess, WalletAuth, ADMIN_KEY_HEADER};
pub use jwt::{IssuedToken, JwtManager, JWT_AUDIENCE, JWT_ISSUER};
pub use nonce::{generate_nonce, NonceError, NonceRecord, NonceStore, NONCE_TTL};
pub use signature::{recover_signer, sign_in_message, verify_wallet_signature};
