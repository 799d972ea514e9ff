// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! EIP-191 `personal_sign` verification.

use alloy::primitives::Signature;
use chrono::{DateTime, SecondsFormat, Utc};

use super::AuthError;
use crate::models::WalletAddress;

/// Message a wallet signs to prove control of its address.
pub fn sign_in_message(
    wallet: &WalletAddress,
    nonce: &str,
    chain_id: u64,
    issued_at: DateTime<Utc>,
) -> String {
    format!(
        "Sign in to Vyre Casino\n\nWallet: {wallet}\nNonce: {nonce}\nChain ID: {chain_id}\nIssued At: {}",
        issued_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Recover the address that produced `signature` over `message`.
///
/// `signature` is the 65-byte `r || s || v` hex string returned by the wallet.
pub fn recover_signer(message: &str, signature: &str) -> Result<WalletAddress, AuthError> {
    let bytes = alloy::hex::decode(signature.trim())
        .map_err(|_| AuthError::MalformedWalletSignature)?;
    let signature =
        Signature::from_raw(&bytes).map_err(|_| AuthError::MalformedWalletSignature)?;
    let address = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|_| AuthError::SignatureMismatch)?;
    Ok(WalletAddress::from(address))
}

/// Check that `signature` over `message` was produced by `expected`.
pub fn verify_wallet_signature(
    expected: &WalletAddress,
    message: &str,
    signature: &str,
) -> Result<(), AuthError> {
    if &recover_signer(message, signature)? == expected {
        Ok(())
    } else {
        Err(AuthError::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    fn signed(message: &str) -> (WalletAddress, String) {
        let signer = PrivateKeySigner::random();
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        (
            WalletAddress::from(signer.address()),
            alloy::hex::encode_prefixed(signature.as_bytes()),
        )
    }

    #[test]
    fn recovers_personal_sign_signer() {
        let (wallet, signature) = signed("hello vyre");
        assert_eq!(recover_signer("hello vyre", &signature).unwrap(), wallet);
        verify_wallet_signature(&wallet, "hello vyre", &signature).unwrap();
    }

    #[test]
    fn tampered_message_fails() {
        let (wallet, signature) = signed("hello vyre");
        let result = verify_wallet_signature(&wallet, "hello vyre!", &signature);
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
    }

    #[test]
    fn malformed_signature_is_rejected() {
        assert!(matches!(
            recover_signer("msg", "0x1234"),
            Err(AuthError::MalformedWalletSignature)
        ));
        assert!(matches!(
            recover_signer("msg", "not-hex"),
            Err(AuthError::MalformedWalletSignature)
        ));
    }

    #[test]
    fn message_embeds_wallet_nonce_and_chain() {
        let wallet = WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
        let msg = sign_in_message(&wallet, "abc123", 8453, Utc::now());
        assert!(msg.contains("0x1111111111111111111111111111111111111111"));
        assert!(msg.contains("Nonce: abc123"));
        assert!(msg.contains("Chain ID: 8453"));
    }
}
