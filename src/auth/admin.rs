// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Admin API key verification.
//!
//! The configured key is never compared byte by byte. Both the configured
//! and the presented key are MACed under a per-process random key and the
//! tags are compared with `verify_slice`, which runs in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct AdminKeyVerifier {
    mac_key: [u8; 32],
    expected_tag: Vec<u8>,
}

impl AdminKeyVerifier {
    /// Returns `None` for an empty key so a blank env var disables admin access.
    pub fn new(api_key: &str) -> Option<Self> {
        if api_key.is_empty() {
            return None;
        }
        let mac_key: [u8; 32] = rand::random();
        let expected_tag = tag(&mac_key, api_key.as_bytes())?.finalize().into_bytes().to_vec();
        Some(Self {
            mac_key,
            expected_tag,
        })
    }

    pub fn verify(&self, presented: &str) -> bool {
        tag(&self.mac_key, presented.as_bytes())
            .map(|mac| mac.verify_slice(&self.expected_tag).is_ok())
            .unwrap_or(false)
    }
}

fn tag(mac_key: &[u8], data: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(mac_key).ok()?;
    mac.update(data);
    Some(mac)
}
