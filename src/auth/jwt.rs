// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! HS256 session tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::{AuthError, AuthenticatedWallet, SessionClaims};
use crate::config::MAX_JWT_EXPIRY_SECS;
use crate::models::WalletAddress;

pub const JWT_ISSUER: &str = "vyre-casino-api";
pub const JWT_AUDIENCE: &str = "vyre-casino";

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens with a shared secret.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl JwtManager {
    pub fn new(secret: &[u8], expiry_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[JWT_ISSUER]);
        validation.set_audience(&[JWT_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            // Capped well inside chrono's range.
            expiry: Duration::seconds(expiry_secs.min(MAX_JWT_EXPIRY_SECS) as i64),
        }
    }

    pub fn issue(
        &self,
        wallet: &WalletAddress,
        chain_id: u64,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let expires_at = now
            .checked_add_signed(self.expiry)
            .ok_or_else(|| AuthError::InternalError("token expiry out of range".to_string()))?;
        let session_id = Uuid::new_v4().to_string();
        let claims = SessionClaims {
            sub: wallet.to_string(),
            chain_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: JWT_ISSUER.to_string(),
            aud: JWT_AUDIENCE.to_string(),
            jti: session_id.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            session_id,
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedWallet, AuthError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        AuthenticatedWallet::try_from(token_data.claims).map_err(|_| AuthError::MalformedToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x742d35cc6634c0532925a3b844bc9e7595f4ab12").unwrap()
    }

    #[test]
    fn issue_then_verify() {
        let jwt = JwtManager::new(b"test-secret", 3600);
        let issued = jwt.issue(&wallet(), 8453, Utc::now()).unwrap();

        let session = jwt.verify(&issued.token).unwrap();
        assert_eq!(session.wallet_address, wallet());
        assert_eq!(session.chain_id, 8453);
        assert_eq!(session.session_id, issued.session_id);
        assert_eq!(session.expires_at, issued.expires_at.timestamp());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let jwt = JwtManager::new(b"test-secret", 60);
        let issued = jwt
            .issue(&wallet(), 8453, Utc::now() - Duration::hours(1))
            .unwrap();
        assert!(matches!(jwt.verify(&issued.token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let issued = JwtManager::new(b"secret-a", 3600)
            .issue(&wallet(), 8453, Utc::now())
            .unwrap();
        let result = JwtManager::new(b"secret-b", 3600).verify(&issued.token);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn oversized_expiry_is_capped() {
        let jwt = JwtManager::new(b"test-secret", 10_000_000_000_000_000);
        let now = Utc::now();
        let issued = jwt.issue(&wallet(), 8453, now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::seconds(MAX_JWT_EXPIRY_SECS as i64));
        assert!(jwt.verify(&issued.token).is_ok());
    }

    #[test]
    fn expiry_past_the_calendar_is_an_error() {
        let jwt = JwtManager::new(b"test-secret", 3600);
        let result = jwt.issue(&wallet(), 8453, DateTime::<Utc>::MAX_UTC);
        assert!(matches!(result, Err(AuthError::InternalError(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        let jwt = JwtManager::new(b"test-secret", 3600);
        assert!(matches!(jwt.verify("not.a.jwt"), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let secret = b"test-secret";
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: wallet().to_string(),
            chain_id: 8453,
            iat: now,
            exp: now + 600,
            iss: JWT_ISSUER.to_string(),
            aud: "someone-else".to_string(),
            jti: "x".to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret)).unwrap();
        let result = JwtManager::new(secret, 3600).verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidAudience)));
    }
}
