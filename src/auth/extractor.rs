// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Axum extractors for wallet sessions and admin access.
//!
//! ```rust,ignore
//! async fn claim(WalletAuth(session): WalletAuth) -> impl IntoResponse {
//!     // session is AuthenticatedWallet
//! }
//!
//! async fn regenerate(_admin: AdminAccess) -> impl IntoResponse { .. }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedWallet};
use crate::state::AppState;

/// Header carrying the admin API key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-api-key";

/// Extractor for a verified wallet session (`Authorization: Bearer <JWT>`).
pub struct WalletAuth(pub AuthenticatedWallet);

impl FromRequestParts<AppState> for WalletAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jwt = state.jwt.as_ref().ok_or(AuthError::NotConfigured)?;

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let session = jwt.verify(token.trim())?;
        Ok(WalletAuth(session))
    }
}

/// `Option<WalletAuth>` is `None` only when no `Authorization` header is sent.
/// A header that is present must still verify.
impl axum::extract::OptionalFromRequestParts<AppState> for WalletAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }
        <WalletAuth as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}

/// Extractor that requires the admin API key.
///
/// Checks run in order: key not configured (503), header missing (401),
/// key wrong (403).
pub struct AdminAccess;

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let verifier = state.admin.as_ref().ok_or(AuthError::AdminNotConfigured)?;

        let presented = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .ok_or(AuthError::MissingAdminKey)?
            .to_str()
            .map_err(|_| AuthError::InvalidAdminKey)?;

        if !verifier.verify(presented) {
            tracing::warn!("Rejected admin request with invalid API key");
            return Err(AuthError::InvalidAdminKey);
        }

        Ok(AdminAccess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AdminKeyVerifier, JwtManager};
    use crate::models::WalletAddress;
    use axum::http::Request;
    use chrono::Utc;
    use std::sync::Arc;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/test");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn state_with_auth() -> AppState {
        AppState::for_tests()
            .with_jwt(Arc::new(JwtManager::new(b"secret", 3600)))
            .with_admin(Arc::new(AdminKeyVerifier::new("admin-key").unwrap()))
    }

    #[tokio::test]
    async fn wallet_auth_requires_configuration() {
        let state = AppState::for_tests();
        let result = WalletAuth::from_request_parts(&mut parts(&[]), &state).await;
        assert!(matches!(result, Err(AuthError::NotConfigured)));
    }

    #[tokio::test]
    async fn wallet_auth_requires_header() {
        let state = state_with_auth();
        let result = WalletAuth::from_request_parts(&mut parts(&[]), &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));

        let result =
            WalletAuth::from_request_parts(&mut parts(&[("authorization", "Token abc")]), &state)
                .await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn wallet_auth_accepts_issued_token() {
        let state = state_with_auth();
        let wallet = WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
        let issued = state
            .jwt
            .as_ref()
            .unwrap()
            .issue(&wallet, 8453, Utc::now())
            .unwrap();
        let header = format!("Bearer {}", issued.token);

        let WalletAuth(session) =
            WalletAuth::from_request_parts(&mut parts(&[("authorization", &header)]), &state)
                .await
                .unwrap();
        assert_eq!(session.wallet_address, wallet);
    }

    #[tokio::test]
    async fn optional_wallet_auth() {
        use axum::extract::OptionalFromRequestParts;

        let state = state_with_auth();
        let absent =
            <WalletAuth as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts(&[]), &state)
                .await
                .unwrap();
        assert!(absent.is_none());

        let invalid = <WalletAuth as OptionalFromRequestParts<AppState>>::from_request_parts(
            &mut parts(&[("authorization", "Bearer nope")]),
            &state,
        )
        .await;
        assert!(matches!(invalid, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn admin_access_check_order() {
        let unconfigured = AppState::for_tests();
        let result = AdminAccess::from_request_parts(&mut parts(&[]), &unconfigured).await;
        assert!(matches!(result, Err(AuthError::AdminNotConfigured)));

        let state = state_with_auth();
        let result = AdminAccess::from_request_parts(&mut parts(&[]), &state).await;
        assert!(matches!(result, Err(AuthError::MissingAdminKey)));

        let result =
            AdminAccess::from_request_parts(&mut parts(&[(ADMIN_KEY_HEADER, "nope")]), &state)
                .await;
        assert!(matches!(result, Err(AuthError::InvalidAdminKey)));

        let result =
            AdminAccess::from_request_parts(&mut parts(&[(ADMIN_KEY_HEADER, "admin-key")]), &state)
                .await;
        assert!(result.is_ok());
    }
}
