// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token issuer is invalid
    InvalidIssuer,
    /// Token audience is invalid
    InvalidAudience,
    /// Token is not yet valid
    TokenNotYetValid,
    /// JWT_SECRET is not configured
    NotConfigured,
    /// ADMIN_API_KEY is not configured
    AdminNotConfigured,
    /// Admin endpoint called without `X-Admin-API-Key`
    MissingAdminKey,
    /// Admin key does not match
    InvalidAdminKey,
    /// Nonce unknown, expired, already used or bound to another address
    InvalidNonce,
    /// Wallet signature could not be decoded
    MalformedWalletSignature,
    /// Recovered signer differs from the claimed address
    SignatureMismatch,
    /// Nonce backend unreachable
    NonceStoreUnavailable,
    /// Internal error
    InternalError(String),
    /// Insufficient permissions
    InsufficientPermissions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::NotConfigured => "auth_not_configured",
            AuthError::AdminNotConfigured => "admin_not_configured",
            AuthError::MissingAdminKey => "missing_admin_key",
            AuthError::InvalidAdminKey => "invalid_admin_key",
            AuthError::InvalidNonce => "invalid_nonce",
            AuthError::MalformedWalletSignature => "malformed_wallet_signature",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::NonceStoreUnavailable => "nonce_store_unavailable",
            AuthError::InternalError(_) => "internal_error",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience
            | AuthError::TokenNotYetValid
            | AuthError::MissingAdminKey
            | AuthError::InvalidNonce
            | AuthError::SignatureMismatch => StatusCode::UNAUTHORIZED,
            AuthError::MalformedWalletSignature => StatusCode::BAD_REQUEST,
            AuthError::InvalidAdminKey | AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::NotConfigured
            | AuthError::AdminNotConfigured
            | AuthError::NonceStoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::InvalidAudience => write!(f, "Token audience is invalid"),
            AuthError::TokenNotYetValid => write!(f, "Token is not yet valid"),
            AuthError::NotConfigured => write!(f, "Authentication is not configured"),
            AuthError::AdminNotConfigured => write!(f, "Admin API is not configured"),
            AuthError::MissingAdminKey => write!(f, "X-Admin-API-Key header is required"),
            AuthError::InvalidAdminKey => write!(f, "Invalid admin API key"),
            AuthError::InvalidNonce => write!(f, "Invalid or expired nonce"),
            AuthError::MalformedWalletSignature => write!(f, "Invalid signature format"),
            AuthError::SignatureMismatch => {
                write!(f, "Signature does not match the wallet address")
            }
            AuthError::NonceStoreUnavailable => write!(f, "Nonce store is unavailable"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Authentication failure");
        }
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["errorCode"], "missing_auth_header");
        assert_eq!(body["error"], "Authorization header is required");
    }

    #[test]
    fn admin_key_errors_follow_check_order() {
        assert_eq!(AuthError::AdminNotConfigured.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AuthError::MissingAdminKey.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidAdminKey.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unconfigured_auth_returns_503() {
        let response = AuthError::NotConfigured.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
