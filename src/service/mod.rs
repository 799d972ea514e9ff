// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Service Layer
//!
//! Business rules between the HTTP handlers and the repositories. Functions
//! here take the database (and any other collaborators) explicitly and
//! return [`ServiceError`], which maps onto an HTTP status in one place.

pub mod activity;
pub mod analytics;
pub mod games;
pub mod leaderboard;
pub mod referrals;
pub mod sign_in;
pub mod users;

use crate::auth::{AuthError, NonceError};
use crate::error::ApiError;
use crate::models::ValidationError;
use crate::storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("nonce store error: {0}")]
    Nonce(#[from] NonceError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => e.into(),
            ServiceError::NotFound(_) => ApiError::not_found(err.to_string()),
            ServiceError::BadRequest(msg) => ApiError::bad_request(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Auth(e) => e.into(),
            ServiceError::Store(StoreError::Conflict(msg)) => ApiError::conflict(msg),
            ServiceError::Store(StoreError::NotFound(what)) => {
                ApiError::not_found(format!("{what} not found"))
            }
            ServiceError::Store(e) => ApiError::internal(e),
            ServiceError::Nonce(NonceError::Collision) => {
                ApiError::conflict("Nonce collision, request a new nonce")
            }
            ServiceError::Nonce(e) => {
                tracing::error!(error = %e, "Nonce store failure");
                AuthError::NonceStoreUnavailable.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn maps_to_http_status() {
        let cases: Vec<(ServiceError, StatusCode)> = vec![
            (ValidationError::InvalidReferralCode.into(), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("User"), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("dup".into()), StatusCode::CONFLICT),
            (StoreError::Conflict("dup".into()).into(), StatusCode::CONFLICT),
            (StoreError::NotFound("User".into()).into(), StatusCode::NOT_FOUND),
            (StoreError::InvalidKey("games").into(), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::SignatureMismatch.into(), StatusCode::UNAUTHORIZED),
            (NonceError::Poisoned.into(), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn not_found_message() {
        let api = ApiError::from(ServiceError::NotFound("User"));
        assert_eq!(api.message, "User not found");
    }
}
