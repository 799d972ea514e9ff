// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Wallet sign-in endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{ApiJson, ApiQuery};
use crate::auth::{AuthenticatedWallet, WalletAuth};
use crate::error::ApiError;
use crate::models::WalletAddress;
use crate::service::sign_in;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NonceQuery {
    /// Wallet that will sign the message.
    pub address: String,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NonceResponse {
    pub nonce: String,
    /// Sign this exact text with `personal_sign`.
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub address: String,
    /// 65-byte hex signature, `0x` optional.
    pub signature: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub wallet_address: WalletAddress,
}

#[utoipa::path(
    get,
    path = "/api/auth/nonce",
    tag = "Auth",
    params(NonceQuery),
    responses(
        (status = 200, body = NonceResponse),
        (status = 400, description = "Invalid wallet address")
    )
)]
pub async fn get_nonce(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NonceQuery>,
) -> Result<Json<NonceResponse>, ApiError> {
    let address = WalletAddress::parse(&query.address)?;
    let chain_id = query.chain_id.unwrap_or(state.default_chain_id);

    let issued = sign_in::issue_nonce(&state.nonces, &address, chain_id, Utc::now()).await?;
    Ok(Json(NonceResponse {
        nonce: issued.nonce,
        message: issued.message,
        expires_at: issued.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, body = VerifyResponse),
        (status = 401, description = "Invalid nonce or signature"),
        (status = 503, description = "Sign-in not configured")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let address = WalletAddress::parse(&request.address)?;
    let session = sign_in::verify_sign_in(
        &state.db,
        &state.nonces,
        state.jwt.as_deref(),
        &address,
        request.signature.trim(),
        request.nonce.trim(),
        Utc::now(),
    )
    .await?;

    Ok(Json(VerifyResponse {
        token: session.token,
        expires_at: session.expires_at,
        wallet_address: session.wallet_address,
    }))
}

/// The session behind the bearer token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, body = AuthenticatedWallet),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn me(WalletAuth(session): WalletAuth) -> Json<AuthenticatedWallet> {
    Json(session)
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::api::test_support::{bearer, body_json, send, send_json, signed_in_state};
    use crate::state::AppState;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    const PLAYER: &str = "0x5555555555555555555555555555555555555555";

    #[tokio::test]
    async fn nonce_sign_verify_me() {
        let (state, _) = signed_in_state(PLAYER);
        let app = router(state);
        let signer = PrivateKeySigner::random();
        let address = signer.address().to_string().to_lowercase();

        let issued = send(&app, Method::GET, &format!("/api/auth/nonce?address={address}"), &[]).await;
        assert_eq!(issued.status(), StatusCode::OK);
        let issued = body_json(issued).await;
        let nonce = issued["nonce"].as_str().unwrap().to_string();
        let message = issued["message"].as_str().unwrap();

        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let signature = alloy::hex::encode_prefixed(signature.as_bytes());

        let verified = send_json(
            &app,
            Method::POST,
            "/api/auth/verify",
            json!({ "address": address, "signature": signature, "nonce": nonce }),
            &[],
        )
        .await;
        assert_eq!(verified.status(), StatusCode::OK);
        let verified = body_json(verified).await;
        assert_eq!(verified["walletAddress"], address.as_str());
        let token = verified["token"].as_str().unwrap().to_string();

        let me = send(&app, Method::GET, "/api/auth/me", &[bearer(&token)]).await;
        assert_eq!(me.status(), StatusCode::OK);
        let me = body_json(me).await;
        assert_eq!(me["walletAddress"], address.as_str());
        assert_eq!(me["chainId"], 8453);

        // The nonce is single use.
        let replay = send_json(
            &app,
            Method::POST,
            "/api/auth/verify",
            json!({ "address": address, "signature": signature, "nonce": nonce }),
            &[],
        )
        .await;
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn nonce_rejects_bad_address() {
        let app = router(AppState::for_tests());
        let response = send(&app, Method::GET, "/api/auth/nonce?address=0x1234", &[]).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_unconfigured_is_503() {
        let app = router(AppState::for_tests());
        let response = send_json(
            &app,
            Method::POST,
            "/api/auth/verify",
            json!({ "address": PLAYER, "signature": "0x00", "nonce": "abc" }),
            &[],
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn me_rejects_garbage_token() {
        let (state, _) = signed_in_state(PLAYER);
        let app = router(state);
        let response = send(&app, Method::GET, "/api/auth/me", &[bearer("not-a-jwt")]).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
