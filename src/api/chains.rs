// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::service::ServiceError;
use crate::state::AppState;
use crate::storage::{ChainRepository, StoredChain};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainsResponse {
    pub default_chain_id: u64,
    pub chains: Vec<StoredChain>,
}

/// Chains the casino is deployed on.
#[utoipa::path(
    get,
    path = "/api/chains",
    tag = "Chains",
    responses((status = 200, body = ChainsResponse))
)]
pub async fn list_chains(State(state): State<AppState>) -> Result<Json<ChainsResponse>, ApiError> {
    let chains = ChainRepository::new(&state.db)
        .list()
        .map_err(ServiceError::from)?;
    Ok(Json(ChainsResponse {
        default_chain_id: state.default_chain_id,
        chains,
    }))
}
