// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Client analytics events and the conversion funnel.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{ApiJson, ApiQuery};
use crate::auth::AdminAccess;
use crate::error::ApiError;
use crate::events::EventType;
use crate::service::analytics;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogEventRequest {
    #[schema(example = "wallet_connect")]
    pub event_type: String,
    /// Type-specific payload; shape depends on `eventType`.
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    pub wallet_address: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogEventResponse {
    pub success: bool,
    pub event_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FunnelQuery {
    /// Look-back window in days (default 7, max 90).
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStepResponse {
    pub step: EventType,
    pub users: u64,
    pub conversion_from_previous: f64,
    pub conversion_from_start: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelResponse {
    pub days: u32,
    pub since: DateTime<Utc>,
    pub steps: Vec<FunnelStepResponse>,
}

#[utoipa::path(
    post,
    path = "/api/events",
    tag = "Events",
    request_body = LogEventRequest,
    responses(
        (status = 200, body = LogEventResponse),
        (status = 400, description = "Unknown event type or invalid payload")
    )
)]
pub async fn log_event(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LogEventRequest>,
) -> Result<Json<LogEventResponse>, ApiError> {
    let event_id = analytics::log_event(
        &state.db,
        &request.event_type,
        request.data,
        request.wallet_address.as_deref(),
        request.session_id.as_deref(),
        Utc::now(),
    )?;
    Ok(Json(LogEventResponse {
        success: true,
        event_id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/events/funnel",
    tag = "Events",
    security(("admin_key" = [])),
    params(FunnelQuery),
    responses(
        (status = 200, body = FunnelResponse),
        (status = 401, description = "Missing admin key"),
        (status = 403, description = "Invalid admin key"),
        (status = 503, description = "Admin API not configured")
    )
)]
pub async fn get_funnel(
    State(state): State<AppState>,
    _admin: AdminAccess,
    ApiQuery(query): ApiQuery<FunnelQuery>,
) -> Result<Json<FunnelResponse>, ApiError> {
    let report = analytics::funnel(&state.db, query.days, Utc::now())?;
    Ok(Json(FunnelResponse {
        days: report.days,
        since: report.since,
        steps: report
            .steps
            .into_iter()
            .map(|s| FunnelStepResponse {
                step: s.step,
                users: s.users,
                conversion_from_previous: s.conversion_from_previous,
                conversion_from_start: s.conversion_from_start,
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::api::test_support::{admin_key, admin_state, body_json, send, send_json};
    use crate::state::AppState;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    const WALLET: &str = "0x6666666666666666666666666666666666666666";

    #[tokio::test]
    async fn logs_wallet_connect() {
        let app = router(AppState::for_tests());
        let response = send_json(
            &app,
            Method::POST,
            "/api/events",
            json!({
                "eventType": "wallet_connect",
                "data": { "connector": "metamask", "chainId": 8453 },
                "walletAddress": WALLET,
                "sessionId": "s-1"
            }),
            &[],
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(body["eventId"].is_string());
    }

    #[tokio::test]
    async fn rejects_unknown_event_type() {
        let app = router(AppState::for_tests());
        let response = send_json(
            &app,
            Method::POST,
            "/api/events",
            json!({ "eventType": "teleport" }),
            &[],
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Invalid eventType"), "{error}");
    }

    #[tokio::test]
    async fn funnel_is_admin_only() {
        let app = router(admin_state());
        let denied = send(&app, Method::GET, "/api/events/funnel", &[]).await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        for event_type in ["page_view", "wallet_connect"] {
            let response = send_json(
                &app,
                Method::POST,
                "/api/events",
                json!({ "eventType": event_type, "walletAddress": WALLET }),
                &[],
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK, "{event_type}");
        }

        let response = send(&app, Method::GET, "/api/events/funnel?days=1", &[admin_key()]).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["days"], 1);
        assert_eq!(body["steps"][0]["users"], 1);
        assert_eq!(body["steps"][1]["users"], 1);
        assert_eq!(body["steps"][1]["conversionFromPrevious"], 100.0);
    }
}
