//! Alert Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use alert_core::{Alert, ResponseOutcome};
use alert_service::CreateAlertRequest;

use crate::routes::ApiError;
use crate::AppState;

/// Response for the active alert listing
#[derive(Debug, Serialize)]
pub struct ActiveAlertsResponse {
    pub data: Vec<Alert>,
    pub count: usize,
}

/// Body for acknowledge calls
#[derive(Debug, Deserialize)]
pub struct AcknowledgeBody {
    pub member_id: String,
}

/// Body for respond calls
#[derive(Debug, Deserialize)]
pub struct RespondBody {
    pub member_id: String,
    pub outcome: ResponseOutcome,
}

/// Outcome of an acknowledge or respond call
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub applied: bool,
    pub alert: Alert,
}

/// Open an alert for a fresh lead
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<Alert>), ApiError> {
    let alert = state.service.create_alert(body).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// List non-terminal alerts, oldest first
pub async fn get_active(State(state): State<Arc<AppState>>) -> Json<ActiveAlertsResponse> {
    let data = state.service.active_alerts().await;
    Json(ActiveAlertsResponse {
        count: data.len(),
        data,
    })
}

/// Fetch one alert
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Alert>, ApiError> {
    let alert = state.service.get_alert(id).await?;
    Ok(Json(alert))
}

/// Record that a member has seen the alert
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<AcknowledgeBody>,
) -> Result<Json<ActionResponse>, ApiError> {
    let (alert, applied) = state.service.acknowledge(id, &body.member_id).await?;
    Ok(Json(ActionResponse { applied, alert }))
}

/// Record the actual response and close the alert
pub async fn respond(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RespondBody>,
) -> Result<Json<ActionResponse>, ApiError> {
    let (alert, applied) = state
        .service
        .respond(id, &body.member_id, body.outcome)
        .await?;
    Ok(Json(ActionResponse { applied, alert }))
}
