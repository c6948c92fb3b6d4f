//! Team Roster Routes

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use team_directory::TeamMemberSnapshot;

use crate::AppState;

/// Response for the roster listing
#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub data: Vec<TeamMemberSnapshot>,
    pub count: usize,
}

/// Upsert one member from the CRM roster sync
pub async fn upsert_member(
    State(state): State<Arc<AppState>>,
    Json(member): Json<TeamMemberSnapshot>,
) -> (StatusCode, Json<TeamMemberSnapshot>) {
    let replaced = state.directory.upsert(member.clone()).await;
    let status = if replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (status, Json(member))
}

/// Current roster as the engine sees it
pub async fn get_roster(State(state): State<Arc<AppState>>) -> Json<RosterResponse> {
    let data = state.directory.members().await;
    Json(RosterResponse {
        count: data.len(),
        data,
    })
}
