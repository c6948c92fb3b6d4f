//! Response Metrics Routes

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use alert_core::Priority;
use response_metrics::{AggregateReport, MetricsFilter};

use crate::AppState;

/// Query parameters for the response report
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Window start, RFC 3339. Defaults to 24 hours before the end.
    pub since: Option<DateTime<Utc>>,
    /// Window end, RFC 3339. Defaults to now.
    pub until: Option<DateTime<Utc>>,
    /// Narrow to one priority band
    pub priority: Option<Priority>,
    /// Narrow to one member
    pub member_id: Option<String>,
}

/// Aggregate response-time report over a window
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Json<AggregateReport> {
    let until = params.until.unwrap_or_else(Utc::now);
    let since = params.since.unwrap_or_else(|| until - Duration::hours(24));
    let filter = MetricsFilter {
        priority: params.priority,
        member: params.member_id,
    };

    Json(state.service.metrics_report(since, until, &filter).await)
}
