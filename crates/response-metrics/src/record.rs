//! Individual metric records and the aggregation filter.

use alert_core::{Alert, Priority};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One resolved alert: who answered, how fast, and at what ladder depth.
///
/// Expired alerts are recorded too, with no responder and no duration.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetric {
    pub alert_id: Uuid,
    pub responded_by: Option<String>,
    pub response_seconds: Option<f64>,
    pub within_target: bool,
    pub priority: Priority,
    pub escalation_level_at_resolution: u32,
    pub recorded_at: DateTime<Utc>,
}

impl ResponseMetric {
    pub fn responded(alert: &Alert, member_id: &str, response_seconds: f64, within_target: bool) -> Self {
        ResponseMetric {
            alert_id: alert.id,
            responded_by: Some(member_id.to_string()),
            response_seconds: Some(response_seconds),
            within_target,
            priority: alert.priority,
            escalation_level_at_resolution: alert.escalation_level,
            recorded_at: Utc::now(),
        }
    }

    pub fn expired(alert: &Alert) -> Self {
        ResponseMetric {
            alert_id: alert.id,
            responded_by: None,
            response_seconds: None,
            within_target: false,
            priority: alert.priority,
            escalation_level_at_resolution: alert.escalation_level,
            recorded_at: Utc::now(),
        }
    }
}

/// A tier that fired with nobody to hand the lead to.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentGap {
    pub alert_id: Uuid,
    pub escalation_level: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Narrows an aggregation to one priority band and/or one member.
#[derive(Debug, Clone, Default)]
pub struct MetricsFilter {
    pub priority: Option<Priority>,
    pub member: Option<String>,
}

impl MetricsFilter {
    pub fn matches(&self, metric: &ResponseMetric) -> bool {
        let priority_ok = self.priority.map_or(true, |p| metric.priority == p);
        let member_ok = self
            .member
            .as_deref()
            .map_or(true, |m| metric.responded_by.as_deref() == Some(m));
        priority_ok && member_ok
    }
}
