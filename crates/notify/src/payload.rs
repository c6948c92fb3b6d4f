//! What a notification carries. Rendering is the gateway's problem.

use alert_core::{Alert, Priority};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Why the recipient is being paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewLead,
    Escalation,
}

/// Structured notification content handed to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub alert_id: Uuid,
    pub lead_id: String,
    pub priority: Priority,
    pub kind: NotificationKind,
    pub escalation_level: u32,
    pub response_deadline: DateTime<Utc>,
    pub territory: Option<String>,
}

impl NotificationPayload {
    pub fn for_alert(alert: &Alert, kind: NotificationKind) -> Self {
        NotificationPayload {
            alert_id: alert.id,
            lead_id: alert.lead_id.clone(),
            priority: alert.priority,
            kind,
            escalation_level: alert.escalation_level,
            response_deadline: alert.response_deadline,
            territory: alert.territory.clone(),
        }
    }
}
