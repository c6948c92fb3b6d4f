//! Lead alert record and its lifecycle vocabulary.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::team::Skill;

/// Urgency band for a lead alert, derived from the lead score when the
/// CRM does not set it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}

impl Priority {
    /// Maps a 0-100 lead score onto a priority band.
    pub fn from_lead_score(score: f64) -> Self {
        if score >= 80.0 {
            Priority::Critical
        } else if score >= 60.0 {
            Priority::High
        } else if score >= 35.0 {
            Priority::Normal
        } else {
            Priority::Low
        }
    }
}

/// Where an alert sits in its escalation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Acknowledged,
    Escalated,
    Responded,
    Expired,
}

impl AlertStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, AlertStatus::Responded | AlertStatus::Expired)
    }
}

/// What happened when a member actually worked the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOutcome {
    Contacted,
    AppointmentSet,
    LeftVoicemail,
    Disqualified,
}

/// A single actionable lead alert.
///
/// Wall-clock fields are audit and display values. `created_instant` is the
/// monotonic anchor for deadline math and response timing, so the record
/// stays correct across wall-clock adjustments.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub lead_id: String,
    pub priority: Priority,
    pub status: AlertStatus,
    pub assigned_to: Option<String>,
    pub escalation_level: u32,
    pub territory: Option<String>,
    pub required_skills: Vec<Skill>,
    pub created_at: DateTime<Utc>,
    pub response_deadline: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub outcome: Option<ResponseOutcome>,
    #[serde(skip)]
    pub created_instant: Instant,
}

impl Alert {
    /// Opens a fresh alert in `Pending` at escalation level 0.
    pub fn new(
        lead_id: String,
        priority: Priority,
        territory: Option<String>,
        required_skills: Vec<Skill>,
        sla: Duration,
    ) -> Self {
        let created_at = Utc::now();
        Alert {
            id: Uuid::new_v4(),
            lead_id,
            priority,
            status: AlertStatus::Pending,
            assigned_to: None,
            escalation_level: 0,
            territory,
            required_skills,
            created_at,
            response_deadline: created_at + chrono::Duration::seconds(sla.as_secs() as i64),
            acknowledged_at: None,
            acknowledged_by: None,
            responded_at: None,
            escalated_at: None,
            outcome: None,
            created_instant: Instant::now(),
        }
    }

    /// Monotonic time since the alert was opened.
    pub fn elapsed(&self) -> Duration {
        self.created_instant.elapsed()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_score_bands() {
        assert_eq!(Priority::from_lead_score(95.0), Priority::Critical);
        assert_eq!(Priority::from_lead_score(80.0), Priority::Critical);
        assert_eq!(Priority::from_lead_score(79.9), Priority::High);
        assert_eq!(Priority::from_lead_score(60.0), Priority::High);
        assert_eq!(Priority::from_lead_score(35.0), Priority::Normal);
        assert_eq!(Priority::from_lead_score(10.0), Priority::Low);
    }

    #[test]
    fn terminal_statuses() {
        assert!(AlertStatus::Responded.is_terminal());
        assert!(AlertStatus::Expired.is_terminal());
        assert!(!AlertStatus::Pending.is_terminal());
        assert!(!AlertStatus::Acknowledged.is_terminal());
        assert!(!AlertStatus::Escalated.is_terminal());
    }

    #[test]
    fn new_alert_defaults() {
        let alert = Alert::new(
            "lead-42".to_string(),
            Priority::High,
            Some("north".to_string()),
            vec![Skill::Metal],
            Duration::from_secs(120),
        );
        assert_eq!(alert.status, AlertStatus::Pending);
        assert_eq!(alert.escalation_level, 0);
        assert!(alert.assigned_to.is_none());
        assert_eq!(
            alert.response_deadline - alert.created_at,
            chrono::Duration::seconds(120)
        );
    }

    #[test]
    fn monotonic_anchor_is_not_serialized() {
        let alert = Alert::new(
            "lead-1".to_string(),
            Priority::Normal,
            None,
            Vec::new(),
            Duration::from_secs(60),
        );
        let json = serde_json::to_value(&alert).unwrap();
        assert!(json.get("created_instant").is_none());
        assert_eq!(json["status"], "pending");
        assert_eq!(json["lead_id"], "lead-1");
    }
}
