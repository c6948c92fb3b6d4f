//! Delivery channels, per-send reporting, and the gateway trait.

use std::collections::HashMap;

use alert_core::Priority;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::{NotificationPayload, NotifyError};

/// Delivery channel, noisiest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Voice,
    Sms,
    Push,
    Email,
}

/// Channel fan-out per priority band. Critical leads get the loud ones.
pub fn channels_for(priority: Priority) -> Vec<Channel> {
    match priority {
        Priority::Critical => vec![Channel::Voice, Channel::Sms, Channel::Push],
        Priority::High => vec![Channel::Sms, Channel::Push],
        Priority::Normal => vec![Channel::Push, Channel::Email],
        Priority::Low => vec![Channel::Email],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed { reason: String },
}

/// Per-channel outcome of one send attempt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
    pub outcomes: HashMap<Channel, DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn all_delivered(channels: &[Channel]) -> Self {
        DeliveryReport {
            outcomes: channels
                .iter()
                .map(|channel| (*channel, DeliveryOutcome::Delivered))
                .collect(),
        }
    }

    pub fn mark(&mut self, channel: Channel, outcome: DeliveryOutcome) {
        self.outcomes.insert(channel, outcome);
    }

    pub fn any_delivered(&self) -> bool {
        self.outcomes
            .values()
            .any(|outcome| *outcome == DeliveryOutcome::Delivered)
    }

    pub fn failed_channels(&self) -> Vec<Channel> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, DeliveryOutcome::Delivered))
            .map(|(channel, _)| *channel)
            .collect()
    }
}

/// Outbound notification transport.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Attempts delivery on every channel. Per-channel failures land in
    /// the report; transport-level failures come back as the error.
    async fn send(
        &self,
        recipient: &str,
        payload: &NotificationPayload,
        channels: &[Channel],
    ) -> Result<DeliveryReport, NotifyError>;
}

/// Gateway that only logs. Stands in until a real provider is wired up.
pub struct LogGateway;

#[async_trait]
impl NotificationGateway for LogGateway {
    async fn send(
        &self,
        recipient: &str,
        payload: &NotificationPayload,
        channels: &[Channel],
    ) -> Result<DeliveryReport, NotifyError> {
        info!(
            recipient,
            alert_id = %payload.alert_id,
            lead_id = %payload.lead_id,
            priority = ?payload.priority,
            kind = ?payload.kind,
            level = payload.escalation_level,
            ?channels,
            "notification dispatched"
        );
        Ok(DeliveryReport::all_delivered(channels))
    }
}
