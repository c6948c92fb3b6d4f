//! Notify
//!
//! Outbound notification seam: what gets sent, over which channels, and
//! how hard to retry. Delivery failures are reported and logged but are
//! never allowed to block an alert's lifecycle.

mod gateway;
mod payload;
mod retry;

pub use gateway::{
    channels_for, Channel, DeliveryOutcome, DeliveryReport, LogGateway, NotificationGateway,
};
pub use payload::{NotificationKind, NotificationPayload};
pub use retry::{send_with_retry, SendOptions};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("gateway error: {0}")]
    Gateway(String),
    #[error("send timed out after {0}ms")]
    Timeout(u64),
}
