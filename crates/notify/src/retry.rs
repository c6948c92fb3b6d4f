//! Bounded retry around gateway sends.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::{channels_for, NotificationGateway, NotificationPayload};

/// Timing knobs for one logical send.
#[derive(Debug, Clone, Copy)]
pub struct SendOptions {
    pub attempt_timeout: Duration,
    pub retries: u32,
    pub backoff: Duration,
}

/// Sends on every channel for the payload's priority, retrying a failed
/// attempt a bounded number of times. Returns whether any channel got
/// through.
///
/// The retry budget must fit inside the gap before the next tier fires;
/// the caller's configuration is trusted for that.
pub async fn send_with_retry(
    gateway: &dyn NotificationGateway,
    recipient: &str,
    payload: &NotificationPayload,
    options: SendOptions,
) -> bool {
    let channels = channels_for(payload.priority);
    let attempts = options.retries + 1;
    for attempt in 1..=attempts {
        let send = gateway.send(recipient, payload, &channels);
        match timeout(options.attempt_timeout, send).await {
            Ok(Ok(report)) if report.any_delivered() => {
                let failed = report.failed_channels();
                if !failed.is_empty() {
                    debug!(
                        recipient,
                        alert_id = %payload.alert_id,
                        ?failed,
                        "partial delivery, at least one channel got through"
                    );
                }
                return true;
            }
            Ok(Ok(_)) => {
                warn!(
                    recipient,
                    alert_id = %payload.alert_id,
                    attempt,
                    "no channel delivered"
                );
            }
            Ok(Err(error)) => {
                warn!(
                    recipient,
                    alert_id = %payload.alert_id,
                    attempt,
                    %error,
                    "gateway send failed"
                );
            }
            Err(_) => {
                warn!(
                    recipient,
                    alert_id = %payload.alert_id,
                    attempt,
                    timeout_ms = options.attempt_timeout.as_millis() as u64,
                    "gateway send timed out"
                );
            }
        }
        if attempt < attempts {
            sleep(options.backoff).await;
        }
    }
    warn!(
        recipient,
        alert_id = %payload.alert_id,
        "notification undelivered after all attempts"
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, DeliveryReport, NotificationKind, NotifyError};
    use alert_core::{Alert, Priority};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyGateway {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl NotificationGateway for FlakyGateway {
        async fn send(
            &self,
            _recipient: &str,
            _payload: &NotificationPayload,
            channels: &[Channel],
        ) -> Result<DeliveryReport, NotifyError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(NotifyError::Gateway("provider 500".to_string()))
            } else {
                Ok(DeliveryReport::all_delivered(channels))
            }
        }
    }

    struct StalledGateway;

    #[async_trait]
    impl NotificationGateway for StalledGateway {
        async fn send(
            &self,
            _recipient: &str,
            _payload: &NotificationPayload,
            _channels: &[Channel],
        ) -> Result<DeliveryReport, NotifyError> {
            sleep(Duration::from_secs(300)).await;
            Err(NotifyError::Timeout(300_000))
        }
    }

    fn payload() -> NotificationPayload {
        let alert = Alert::new(
            "lead-3".to_string(),
            Priority::High,
            None,
            Vec::new(),
            Duration::from_secs(120),
        );
        NotificationPayload::for_alert(&alert, NotificationKind::NewLead)
    }

    fn options() -> SendOptions {
        SendOptions {
            attempt_timeout: Duration::from_millis(500),
            retries: 1,
            backoff: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_recovers_from_one_failure() {
        let gateway = FlakyGateway {
            calls: AtomicU32::new(0),
            fail_first: 1,
        };
        assert!(send_with_retry(&gateway, "rep-1", &payload(), options()).await);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_retry_budget() {
        let gateway = FlakyGateway {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        };
        assert!(!send_with_retry(&gateway, "rep-1", &payload(), options()).await);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_gateway_hits_the_attempt_timeout() {
        assert!(!send_with_retry(&StalledGateway, "rep-1", &payload(), options()).await);
    }
}
