//! Escalation scheduler: workers draining the tick queue against the store.

use std::sync::Arc;
use std::time::Duration;

use alert_core::{Alert, AlertStatus, EngineConfig, EscalationPolicy};
use alert_store::{AlertStore, CasResult, StoreError};
use assignment::AssignmentNeeds;
use notify::{
    send_with_retry, NotificationGateway, NotificationKind, NotificationPayload, SendOptions,
};
use response_metrics::{MetricsSink, ResponseMetric};
use team_directory::DirectoryClient;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::queue::{Tick, TickKind, TickPoll, TickQueue};

/// Statuses a tick may still act on.
const TICKABLE: [AlertStatus; 3] = [
    AlertStatus::Pending,
    AlertStatus::Acknowledged,
    AlertStatus::Escalated,
];

/// Drives alerts up their policy ladder.
///
/// Arms one tick per alert, fires it through the store CAS, recruits for
/// the tier that was reached, and arms whatever comes next. Everything
/// that can go wrong at fire time degrades toward faster escalation, not
/// toward a stalled alert.
pub struct EscalationScheduler {
    queue: Mutex<TickQueue>,
    wakeup: Notify,
    shutdown_tx: watch::Sender<bool>,
    store: Arc<AlertStore>,
    directory: DirectoryClient,
    gateway: Arc<dyn NotificationGateway>,
    metrics: Arc<MetricsSink>,
    config: EngineConfig,
}

impl EscalationScheduler {
    pub fn new(
        store: Arc<AlertStore>,
        directory: DirectoryClient,
        gateway: Arc<dyn NotificationGateway>,
        metrics: Arc<MetricsSink>,
        config: EngineConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        EscalationScheduler {
            queue: Mutex::new(TickQueue::new()),
            wakeup: Notify::new(),
            shutdown_tx,
            store,
            directory,
            gateway,
            metrics,
            config,
        }
    }

    fn policy(&self) -> &EscalationPolicy {
        &self.config.policy
    }

    fn send_options(&self) -> SendOptions {
        SendOptions {
            attempt_timeout: self.config.gateway_timeout(),
            retries: self.config.send_retries,
            backoff: self.config.retry_backoff(),
        }
    }

    /// Arms the first tick for a freshly created alert.
    ///
    /// `rush` skips the tier gap when tier 0 had nobody to take the lead,
    /// so the ladder starts climbing right away.
    pub async fn arm_first(&self, alert: &Alert, rush: bool) {
        let fire_at = match self.policy().tier(1) {
            Some(tier) if !rush => {
                alert.created_instant + Duration::from_secs(tier.offset_seconds)
            }
            Some(_) => Instant::now(),
            None => {
                // Single-tier policy: nothing to climb, only an SLA clock.
                self.arm_expiry(alert, alert.created_instant).await;
                return;
            }
        };
        self.push(Tick {
            alert_id: alert.id,
            level: 0,
            kind: TickKind::Escalate,
            fire_at,
        })
        .await;
    }

    /// Advisory cancel once an alert went terminal. The CAS would reject
    /// a leftover tick anyway; this just keeps the queue small.
    pub async fn cancel(&self, alert_id: Uuid) {
        if self.queue.lock().await.cancel(alert_id) {
            debug!(%alert_id, "pending tick cancelled");
        }
    }

    pub async fn pending_ticks(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub fn spawn_workers(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        (0..self.config.workers.max(1))
            .map(|worker| {
                let scheduler = Arc::clone(self);
                tokio::spawn(async move { scheduler.run_worker(worker).await })
            })
            .collect()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    async fn push(&self, tick: Tick) {
        debug!(
            alert_id = %tick.alert_id,
            level = tick.level,
            kind = ?tick.kind,
            "tick armed"
        );
        self.queue.lock().await.push(tick);
        self.wakeup.notify_waiters();
    }

    /// Expiry never lands before the SLA deadline, and a final tier that
    /// fired late still gets its margin to respond.
    async fn arm_expiry(&self, alert: &Alert, last_tier_fire: Instant) {
        let sla_deadline = alert.created_instant + self.config.sla();
        let fire_at = sla_deadline.max(last_tier_fire + self.config.expiry_margin());
        self.push(Tick {
            alert_id: alert.id,
            level: self.policy().last_level(),
            kind: TickKind::Expire,
            fire_at,
        })
        .await;
    }

    async fn run_worker(&self, worker: usize) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        info!(worker, "escalation worker started");
        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            // Register wakeup interest before polling, so a push landing
            // between the poll and the select below is not lost.
            let wakeup = self.wakeup.notified();
            tokio::pin!(wakeup);
            wakeup.as_mut().enable();

            let next = self.queue.lock().await.poll(Instant::now());
            match next {
                TickPoll::Ready(tick) => self.process(tick).await,
                TickPoll::WaitUntil(at) => {
                    tokio::select! {
                        _ = sleep_until(at) => {}
                        _ = &mut wakeup => {}
                        _ = shutdown_rx.changed() => {}
                    }
                }
                TickPoll::Idle => {
                    tokio::select! {
                        _ = &mut wakeup => {}
                        _ = shutdown_rx.changed() => {}
                    }
                }
            }
        }
        info!(worker, "escalation worker stopped");
    }

    async fn process(&self, tick: Tick) {
        match tick.kind {
            TickKind::Escalate => self.fire_escalation(tick).await,
            TickKind::Expire => self.fire_expiry(tick).await,
        }
    }

    async fn fire_escalation(&self, tick: Tick) {
        let next_level = tick.level + 1;
        let tier = match self.policy().tier(next_level) {
            Some(tier) => tier.clone(),
            None => {
                warn!(
                    alert_id = %tick.alert_id,
                    level = tick.level,
                    "tick beyond the policy ladder, dropping"
                );
                return;
            }
        };

        let escalated_at = chrono::Utc::now();
        let cas = self
            .store
            .compare_and_swap(tick.alert_id, &TICKABLE, Some(tick.level), |alert| {
                alert.status = AlertStatus::Escalated;
                alert.escalation_level = next_level;
                // First escalation wins the timestamp.
                if alert.escalated_at.is_none() {
                    alert.escalated_at = Some(escalated_at);
                }
                alert.assigned_to = None;
            })
            .await;
        let alert = match cas {
            Ok(CasResult::Swapped(alert)) => alert,
            Ok(CasResult::Stale(current)) => {
                debug!(
                    alert_id = %tick.alert_id,
                    status = ?current.status,
                    level = current.escalation_level,
                    "tier fire superseded, no-op"
                );
                return;
            }
            Err(StoreError::NotFound) => {
                debug!(alert_id = %tick.alert_id, "alert gone before its tier fired");
                return;
            }
        };
        info!(
            alert_id = %alert.id,
            lead_id = %alert.lead_id,
            level = next_level,
            "alert escalated"
        );

        // Recruit for the tier just reached. A directory failure must not
        // stall the ladder, so it degrades to an unstaffed tier.
        let candidates = match self
            .directory
            .list_candidates(&tier.eligible_roles, alert.territory.as_deref())
            .await
        {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(
                    alert_id = %alert.id,
                    %error,
                    "candidate lookup failed, treating tier as unstaffed"
                );
                Vec::new()
            }
        };
        let needs = AssignmentNeeds::for_alert(&alert);
        let pick = assignment::select(&candidates, &needs).cloned();
        match &pick {
            Some(member) => {
                let member_id = member.id.clone();
                let assigned = self
                    .store
                    .compare_and_swap(alert.id, &[AlertStatus::Escalated], Some(next_level), {
                        let member_id = member_id.clone();
                        move |alert| alert.assigned_to = Some(member_id)
                    })
                    .await;
                match assigned {
                    Ok(CasResult::Swapped(updated)) => {
                        info!(
                            alert_id = %updated.id,
                            member_id = %member_id,
                            level = next_level,
                            "lead reassigned"
                        );
                        let payload =
                            NotificationPayload::for_alert(&updated, NotificationKind::Escalation);
                        send_with_retry(
                            self.gateway.as_ref(),
                            &member_id,
                            &payload,
                            self.send_options(),
                        )
                        .await;
                    }
                    Ok(CasResult::Stale(_)) | Err(_) => {
                        debug!(
                            alert_id = %alert.id,
                            "alert moved on before the assignee was recorded"
                        );
                    }
                }
            }
            None => {
                warn!(
                    alert_id = %alert.id,
                    level = next_level,
                    "no eligible member for tier"
                );
                self.metrics
                    .record_assignment_gap(alert.id, next_level)
                    .await;
            }
        }

        match self.policy().tier(next_level + 1) {
            Some(next_tier) => {
                // An unstaffed tier rushes the next one instead of waiting
                // out its offset.
                let fire_at = if pick.is_some() {
                    alert.created_instant + Duration::from_secs(next_tier.offset_seconds)
                } else {
                    Instant::now()
                };
                self.push(Tick {
                    alert_id: alert.id,
                    level: next_level,
                    kind: TickKind::Escalate,
                    fire_at,
                })
                .await;
            }
            None => self.arm_expiry(&alert, Instant::now()).await,
        }
    }

    async fn fire_expiry(&self, tick: Tick) {
        let cas = self
            .store
            .compare_and_swap(tick.alert_id, &TICKABLE, Some(tick.level), |alert| {
                alert.status = AlertStatus::Expired;
            })
            .await;
        match cas {
            Ok(CasResult::Swapped(alert)) => {
                warn!(
                    alert_id = %alert.id,
                    lead_id = %alert.lead_id,
                    level = alert.escalation_level,
                    "alert expired with no response"
                );
                self.metrics.record(ResponseMetric::expired(&alert)).await;
            }
            Ok(CasResult::Stale(current)) => {
                debug!(
                    alert_id = %tick.alert_id,
                    status = ?current.status,
                    "expiry superseded, no-op"
                );
            }
            Err(StoreError::NotFound) => {
                debug!(alert_id = %tick.alert_id, "alert gone before expiry");
            }
        }
    }
}
