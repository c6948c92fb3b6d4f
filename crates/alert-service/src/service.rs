//! Service operations wired over the store, directory, and scheduler.

use std::sync::Arc;
use std::time::Duration;

use alert_core::{Alert, AlertStatus, EngineConfig, Priority, ResponseOutcome, Skill};
use alert_store::{AlertStore, CasResult};
use assignment::AssignmentNeeds;
use chrono::{DateTime, Utc};
use escalation::EscalationScheduler;
use notify::{
    send_with_retry, NotificationGateway, NotificationKind, NotificationPayload, SendOptions,
};
use response_metrics::{AggregateReport, MetricsFilter, MetricsSink, ResponseMetric};
use serde::Deserialize;
use team_directory::{DirectoryClient, TeamDirectory};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AlertError;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// What the CRM hands us when a new lead comes in.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlertRequest {
    pub lead_id: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub lead_score: Option<f64>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<Skill>,
}

impl CreateAlertRequest {
    /// Explicit priority wins; otherwise the lead score decides.
    pub fn resolved_priority(&self) -> Priority {
        match (self.priority, self.lead_score) {
            (Some(priority), _) => priority,
            (None, Some(score)) => Priority::from_lead_score(score),
            (None, None) => Priority::Normal,
        }
    }
}

/// The engine's front door. All state changes funnel through here or
/// through the scheduler, and both sides speak store CAS.
pub struct AlertService {
    store: Arc<AlertStore>,
    directory: DirectoryClient,
    gateway: Arc<dyn NotificationGateway>,
    metrics: Arc<MetricsSink>,
    scheduler: Arc<EscalationScheduler>,
    config: EngineConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AlertService {
    /// Validates the policy and wires the scheduler. Background tasks do
    /// not run until `start`.
    pub fn new(
        store: Arc<AlertStore>,
        directory: Arc<dyn TeamDirectory>,
        gateway: Arc<dyn NotificationGateway>,
        metrics: Arc<MetricsSink>,
        config: EngineConfig,
    ) -> Result<Self, AlertError> {
        config.policy.validate()?;
        let directory = DirectoryClient::new(directory, config.directory_timeout());
        let scheduler = Arc::new(EscalationScheduler::new(
            Arc::clone(&store),
            directory.clone(),
            Arc::clone(&gateway),
            Arc::clone(&metrics),
            config.clone(),
        ));
        Ok(AlertService {
            store,
            directory,
            gateway,
            metrics,
            scheduler,
            config,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Spawns the escalation workers and the store sweeper.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            warn!("alert service already started");
            return;
        }
        tasks.extend(self.scheduler.spawn_workers());

        let store = Arc::clone(&self.store);
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.sweep().await;
            }
        }));
        info!(workers = self.config.workers, "alert service started");
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
        info!("alert service stopped");
    }

    /// Opens an alert for a new lead, hands it to the best tier-0 member,
    /// and arms the escalation ladder.
    ///
    /// With nobody to take the lead, the alert is still created and the
    /// ladder starts climbing immediately.
    pub async fn create_alert(&self, request: CreateAlertRequest) -> Result<Alert, AlertError> {
        if request.lead_id.trim().is_empty() {
            return Err(AlertError::InvalidRequest(
                "lead_id must not be empty".to_string(),
            ));
        }
        let priority = request.resolved_priority();
        let mut alert = Alert::new(
            request.lead_id,
            priority,
            request.territory,
            request.required_skills,
            self.config.sla(),
        );

        let candidates = match self.config.policy.tier(0) {
            Some(tier) => match self
                .directory
                .list_candidates(&tier.eligible_roles, alert.territory.as_deref())
                .await
            {
                Ok(candidates) => candidates,
                Err(error) => {
                    warn!(alert_id = %alert.id, %error, "candidate lookup failed at creation");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let needs = AssignmentNeeds::for_alert(&alert);
        let pick = assignment::select(&candidates, &needs).cloned();
        if let Some(member) = &pick {
            alert.assigned_to = Some(member.id.clone());
        }
        self.store.put(alert.clone(), self.config.store_ttl()).await;

        match &pick {
            Some(member) => {
                info!(
                    alert_id = %alert.id,
                    lead_id = %alert.lead_id,
                    member_id = %member.id,
                    ?priority,
                    "lead alert created"
                );
                let payload = NotificationPayload::for_alert(&alert, NotificationKind::NewLead);
                send_with_retry(
                    self.gateway.as_ref(),
                    &member.id,
                    &payload,
                    self.send_options(),
                )
                .await;
            }
            None => {
                warn!(
                    alert_id = %alert.id,
                    lead_id = %alert.lead_id,
                    "no member available at creation, rushing the ladder"
                );
                self.metrics.record_assignment_gap(alert.id, 0).await;
            }
        }
        self.scheduler.arm_first(&alert, pick.is_none()).await;
        Ok(alert)
    }

    /// Records that a member saw the alert. Does not stop the SLA clock
    /// or the ladder. Returns the record and whether this call changed it.
    pub async fn acknowledge(
        &self,
        alert_id: Uuid,
        member_id: &str,
    ) -> Result<(Alert, bool), AlertError> {
        let now = Utc::now();
        let member = member_id.to_string();
        let result = self
            .store
            .compare_and_swap(
                alert_id,
                &[AlertStatus::Pending, AlertStatus::Escalated],
                None,
                |alert| {
                    alert.status = AlertStatus::Acknowledged;
                    // First acknowledgment wins the timestamp.
                    if alert.acknowledged_at.is_none() {
                        alert.acknowledged_at = Some(now);
                        alert.acknowledged_by = Some(member.clone());
                    }
                },
            )
            .await
            .map_err(|_| AlertError::NotFound)?;
        match result {
            CasResult::Swapped(alert) => {
                info!(alert_id = %alert.id, member_id, "alert acknowledged");
                Ok((alert, true))
            }
            CasResult::Stale(alert) => {
                debug!(
                    alert_id = %alert.id,
                    status = ?alert.status,
                    "acknowledgment had no effect"
                );
                Ok((alert, false))
            }
        }
    }

    /// Records the actual response and closes the alert. The responder
    /// does not have to be the current assignee.
    pub async fn respond(
        &self,
        alert_id: Uuid,
        member_id: &str,
        outcome: ResponseOutcome,
    ) -> Result<(Alert, bool), AlertError> {
        let now = Utc::now();
        let result = self
            .store
            .compare_and_swap(
                alert_id,
                &[
                    AlertStatus::Pending,
                    AlertStatus::Acknowledged,
                    AlertStatus::Escalated,
                ],
                None,
                |alert| {
                    alert.status = AlertStatus::Responded;
                    alert.responded_at = Some(now);
                    alert.outcome = Some(outcome);
                },
            )
            .await
            .map_err(|_| AlertError::NotFound)?;
        match result {
            CasResult::Swapped(alert) => {
                self.scheduler.cancel(alert.id).await;
                let response_seconds = alert.created_instant.elapsed().as_secs_f64();
                let within_target = response_seconds <= self.config.sla_seconds as f64;
                self.metrics
                    .record(ResponseMetric::responded(
                        &alert,
                        member_id,
                        response_seconds,
                        within_target,
                    ))
                    .await;
                info!(
                    alert_id = %alert.id,
                    member_id,
                    response_seconds,
                    within_target,
                    ?outcome,
                    "lead answered"
                );
                Ok((alert, true))
            }
            CasResult::Stale(alert) => {
                debug!(
                    alert_id = %alert.id,
                    status = ?alert.status,
                    "response against a settled alert, no-op"
                );
                Ok((alert, false))
            }
        }
    }

    pub async fn get_alert(&self, alert_id: Uuid) -> Result<Alert, AlertError> {
        self.store
            .get(alert_id)
            .await
            .map_err(|_| AlertError::NotFound)
    }

    /// All non-terminal alerts, oldest first.
    pub async fn active_alerts(&self) -> Vec<Alert> {
        self.store.active().await
    }

    pub async fn metrics_report(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        filter: &MetricsFilter,
    ) -> AggregateReport {
        self.metrics.aggregate(since, until, filter).await
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn send_options(&self) -> SendOptions {
        SendOptions {
            attempt_timeout: self.config.gateway_timeout(),
            retries: self.config.send_retries,
            backoff: self.config.retry_backoff(),
        }
    }
}
