//! Keyed alert entries with TTL reclamation and CAS transitions.

use std::collections::HashMap;
use std::time::Duration;

use alert_core::{Alert, AlertStatus};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::StoreError;

/// Outcome of a compare-and-swap attempt.
#[derive(Debug, Clone)]
pub enum CasResult {
    /// Preconditions held and the mutation was applied. Carries the new record.
    Swapped(Alert),
    /// Preconditions failed and nothing changed. Carries the current record.
    Stale(Alert),
}

impl CasResult {
    pub fn swapped(&self) -> bool {
        matches!(self, CasResult::Swapped(_))
    }

    pub fn into_alert(self) -> Alert {
        match self {
            CasResult::Swapped(alert) | CasResult::Stale(alert) => alert,
        }
    }
}

struct Entry {
    alert: Alert,
    expires_at: Instant,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-memory alert store keyed by alert id.
///
/// Entries outlive their terminal transition by the TTL handed to `put`,
/// so late acknowledgments and reads keep resolving, then `sweep`
/// reclaims them.
pub struct AlertStore {
    entries: RwLock<HashMap<Uuid, Entry>>,
}

impl AlertStore {
    pub fn new() -> Self {
        AlertStore {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or replaces an alert with the given time-to-live.
    pub async fn put(&self, alert: Alert, ttl: Duration) {
        let entry = Entry {
            expires_at: Instant::now() + ttl,
            alert,
        };
        self.entries.write().await.insert(entry.alert.id, entry);
    }

    /// Reads a live alert. Expired entries report `NotFound` even before
    /// the sweeper has reclaimed them.
    pub async fn get(&self, id: Uuid) -> Result<Alert, StoreError> {
        let entries = self.entries.read().await;
        let entry = entries.get(&id).ok_or(StoreError::NotFound)?;
        if entry.expired(Instant::now()) {
            return Err(StoreError::NotFound);
        }
        Ok(entry.alert.clone())
    }

    /// Atomically mutates an alert when its current status is one of
    /// `expected_statuses` and, if given, its escalation level equals
    /// `expected_level`.
    ///
    /// A failed precondition is not an error: the caller gets
    /// `CasResult::Stale` with the current record and must treat the
    /// attempt as a no-op.
    pub async fn compare_and_swap<F>(
        &self,
        id: Uuid,
        expected_statuses: &[AlertStatus],
        expected_level: Option<u32>,
        mutate: F,
    ) -> Result<CasResult, StoreError>
    where
        F: FnOnce(&mut Alert),
    {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&id).ok_or(StoreError::NotFound)?;
        if entry.expired(Instant::now()) {
            return Err(StoreError::NotFound);
        }
        let status_ok = expected_statuses.contains(&entry.alert.status);
        let level_ok = expected_level.map_or(true, |level| entry.alert.escalation_level == level);
        if status_ok && level_ok {
            mutate(&mut entry.alert);
            Ok(CasResult::Swapped(entry.alert.clone()))
        } else {
            debug!(
                alert_id = %id,
                status = ?entry.alert.status,
                level = entry.alert.escalation_level,
                "compare-and-swap lost, leaving record unchanged"
            );
            Ok(CasResult::Stale(entry.alert.clone()))
        }
    }

    /// Removes an alert outright. Returns whether it was present.
    pub async fn delete(&self, id: Uuid) -> bool {
        self.entries.write().await.remove(&id).is_some()
    }

    /// Snapshot of all non-terminal, unexpired alerts, oldest first.
    pub async fn active(&self) -> Vec<Alert> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut alerts: Vec<Alert> = entries
            .values()
            .filter(|entry| !entry.expired(now) && !entry.alert.is_terminal())
            .map(|entry| entry.alert.clone())
            .collect();
        alerts.sort_by_key(|alert| alert.created_at);
        alerts
    }

    /// Drops every expired entry and returns how many were reclaimed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.expired(now));
        let reclaimed = before - entries.len();
        if reclaimed > 0 {
            debug!(reclaimed, remaining = entries.len(), "swept expired alerts");
        }
        reclaimed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
