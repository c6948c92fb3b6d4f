//! Directory access with a hard timeout at the call seam.

use std::sync::Arc;
use std::time::Duration;

use alert_core::Role;
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::warn;

use crate::{DirectoryError, TeamMemberSnapshot};

/// Source of candidate members for an escalation tier.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Lists members holding one of `roles`, narrowed to those covering
    /// `territory` when the alert carries one.
    async fn list_candidates(
        &self,
        roles: &[Role],
        territory: Option<&str>,
    ) -> Result<Vec<TeamMemberSnapshot>, DirectoryError>;
}

/// Wrapper that bounds every directory call so a slow backend can never
/// stall an escalation tick.
#[derive(Clone)]
pub struct DirectoryClient {
    inner: Arc<dyn TeamDirectory>,
    call_timeout: Duration,
}

impl DirectoryClient {
    pub fn new(inner: Arc<dyn TeamDirectory>, call_timeout: Duration) -> Self {
        DirectoryClient {
            inner,
            call_timeout,
        }
    }

    pub async fn list_candidates(
        &self,
        roles: &[Role],
        territory: Option<&str>,
    ) -> Result<Vec<TeamMemberSnapshot>, DirectoryError> {
        let call = self.inner.list_candidates(roles, territory);
        match timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed_ms = self.call_timeout.as_millis() as u64;
                warn!(timeout_ms = elapsed_ms, "directory lookup timed out");
                Err(DirectoryError::Timeout(elapsed_ms))
            }
        }
    }
}
