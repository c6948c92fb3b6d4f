//! In-process roster used by the API roster sync and by tests.

use std::collections::HashMap;

use alert_core::{Availability, Role};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{DirectoryError, TeamDirectory, TeamMemberSnapshot};

/// Roster held in memory and replaced wholesale or member-by-member as
/// the CRM pushes updates.
pub struct InMemoryDirectory {
    members: RwLock<HashMap<String, TeamMemberSnapshot>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        InMemoryDirectory {
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or replaces a member record. Returns true on replace.
    pub async fn upsert(&self, member: TeamMemberSnapshot) -> bool {
        debug!(member_id = %member.id, role = ?member.role, "roster upsert");
        self.members
            .write()
            .await
            .insert(member.id.clone(), member)
            .is_some()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.members.write().await.remove(id).is_some()
    }

    pub async fn set_availability(&self, id: &str, availability: Availability) -> bool {
        let mut members = self.members.write().await;
        match members.get_mut(id) {
            Some(member) => {
                member.availability = availability;
                true
            }
            None => false,
        }
    }

    /// Full roster sorted by member id.
    pub async fn members(&self) -> Vec<TeamMemberSnapshot> {
        let members = self.members.read().await;
        let mut all: Vec<TeamMemberSnapshot> = members.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TeamDirectory for InMemoryDirectory {
    async fn list_candidates(
        &self,
        roles: &[Role],
        territory: Option<&str>,
    ) -> Result<Vec<TeamMemberSnapshot>, DirectoryError> {
        let members = self.members.read().await;
        let mut candidates: Vec<TeamMemberSnapshot> = members
            .values()
            .filter(|member| roles.contains(&member.role))
            .filter(|member| territory.map_or(true, |t| member.covers_territory(t)))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(candidates)
    }
}
