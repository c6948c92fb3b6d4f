//! Point-in-time view of a team member.

use alert_core::{Availability, Role, Skill};
use serde::{Deserialize, Serialize};

/// Member record as the assignment selector sees it.
///
/// An empty `territories` list means the member covers every territory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberSnapshot {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub skills: Vec<Skill>,
    pub territories: Vec<String>,
    pub availability: Availability,
    /// Open alerts currently on the member's plate.
    pub current_workload: u32,
    /// Rolling average response time in seconds.
    pub rolling_avg_response_seconds: f64,
    /// Rolling share of responses that landed inside the target window.
    pub rolling_target_hit_rate: f64,
}

impl TeamMemberSnapshot {
    pub fn covers_territory(&self, territory: &str) -> bool {
        self.territories.is_empty() || self.territories.iter().any(|t| t == territory)
    }

    /// True when at least one of `required` is in the member's skill set.
    pub fn has_any_skill(&self, required: &[Skill]) -> bool {
        required.iter().any(|skill| self.skills.contains(skill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> TeamMemberSnapshot {
        TeamMemberSnapshot {
            id: "m-1".to_string(),
            name: "Dana".to_string(),
            role: Role::Rep,
            skills: vec![Skill::Residential, Skill::Metal],
            territories: vec!["north".to_string()],
            availability: Availability::Available,
            current_workload: 0,
            rolling_avg_response_seconds: 45.0,
            rolling_target_hit_rate: 0.95,
        }
    }

    #[test]
    fn territory_coverage() {
        let scoped = member();
        assert!(scoped.covers_territory("north"));
        assert!(!scoped.covers_territory("south"));

        let mut company_wide = member();
        company_wide.territories.clear();
        assert!(company_wide.covers_territory("south"));
    }

    #[test]
    fn skill_overlap() {
        let m = member();
        assert!(m.has_any_skill(&[Skill::Metal, Skill::Flat]));
        assert!(!m.has_any_skill(&[Skill::Insurance]));
        assert!(!m.has_any_skill(&[]));
    }
}
