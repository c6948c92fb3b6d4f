//! Team vocabulary shared by the directory, the selector, and policy tiers.

use serde::{Deserialize, Serialize};

/// Position of a team member in the escalation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Rep,
    SeniorRep,
    Manager,
    Owner,
}

/// Job skill a lead may require from whoever takes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Residential,
    Commercial,
    Metal,
    Flat,
    Insurance,
}

/// Whether a member can be handed work right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    OnCall,
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(serde_json::to_string(&Role::SeniorRep).unwrap(), "\"senior_rep\"");
        assert_eq!(serde_json::to_string(&Skill::Insurance).unwrap(), "\"insurance\"");
        assert_eq!(serde_json::to_string(&Availability::OnCall).unwrap(), "\"on_call\"");
    }

    #[test]
    fn availability_parses_back() {
        let parsed: Availability = serde_json::from_str("\"on_call\"").unwrap();
        assert_eq!(parsed, Availability::OnCall);
    }
}
