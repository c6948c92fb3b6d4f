//! Escalation policy: ordered tiers with offsets measured from alert creation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::team::Role;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("escalation policy has no tiers")]
    Empty,
    #[error("first tier must fire at offset 0, got {0}s")]
    FirstTierOffset(u64),
    #[error("tier {index} offset {offset}s does not increase over {previous}s")]
    OffsetsNotIncreasing {
        index: usize,
        offset: u64,
        previous: u64,
    },
    #[error("tier {0} has no eligible roles")]
    NoEligibleRoles(usize),
}

/// One rung of the escalation ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationTier {
    /// Seconds after alert creation at which this tier fires.
    pub offset_seconds: u64,
    /// Roles recruited when the tier fires, in preference order.
    pub eligible_roles: Vec<Role>,
}

/// Ordered escalation tiers for a lead alert.
///
/// Tier 0 always fires at creation; later tiers fire at strictly
/// increasing offsets from the same creation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationPolicy {
    pub tiers: Vec<EscalationTier>,
}

impl Default for EscalationPolicy {
    /// A rep at creation, senior reps at 60s, the manager at 90s.
    fn default() -> Self {
        EscalationPolicy {
            tiers: vec![
                EscalationTier {
                    offset_seconds: 0,
                    eligible_roles: vec![Role::Rep],
                },
                EscalationTier {
                    offset_seconds: 60,
                    eligible_roles: vec![Role::SeniorRep, Role::Rep],
                },
                EscalationTier {
                    offset_seconds: 90,
                    eligible_roles: vec![Role::Manager],
                },
            ],
        }
    }
}

impl EscalationPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        let first = self.tiers.first().ok_or(PolicyError::Empty)?;
        if first.offset_seconds != 0 {
            return Err(PolicyError::FirstTierOffset(first.offset_seconds));
        }
        for (index, tier) in self.tiers.iter().enumerate() {
            if tier.eligible_roles.is_empty() {
                return Err(PolicyError::NoEligibleRoles(index));
            }
            if index > 0 {
                let previous = self.tiers[index - 1].offset_seconds;
                if tier.offset_seconds <= previous {
                    return Err(PolicyError::OffsetsNotIncreasing {
                        index,
                        offset: tier.offset_seconds,
                        previous,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn tier(&self, level: u32) -> Option<&EscalationTier> {
        self.tiers.get(level as usize)
    }

    /// Index of the final tier. Zero for a single-tier policy.
    pub fn last_level(&self) -> u32 {
        self.tiers.len().saturating_sub(1) as u32
    }

    /// Offset of the final tier, i.e. how long the ladder runs.
    pub fn span_seconds(&self) -> u64 {
        self.tiers.last().map_or(0, |tier| tier.offset_seconds)
    }
}
