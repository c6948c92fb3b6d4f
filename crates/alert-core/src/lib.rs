//! Core domain types for the lead alert engine.
//!
//! Alert records and their lifecycle, escalation policies, team vocabulary,
//! and the engine configuration shared by every other crate in the workspace.

mod alert;
mod config;
mod policy;
mod team;

pub use alert::{Alert, AlertStatus, Priority, ResponseOutcome};
pub use config::{ConfigError, EngineConfig};
pub use policy::{EscalationPolicy, EscalationTier, PolicyError};
pub use team::{Availability, Role, Skill};
