//! Alert Service
//!
//! Front door for the engine: creates alerts, records acknowledgments and
//! responses, and owns the background machinery (escalation workers and
//! the store sweeper).

mod service;

pub use service::{AlertService, CreateAlertRequest};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert not found")]
    NotFound,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid escalation policy: {0}")]
    Policy(#[from] alert_core::PolicyError),
}
