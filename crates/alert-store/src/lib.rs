//! Alert Store
//!
//! Keyed in-memory store for live alerts. Every state transition goes
//! through a compare-and-swap guarded by expected statuses, so racing
//! writers resolve to exactly one winner without external locking.

mod store;

pub use store::{AlertStore, CasResult};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("alert not found")]
    NotFound,
}
