//! Team Directory
//!
//! Read-model of the sales team: who exists, what they can take, and how
//! they have been performing. The engine only reads from it; the roster
//! is synced in from the CRM and staleness is tolerated.

mod client;
mod memory;
mod snapshot;

pub use client::{DirectoryClient, TeamDirectory};
pub use memory::InMemoryDirectory;
pub use snapshot::TeamMemberSnapshot;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("directory call timed out after {0}ms")]
    Timeout(u64),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}
