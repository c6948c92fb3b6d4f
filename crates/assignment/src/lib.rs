//! Assignment Selector
//!
//! Side-effect-free choice of which team member takes a lead. Callers
//! hand in a candidate snapshot and get a deterministic pick back, so
//! concurrent tiers stay reproducible.

mod selector;

pub use selector::{score, select, AssignmentNeeds};
