//! Escalation Engine
//!
//! Keeps unanswered lead alerts climbing their policy ladder. Each alert
//! has at most one pending tick; firing a tick runs the store CAS, so a
//! stale or raced tick falls out as a harmless no-op rather than a
//! double escalation.

mod queue;
mod scheduler;

pub use scheduler::EscalationScheduler;
