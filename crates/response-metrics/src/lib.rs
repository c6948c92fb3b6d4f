//! Response Metrics
//!
//! Append-only log of how fast the team worked its leads, with windowed
//! aggregation for the dashboard. Recording sits on alert hot paths, so
//! it never fails and never blocks on anything but its own lock.

mod record;
mod sink;

pub use record::{AssignmentGap, MetricsFilter, ResponseMetric};
pub use sink::{AggregateReport, LeaderboardEntry, MetricsSink};
