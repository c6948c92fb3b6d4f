//! Retention-capped metric log and windowed aggregation.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{AssignmentGap, MetricsFilter, ResponseMetric};

const DEFAULT_CAPACITY: usize = 50_000;
const LEADERBOARD_SIZE: usize = 10;

struct MetricsLog {
    records: VecDeque<ResponseMetric>,
    gaps: VecDeque<AssignmentGap>,
    capacity: usize,
}

/// Collector shared by the service and the escalation workers.
pub struct MetricsSink {
    inner: RwLock<MetricsLog>,
}

/// Rollup of one query window.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total: usize,
    pub responded: usize,
    pub expired: usize,
    pub assignment_gaps: usize,
    /// Mean response seconds over responded alerts, 0.0 when none.
    pub avg_response_seconds: f64,
    /// Share of all resolved alerts inside the target window.
    pub target_hit_rate: f64,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    pub member_id: String,
    pub responses: usize,
    pub avg_response_seconds: f64,
    pub target_hit_rate: f64,
}

impl MetricsSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        MetricsSink {
            inner: RwLock::new(MetricsLog {
                records: VecDeque::with_capacity(capacity.min(1024)),
                gaps: VecDeque::new(),
                capacity,
            }),
        }
    }

    /// Appends one resolution record, evicting the oldest past capacity.
    pub async fn record(&self, metric: ResponseMetric) {
        let mut log = self.inner.write().await;
        debug!(
            alert_id = %metric.alert_id,
            responded_by = metric.responded_by.as_deref().unwrap_or("-"),
            within_target = metric.within_target,
            "metric recorded"
        );
        log.records.push_back(metric);
        while log.records.len() > log.capacity {
            log.records.pop_front();
        }
    }

    /// Notes a tier that fired with no eligible member to take the lead.
    pub async fn record_assignment_gap(&self, alert_id: Uuid, escalation_level: u32) {
        let mut log = self.inner.write().await;
        log.gaps.push_back(AssignmentGap {
            alert_id,
            escalation_level,
            recorded_at: Utc::now(),
        });
        while log.gaps.len() > log.capacity {
            log.gaps.pop_front();
        }
    }

    /// Rolls up `[since, until]`. Gap counts ignore the member/priority
    /// filter since gaps name neither.
    pub async fn aggregate(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        filter: &MetricsFilter,
    ) -> AggregateReport {
        let log = self.inner.read().await;
        let matching: Vec<&ResponseMetric> = log
            .records
            .iter()
            .filter(|m| m.recorded_at >= since && m.recorded_at <= until && filter.matches(m))
            .collect();

        let total = matching.len();
        let responded = matching
            .iter()
            .filter(|m| m.response_seconds.is_some())
            .count();
        let within = matching.iter().filter(|m| m.within_target).count();
        let response_sum: f64 = matching.iter().filter_map(|m| m.response_seconds).sum();

        let mut per_member: HashMap<&str, (usize, f64, usize)> = HashMap::new();
        for metric in &matching {
            if let (Some(member), Some(seconds)) = (&metric.responded_by, metric.response_seconds) {
                let entry = per_member.entry(member.as_str()).or_default();
                entry.0 += 1;
                entry.1 += seconds;
                if metric.within_target {
                    entry.2 += 1;
                }
            }
        }
        let mut leaderboard: Vec<LeaderboardEntry> = per_member
            .into_iter()
            .map(|(member_id, (count, seconds, hits))| LeaderboardEntry {
                member_id: member_id.to_string(),
                responses: count,
                avg_response_seconds: seconds / count as f64,
                target_hit_rate: hits as f64 / count as f64,
            })
            .collect();
        leaderboard.sort_by(|a, b| {
            b.target_hit_rate
                .total_cmp(&a.target_hit_rate)
                .then_with(|| a.avg_response_seconds.total_cmp(&b.avg_response_seconds))
                .then_with(|| a.member_id.cmp(&b.member_id))
        });
        leaderboard.truncate(LEADERBOARD_SIZE);

        let assignment_gaps = log
            .gaps
            .iter()
            .filter(|gap| gap.recorded_at >= since && gap.recorded_at <= until)
            .count();

        AggregateReport {
            window_start: since,
            window_end: until,
            total,
            responded,
            expired: total - responded,
            assignment_gaps,
            avg_response_seconds: if responded > 0 {
                response_sum / responded as f64
            } else {
                0.0
            },
            target_hit_rate: if total > 0 {
                within as f64 / total as f64
            } else {
                0.0
            },
            leaderboard,
        }
    }

    pub async fn record_count(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

impl Default for MetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::Priority;
    use chrono::Duration as ChronoDuration;

    fn metric(
        member: Option<&str>,
        seconds: Option<f64>,
        within: bool,
        priority: Priority,
        recorded_at: DateTime<Utc>,
    ) -> ResponseMetric {
        ResponseMetric {
            alert_id: Uuid::new_v4(),
            responded_by: member.map(|m| m.to_string()),
            response_seconds: seconds,
            within_target: within,
            priority,
            escalation_level_at_resolution: 0,
            recorded_at,
        }
    }

    #[tokio::test]
    async fn aggregate_summarizes_the_window() {
        let sink = MetricsSink::new();
        let now = Utc::now();

        sink.record(metric(Some("rep-1"), Some(30.0), true, Priority::High, now))
            .await;
        sink.record(metric(Some("rep-2"), Some(90.0), true, Priority::High, now))
            .await;
        sink.record(metric(Some("rep-1"), Some(150.0), false, Priority::Normal, now))
            .await;
        sink.record(metric(None, None, false, Priority::High, now))
            .await;
        sink.record_assignment_gap(Uuid::new_v4(), 2).await;

        let report = sink
            .aggregate(
                now - ChronoDuration::hours(1),
                now + ChronoDuration::hours(1),
                &MetricsFilter::default(),
            )
            .await;
        assert_eq!(report.total, 4);
        assert_eq!(report.responded, 3);
        assert_eq!(report.expired, 1);
        assert_eq!(report.assignment_gaps, 1);
        assert!((report.avg_response_seconds - 90.0).abs() < f64::EPSILON);
        assert!((report.target_hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn aggregate_respects_window_bounds() {
        let sink = MetricsSink::new();
        let now = Utc::now();
        let stale = now - ChronoDuration::days(2);

        sink.record(metric(Some("rep-1"), Some(30.0), true, Priority::High, stale))
            .await;
        sink.record(metric(Some("rep-2"), Some(40.0), true, Priority::High, now))
            .await;

        let report = sink
            .aggregate(
                now - ChronoDuration::hours(24),
                now + ChronoDuration::hours(1),
                &MetricsFilter::default(),
            )
            .await;
        assert_eq!(report.total, 1);
        assert_eq!(report.leaderboard.len(), 1);
        assert_eq!(report.leaderboard[0].member_id, "rep-2");
    }

    #[tokio::test]
    async fn leaderboard_orders_by_hit_rate_then_speed() {
        let sink = MetricsSink::new();
        let now = Utc::now();

        // steady: 2/2 within, slow-ish
        sink.record(metric(Some("steady"), Some(50.0), true, Priority::High, now))
            .await;
        sink.record(metric(Some("steady"), Some(70.0), true, Priority::High, now))
            .await;
        // quick: 2/2 within, faster average
        sink.record(metric(Some("quick"), Some(20.0), true, Priority::High, now))
            .await;
        sink.record(metric(Some("quick"), Some(40.0), true, Priority::High, now))
            .await;
        // spotty: 1/2 within
        sink.record(metric(Some("spotty"), Some(10.0), true, Priority::High, now))
            .await;
        sink.record(metric(Some("spotty"), Some(200.0), false, Priority::High, now))
            .await;

        let report = sink
            .aggregate(
                now - ChronoDuration::hours(1),
                now + ChronoDuration::hours(1),
                &MetricsFilter::default(),
            )
            .await;
        let order: Vec<&str> = report
            .leaderboard
            .iter()
            .map(|e| e.member_id.as_str())
            .collect();
        assert_eq!(order, vec!["quick", "steady", "spotty"]);
    }

    #[tokio::test]
    async fn leaderboard_caps_at_ten_members() {
        let sink = MetricsSink::new();
        let now = Utc::now();
        for i in 0..12 {
            sink.record(metric(
                Some(&format!("rep-{i:02}")),
                Some(30.0 + i as f64),
                true,
                Priority::High,
                now,
            ))
            .await;
        }
        let report = sink
            .aggregate(
                now - ChronoDuration::hours(1),
                now + ChronoDuration::hours(1),
                &MetricsFilter::default(),
            )
            .await;
        assert_eq!(report.leaderboard.len(), 10);
        // Equal hit rates, so the fastest averages survive the cut.
        assert_eq!(report.leaderboard[0].member_id, "rep-00");
    }

    #[tokio::test]
    async fn member_filter_narrows_totals() {
        let sink = MetricsSink::new();
        let now = Utc::now();
        sink.record(metric(Some("rep-1"), Some(30.0), true, Priority::High, now))
            .await;
        sink.record(metric(Some("rep-2"), Some(60.0), true, Priority::Low, now))
            .await;

        let filter = MetricsFilter {
            priority: None,
            member: Some("rep-1".to_string()),
        };
        let report = sink
            .aggregate(
                now - ChronoDuration::hours(1),
                now + ChronoDuration::hours(1),
                &filter,
            )
            .await;
        assert_eq!(report.total, 1);
        assert_eq!(report.leaderboard[0].member_id, "rep-1");
    }

    #[tokio::test]
    async fn retention_evicts_oldest() {
        let sink = MetricsSink::with_capacity(2);
        let now = Utc::now();
        for i in 0..3 {
            sink.record(metric(Some("rep-1"), Some(i as f64), true, Priority::High, now))
                .await;
        }
        assert_eq!(sink.record_count().await, 2);
    }

    #[tokio::test]
    async fn empty_window_reports_zeros() {
        let sink = MetricsSink::new();
        let now = Utc::now();
        let report = sink
            .aggregate(now - ChronoDuration::hours(1), now, &MetricsFilter::default())
            .await;
        assert_eq!(report.total, 0);
        assert_eq!(report.avg_response_seconds, 0.0);
        assert_eq!(report.target_hit_rate, 0.0);
        assert!(report.leaderboard.is_empty());
    }
}
