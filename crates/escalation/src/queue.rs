//! Tick queue: a min-heap of scheduled callbacks with cancel tombstones.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use tokio::time::Instant;
use uuid::Uuid;

/// What a due tick should do to its alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum TickKind {
    /// Advance the alert into the next tier.
    Escalate,
    /// Close the alert as expired.
    Expire,
}

/// One scheduled callback, keyed by alert and the level it expects.
#[derive(Debug, Clone)]
pub(crate) struct Tick {
    pub alert_id: Uuid,
    /// Escalation level the alert should still be at when this fires.
    pub level: u32,
    pub kind: TickKind,
    pub fire_at: Instant,
}

impl Eq for Tick {}

impl PartialEq for Tick {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at
            && self.alert_id == other.alert_id
            && self.level == other.level
            && self.kind == other.kind
    }
}

impl Ord for Tick {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior (earliest fire time first)
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| self.alert_id.cmp(&other.alert_id))
            .then_with(|| self.level.cmp(&other.level))
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl PartialOrd for Tick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What a worker should do after polling the queue.
pub(crate) enum TickPoll {
    Ready(Tick),
    WaitUntil(Instant),
    Idle,
}

/// Pending ticks ordered by fire time.
///
/// Cancellation is advisory: a tombstone drops the alert's pending tick
/// at pop time, while the store CAS stays the authoritative guard.
pub(crate) struct TickQueue {
    heap: BinaryHeap<Tick>,
    cancelled: HashSet<Uuid>,
}

impl TickQueue {
    pub fn new() -> Self {
        TickQueue {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
        }
    }

    /// Queues a tick. An outstanding tombstone still only discards the
    /// tick it targeted; a tick pushed afterwards is unaffected.
    pub fn push(&mut self, tick: Tick) {
        self.heap.push(tick);
    }

    /// Marks the alert's pending tick, if any, to be discarded at pop time.
    /// Returns whether there was a tick to mark.
    pub fn cancel(&mut self, alert_id: Uuid) -> bool {
        if self.heap.iter().any(|tick| tick.alert_id == alert_id) {
            self.cancelled.insert(alert_id);
            true
        } else {
            false
        }
    }

    /// Pops a due tick, discarding tombstoned ones, or reports how long
    /// to wait for the earliest pending one.
    pub fn poll(&mut self, now: Instant) -> TickPoll {
        loop {
            let (head_id, fire_at) = match self.heap.peek() {
                Some(head) => (head.alert_id, head.fire_at),
                None => return TickPoll::Idle,
            };
            if self.cancelled.contains(&head_id) {
                self.heap.pop();
                self.cancelled.remove(&head_id);
                continue;
            }
            if fire_at <= now {
                match self.heap.pop() {
                    Some(tick) => return TickPoll::Ready(tick),
                    None => return TickPoll::Idle,
                }
            }
            return TickPoll::WaitUntil(fire_at);
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
