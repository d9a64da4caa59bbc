//! # Delayed Lane
//!
//! Time-ordered holding area for events whose `scheduled_start` is still in the
//! future. A single scheduler task owns redelivery: it sleeps until the earliest
//! due time (bounded by the poll interval), re-enqueues everything that has
//! fallen due, and exits when the process-wide cancellation token fires. This
//! replaces spawning one detached timer per delayed event, which under load
//! creates an unbounded timer population with no shutdown path.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{InMemoryEventQueue, QueueItem};

/// Heap entry ordered by due time (earliest first), FIFO within a due time.
struct DelayedEntry {
    due: DateTime<Utc>,
    seq: u64,
    item: QueueItem,
}

impl PartialEq for DelayedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for DelayedEntry {}

impl PartialOrd for DelayedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse to pop the earliest due time first.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl std::fmt::Debug for DelayedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedEntry")
            .field("due", &self.due)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Mutex-protected min-heap of parked items plus the scheduler wakeup signal.
#[derive(Debug, Default)]
pub(crate) struct DelayedLane {
    entries: Mutex<BinaryHeap<DelayedEntry>>,
    seq: AtomicU64,
    wakeup: Notify,
}

impl DelayedLane {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Park an item until its scheduled start. Items without one (which should
    /// not reach this lane) are treated as due immediately.
    pub(crate) fn push(&self, item: QueueItem) {
        let due = item.scheduled_start().unwrap_or_else(Utc::now);
        let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
        self.entries.lock().push(DelayedEntry { due, seq, item });
        self.wakeup.notify_one();
    }

    /// Remove and return every item due at `now`, earliest first.
    pub(crate) fn pop_due(&self, now: DateTime<Utc>) -> Vec<QueueItem> {
        let mut entries = self.entries.lock();
        let mut due_items = Vec::new();
        while entries.peek().is_some_and(|entry| entry.due <= now) {
            if let Some(entry) = entries.pop() {
                due_items.push(entry.item);
            }
        }
        due_items
    }

    pub(crate) fn next_due(&self) -> Option<DateTime<Utc>> {
        self.entries.lock().peek().map(|entry| entry.due)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }

    pub(crate) async fn wait_for_new_entry(&self) {
        self.wakeup.notified().await;
    }
}

/// Scheduler loop: re-enqueue due items until cancelled.
///
/// Sleeps until the earliest due time, capped at `poll_interval`, and wakes
/// early whenever a new item parks so a nearer due time shortens the sleep.
pub(crate) async fn run_delay_scheduler(
    queue: Arc<InMemoryEventQueue>,
    cancel: CancellationToken,
    poll_interval: Duration,
) {
    debug!(
        poll_interval_ms = poll_interval.as_millis() as u64,
        "Delay scheduler started"
    );

    loop {
        let sleep_duration = match queue.delayed_lane().next_due() {
            Some(due) => {
                let now = Utc::now();
                if due <= now {
                    Duration::ZERO
                } else {
                    (due - now).to_std().unwrap_or(poll_interval).min(poll_interval)
                }
            }
            None => poll_interval,
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            // A new parked item may be due earlier than the current sleep.
            _ = queue.delayed_lane().wait_for_new_entry() => continue,
            _ = tokio::time::sleep(sleep_duration) => {}
        }

        let due_items = queue.delayed_lane().pop_due(Utc::now());
        if !due_items.is_empty() {
            debug!(count = due_items.len(), "Requeueing due delayed events");
        }
        for item in due_items {
            queue.enqueue_item(item);
        }
    }

    info!("Delay scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BackgroundEvent;
    use crate::models::OperationType;

    fn parked_item(offset_secs: i64) -> QueueItem {
        QueueItem::Event(Arc::new(
            BackgroundEvent::calculate(OperationType::Addition, 1.0, 2.0, None)
                .with_scheduled_start(Utc::now() + chrono::Duration::seconds(offset_secs)),
        ))
    }

    #[test]
    fn pop_due_returns_items_earliest_first() {
        let lane = DelayedLane::new();
        lane.push(parked_item(30));
        lane.push(parked_item(-10));
        lane.push(parked_item(-20));

        let now = Utc::now();
        let due = lane.pop_due(now);
        assert_eq!(due.len(), 2);
        let first_start = due[0].scheduled_start().unwrap();
        let second_start = due[1].scheduled_start().unwrap();
        assert!(first_start <= second_start);
        assert_eq!(lane.len(), 1);
    }

    #[test]
    fn next_due_tracks_the_earliest_entry() {
        let lane = DelayedLane::new();
        assert!(lane.next_due().is_none());

        lane.push(parked_item(30));
        lane.push(parked_item(5));
        let next = lane.next_due().unwrap();
        assert!(next <= Utc::now() + chrono::Duration::seconds(6));
    }

    #[test]
    fn same_due_time_preserves_insertion_order() {
        let lane = DelayedLane::new();
        let start = Utc::now() - chrono::Duration::seconds(1);
        let first = Arc::new(
            BackgroundEvent::calculate(OperationType::Addition, 1.0, 0.0, None)
                .with_scheduled_start(start),
        );
        let second = Arc::new(
            BackgroundEvent::calculate(OperationType::Addition, 2.0, 0.0, None)
                .with_scheduled_start(start),
        );
        lane.push(QueueItem::Event(first.clone()));
        lane.push(QueueItem::Event(second.clone()));

        let due = lane.pop_due(Utc::now());
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].event().id(), first.id());
        assert_eq!(due[1].event().id(), second.id());
    }
}
