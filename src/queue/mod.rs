//! # In-Memory Event Queue
//!
//! Three-lane in-process queue feeding the background executor:
//!
//! - **priority lane**: sync envelopes (a producer is blocked waiting on them)
//! - **normal lane**: fire-and-forget events
//! - **delayed lane**: events whose `scheduled_start` lies in the future, held in
//!   a time-ordered heap serviced by a single scheduler task
//!
//! ## Availability Signal
//!
//! A counting semaphore carries one permit per retrievable item. Dequeuing
//! consumes a permit before scanning the lanes; an item parked on the delayed
//! lane gives its permit back when the scheduler re-enqueues it, so the permit
//! count always matches lane contents and consumers never starve on phantom
//! signals.
//!
//! ## Wiring
//!
//! The queue is an explicitly constructed instance shared (via `Arc`) between
//! the producing side and the executor — there is no process-global singleton.
//! One instance per process is the intended deployment.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use centaurea_core::events::BackgroundEvent;
//! use centaurea_core::models::OperationType;
//! use centaurea_core::queue::InMemoryEventQueue;
//!
//! # async fn example() {
//! let queue = Arc::new(InMemoryEventQueue::new());
//!
//! // Fire-and-forget.
//! let event = Arc::new(BackgroundEvent::calculate(OperationType::Addition, 5.0, 3.0, None));
//! queue.enqueue([event]);
//!
//! // Enqueue-and-wait (an executor must be draining the queue for this to open).
//! let event = Arc::new(BackgroundEvent::calculate(OperationType::Addition, 5.0, 3.0, None));
//! let completed = queue
//!     .enqueue_awaiting(event.clone(), Duration::from_secs(5))
//!     .await;
//! if completed {
//!     let _result = event.result();
//! }
//! # }
//! ```

pub mod delay;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::constants::defaults;
use crate::events::{BackgroundEvent, SyncEnvelope, SyncGate};

use delay::DelayedLane;

/// Queue settings; defaults come from [`crate::constants::defaults`].
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Upper bound on how long the delay scheduler sleeps between heap checks.
    pub delayed_poll_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            delayed_poll_interval: Duration::from_secs(defaults::DELAYED_POLL_INTERVAL_SECS),
        }
    }
}

/// An entry in one of the queue lanes.
///
/// Sync envelopes ride the priority lane; everything else rides the normal
/// lane. An item is in exactly one lane at a time.
#[derive(Debug, Clone)]
pub enum QueueItem {
    Event(Arc<BackgroundEvent>),
    Sync(SyncEnvelope),
}

impl QueueItem {
    pub fn event(&self) -> &Arc<BackgroundEvent> {
        match self {
            QueueItem::Event(event) => event,
            QueueItem::Sync(envelope) => envelope.event(),
        }
    }

    pub fn is_sync(&self) -> bool {
        matches!(self, QueueItem::Sync(_))
    }

    pub fn scheduled_start(&self) -> Option<DateTime<Utc>> {
        self.event().scheduled_start()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.event().is_due(now)
    }

    /// Split into the inner event and, for sync items, the gate to release.
    pub fn into_parts(self) -> (Arc<BackgroundEvent>, Option<Arc<SyncGate>>) {
        match self {
            QueueItem::Event(event) => (event, None),
            QueueItem::Sync(envelope) => {
                let (event, gate) = envelope.into_parts();
                (event, Some(gate))
            }
        }
    }
}

/// The in-process event queue shared by producers and the executor.
#[derive(Debug)]
pub struct InMemoryEventQueue {
    priority_lane: SegQueue<QueueItem>,
    normal_lane: SegQueue<QueueItem>,
    delayed_lane: DelayedLane,
    signal: Semaphore,
    config: QueueConfig,
}

impl InMemoryEventQueue {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            priority_lane: SegQueue::new(),
            normal_lane: SegQueue::new(),
            delayed_lane: DelayedLane::new(),
            signal: Semaphore::new(0),
            config,
        }
    }

    /// Fire-and-forget submission. Each event lands at the back of the normal
    /// lane and wakes one waiting consumer.
    pub fn enqueue<I>(&self, events: I)
    where
        I: IntoIterator<Item = Arc<BackgroundEvent>>,
    {
        for event in events {
            self.enqueue_item(QueueItem::Event(event));
        }
    }

    /// Append one item to its lane and signal availability.
    pub fn enqueue_item(&self, item: QueueItem) {
        trace!(
            kind = item.event().kind().as_str(),
            sync = item.is_sync(),
            "Enqueueing event"
        );
        match &item {
            QueueItem::Sync(_) => self.priority_lane.push(item),
            QueueItem::Event(_) => self.normal_lane.push(item),
        }
        self.signal.add_permits(1);
    }

    /// Submission with bounded wait: wraps `event` in a sync envelope, queues it
    /// on the priority lane, and blocks until the executor releases the gate or
    /// `timeout` elapses.
    ///
    /// Returns whether the gate opened in time. On `false` the caller proceeds
    /// without a result; the event may still complete later with no observer.
    /// Never deadlocks when no executor is running — the wait simply times out.
    pub async fn enqueue_awaiting(&self, event: Arc<BackgroundEvent>, timeout: Duration) -> bool {
        let envelope = SyncEnvelope::new(event);
        let gate = envelope.gate().clone();
        self.enqueue_item(QueueItem::Sync(envelope));
        gate.wait(timeout).await
    }

    /// Blocking dequeue: waits for an availability permit (or cancellation),
    /// then drains the priority lane before the normal lane.
    ///
    /// A scanned item whose `scheduled_start` is still in the future moves to
    /// the delayed lane and the scan continues. Returns `None` when cancelled
    /// or when no ready item was found for the consumed permit (the permit
    /// travels with the parked item and is re-added on re-entry).
    pub async fn try_dequeue(&self, cancel: &CancellationToken) -> Option<QueueItem> {
        let permit = tokio::select! {
            _ = cancel.cancelled() => return None,
            permit = self.signal.acquire() => permit.ok()?,
        };
        permit.forget();
        self.scan_lanes()
    }

    /// Non-blocking dequeue used to fill out an executor batch.
    pub fn poll_dequeue(&self) -> Option<QueueItem> {
        let permit = self.signal.try_acquire().ok()?;
        permit.forget();
        self.scan_lanes()
    }

    fn scan_lanes(&self) -> Option<QueueItem> {
        let now = Utc::now();
        while let Some(item) = self
            .priority_lane
            .pop()
            .or_else(|| self.normal_lane.pop())
        {
            if item.is_due(now) {
                return Some(item);
            }
            debug!(
                kind = item.event().kind().as_str(),
                scheduled_start = ?item.scheduled_start(),
                "Parking event on the delayed lane"
            );
            self.delayed_lane.push(item);
        }
        None
    }

    /// Spawn the delayed-lane scheduler: a single task that re-enqueues parked
    /// items once they fall due and stops when `cancel` fires.
    pub fn spawn_delay_scheduler(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let queue = Arc::clone(self);
        let poll_interval = self.config.delayed_poll_interval;
        tokio::spawn(async move {
            delay::run_delay_scheduler(queue, cancel, poll_interval).await;
        })
    }

    pub(crate) fn delayed_lane(&self) -> &DelayedLane {
        &self.delayed_lane
    }

    pub fn priority_lane_len(&self) -> usize {
        self.priority_lane.len()
    }

    /// Count of fire-and-forget events currently queued.
    pub fn normal_lane_len(&self) -> usize {
        self.normal_lane.len()
    }

    pub fn delayed_lane_len(&self) -> usize {
        self.delayed_lane.len()
    }

    /// Drop every queued item and drain the matching availability permits.
    /// Intended for tests and demo resets, not production flows.
    pub fn clear(&self) {
        while self.signal.try_acquire().map(|p| p.forget()).is_ok() {}
        while self.priority_lane.pop().is_some() {}
        while self.normal_lane.pop().is_some() {}
        self.delayed_lane.clear();
    }
}

impl Default for InMemoryEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationType;

    fn immediate_event() -> Arc<BackgroundEvent> {
        Arc::new(BackgroundEvent::calculate(
            OperationType::Addition,
            1.0,
            2.0,
            None,
        ))
    }

    fn delayed_event(delay: chrono::Duration) -> Arc<BackgroundEvent> {
        Arc::new(
            BackgroundEvent::calculate(OperationType::Addition, 1.0, 2.0, None)
                .with_scheduled_start(Utc::now() + delay),
        )
    }

    #[tokio::test]
    async fn dequeue_returns_enqueued_event() {
        let queue = InMemoryEventQueue::new();
        let event = immediate_event();
        queue.enqueue([event.clone()]);

        let cancel = CancellationToken::new();
        let item = queue.try_dequeue(&cancel).await.expect("event expected");
        assert_eq!(item.event().id(), event.id());
    }

    #[tokio::test]
    async fn priority_lane_drains_before_normal_lane() {
        let queue = InMemoryEventQueue::new();

        // Normal first, sync second; the sync item must still come out first.
        queue.enqueue([immediate_event()]);
        let sync_event = immediate_event();
        queue.enqueue_item(QueueItem::Sync(SyncEnvelope::new(sync_event.clone())));

        let cancel = CancellationToken::new();
        let first = queue.try_dequeue(&cancel).await.unwrap();
        assert!(first.is_sync());
        assert_eq!(first.event().id(), sync_event.id());

        let second = queue.try_dequeue(&cancel).await.unwrap();
        assert!(!second.is_sync());
    }

    #[tokio::test]
    async fn dequeue_blocks_until_cancelled() {
        let queue = Arc::new(InMemoryEventQueue::new());
        let cancel = CancellationToken::new();

        let waiter = {
            let queue = queue.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { queue.try_dequeue(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        cancel.cancel();
        assert!(waiter.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn future_events_park_on_the_delayed_lane() {
        let queue = InMemoryEventQueue::new();
        queue.enqueue([delayed_event(chrono::Duration::seconds(60))]);

        let cancel = CancellationToken::new();
        // The permit is consumed, the item parks, and no ready item remains.
        assert!(queue.try_dequeue(&cancel).await.is_none());
        assert_eq!(queue.delayed_lane_len(), 1);
        assert_eq!(queue.normal_lane_len(), 0);

        // No phantom permit is left behind for the parked item.
        assert!(queue.poll_dequeue().is_none());
    }

    #[tokio::test]
    async fn delayed_scan_keeps_searching_for_a_ready_event() {
        let queue = InMemoryEventQueue::new();
        queue.enqueue([
            delayed_event(chrono::Duration::seconds(60)),
            immediate_event(),
        ]);

        let cancel = CancellationToken::new();
        let item = queue.try_dequeue(&cancel).await.expect("ready event");
        assert!(item.scheduled_start().is_none());
        assert_eq!(queue.delayed_lane_len(), 1);
    }

    #[tokio::test]
    async fn delay_scheduler_requeues_due_events() {
        let queue = Arc::new(InMemoryEventQueue::with_config(QueueConfig {
            delayed_poll_interval: Duration::from_millis(20),
        }));
        let cancel = CancellationToken::new();
        let scheduler = queue.spawn_delay_scheduler(cancel.clone());

        let event = delayed_event(chrono::Duration::milliseconds(80));
        queue.enqueue([event.clone()]);

        // First dequeue parks it.
        assert!(queue.try_dequeue(&cancel).await.is_none());
        assert_eq!(queue.delayed_lane_len(), 1);

        // Once due, the scheduler re-enqueues it and a consumer can pick it up.
        let item = tokio::time::timeout(
            Duration::from_secs(2),
            queue.try_dequeue(&cancel),
        )
        .await
        .expect("scheduler should requeue the event in time")
        .expect("requeued event");
        assert_eq!(item.event().id(), event.id());
        assert_eq!(queue.delayed_lane_len(), 0);

        cancel.cancel();
        scheduler.await.unwrap();
    }

    #[tokio::test]
    async fn enqueue_awaiting_times_out_without_an_executor() {
        let queue = InMemoryEventQueue::new();
        let event = immediate_event();

        let start = std::time::Instant::now();
        let completed = queue
            .enqueue_awaiting(event.clone(), Duration::from_millis(50))
            .await;
        assert!(!completed);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(event.outcome().is_none());
        // The envelope stays queued; a late executor could still process it.
        assert_eq!(queue.priority_lane_len(), 1);
    }

    #[tokio::test]
    async fn concurrent_producers_lose_no_events() {
        let queue = Arc::new(InMemoryEventQueue::new());
        let producers: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        queue.enqueue([immediate_event()]);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }

        let cancel = CancellationToken::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let item = queue.try_dequeue(&cancel).await.expect("event expected");
            assert!(seen.insert(item.event().id()), "duplicate delivery");
        }
        assert!(queue.poll_dequeue().is_none());
    }

    #[tokio::test]
    async fn clear_empties_lanes_and_permits() {
        let queue = InMemoryEventQueue::new();
        queue.enqueue([immediate_event(), immediate_event()]);
        queue.enqueue([delayed_event(chrono::Duration::seconds(60))]);

        queue.clear();
        assert_eq!(queue.normal_lane_len(), 0);
        assert_eq!(queue.delayed_lane_len(), 0);
        assert!(queue.poll_dequeue().is_none());
    }
}
