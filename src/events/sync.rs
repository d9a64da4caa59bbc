//! # Synchronous-Wait Bridge
//!
//! Pairs an event with a zero-permit gate so a producer can enqueue work and
//! block (with a timeout) until a worker signals completion. The gate starts
//! closed; the executor opens it exactly once after every handler for the event
//! has finished, success or failure, so a waiter is never abandoned by a handler
//! exception.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::types::BackgroundEvent;

/// Single-release gate used to wake exactly one waiter.
///
/// Backed by a semaphore with zero initial permits. A successful wait consumes
/// the permit, so a released gate does not satisfy later waits.
#[derive(Debug)]
pub struct SyncGate {
    permits: Semaphore,
}

impl SyncGate {
    pub fn new() -> Self {
        Self {
            permits: Semaphore::new(0),
        }
    }

    /// Open the gate, waking one waiter. Called by the executor once per
    /// envelope after handler fan-out settles.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    /// Block until the gate opens or `timeout` elapses. Returns whether the
    /// gate opened in time.
    pub async fn wait(&self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.permits.acquire()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                true
            }
            // The semaphore is never closed; treat it like a miss if it is.
            Ok(Err(_)) => false,
            Err(_) => false,
        }
    }
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new()
    }
}

/// An event paired with its gate, queued on the priority lane.
///
/// Envelopes are not dispatched to handlers; the executor unwraps them and
/// releases the gate itself.
#[derive(Debug, Clone)]
pub struct SyncEnvelope {
    event: Arc<BackgroundEvent>,
    gate: Arc<SyncGate>,
}

impl SyncEnvelope {
    pub fn new(event: Arc<BackgroundEvent>) -> Self {
        Self {
            event,
            gate: Arc::new(SyncGate::new()),
        }
    }

    pub fn event(&self) -> &Arc<BackgroundEvent> {
        &self.event
    }

    pub fn gate(&self) -> &Arc<SyncGate> {
        &self.gate
    }

    pub fn into_parts(self) -> (Arc<BackgroundEvent>, Arc<SyncGate>) {
        (self.event, self.gate)
    }
}
