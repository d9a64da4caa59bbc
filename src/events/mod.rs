//! # Background Events
//!
//! The event model for deferred work: a closed set of event kinds, immutable
//! payloads, a write-once typed outcome slot, and the synchronous-wait bridge
//! that lets a producer block until a worker finishes its event.
//!
//! ## Module Organization
//!
//! - [`types`] - `BackgroundEvent`, `EventKind`, `EventPayload`, `EventOutcome`
//! - [`sync`] - `SyncGate` and `SyncEnvelope` (the enqueue-and-wait bridge)

pub mod sync;
pub mod types;

pub use sync::{SyncEnvelope, SyncGate};
pub use types::{BackgroundEvent, EventKind, EventOutcome, EventPayload};
