#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Centaurea Core
//!
//! In-process background event queue and executor for the Centaurea calculator
//! API. HTTP handlers enqueue calculation events and block — bounded by a
//! timeout — until a background worker has computed and persisted the result,
//! keeping request threads free while the work runs off-thread.
//!
//! ## Architecture
//!
//! Producers wrap an event in a sync envelope and park on its gate; the
//! executor drains the queue in batches, fans out every handler registered for
//! the event's kind, writes a typed outcome onto the event, and releases the
//! gate. Fire-and-forget events (history persistence) ride a lower-priority
//! lane, and events scheduled for the future wait on a time-ordered delayed
//! lane serviced by a single scheduler task.
//!
//! ## Module Organization
//!
//! - [`events`] - Event model, typed outcomes, and the sync-wait bridge
//! - [`queue`] - Three-lane in-memory queue with availability signaling
//! - [`executor`] - Batch-draining background executor
//! - [`handlers`] - Business-logic handlers and the kind-keyed registry
//! - [`services`] - Collaborator traits plus in-memory reference implementations
//! - [`models`] - Calculator domain types
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use centaurea_core::config::CentaureaConfig;
//! use centaurea_core::events::BackgroundEvent;
//! use centaurea_core::executor::BackgroundExecutor;
//! use centaurea_core::handlers::HandlerRegistry;
//! use centaurea_core::models::OperationType;
//! use centaurea_core::queue::InMemoryEventQueue;
//! use centaurea_core::services::{InMemoryExpressionService, InMemoryWeatherService};
//!
//! # async fn example() -> centaurea_core::error::Result<()> {
//! let config = CentaureaConfig::from_env()?;
//!
//! // Composition root: one queue and one executor per process, wired
//! // explicitly into both the producing and consuming sides.
//! let queue = Arc::new(InMemoryEventQueue::with_config(config.queue_config()));
//! let registry = HandlerRegistry::with_default_handlers(
//!     Arc::new(InMemoryExpressionService::new()),
//!     Arc::new(InMemoryWeatherService::new()),
//! );
//! registry.validate()?;
//! let executor =
//!     BackgroundExecutor::new(queue.clone(), Arc::new(registry), config.executor_config());
//! executor.start()?;
//!
//! // Producer side (an HTTP handler): enqueue and wait for the result.
//! let event = Arc::new(BackgroundEvent::calculate(OperationType::Addition, 5.0, 3.0, None));
//! if queue.enqueue_awaiting(event.clone(), config.sync_wait_timeout()).await {
//!     if let Some(expression) = event.result() {
//!         println!("{}", expression.expression_text);
//!     }
//! }
//!
//! executor.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod executor;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod queue;
pub mod services;

pub use config::CentaureaConfig;
pub use error::{CentaureaError, HandlerError, Result};
pub use events::{BackgroundEvent, EventKind, EventOutcome, EventPayload, SyncEnvelope, SyncGate};
pub use executor::{BackgroundExecutor, ExecutorConfig};
pub use handlers::{BackgroundHandler, HandlerRegistry};
pub use models::{Expression, ExpressionHistory, OperationType, UserIdentity};
pub use queue::{InMemoryEventQueue, QueueConfig, QueueItem};
