//! # Background Executor
//!
//! The continuously running loop that drains the event queue in batches,
//! fans handlers out per event, and releases sync gates so blocked producers
//! wake up.
//!
//! ## Cycle
//!
//! 1. Block until one item is ready (or shutdown is requested), then
//!    opportunistically drain up to `batch_size` items total — a partial batch
//!    dispatches immediately rather than waiting to fill.
//! 2. Dispatch every item in the batch concurrently. Per item: unwrap a sync
//!    envelope, resolve the handler list for the event's kind, run all matching
//!    handlers as concurrent tasks, record a typed failure outcome if a handler
//!    failed and none recorded a result, then release the gate.
//! 3. Sleep `cycle_delay` before the next cycle. The delay is deliberate
//!    pacing, not an error path.
//!
//! ## Failure Semantics
//!
//! Handler errors and panics are caught, logged, and recorded on the event's
//! outcome slot; they never crash the loop and never prevent the gate release,
//! so a waiting producer is never left hanging past its own timeout. The one
//! exception is an event kind with zero registered handlers: the gate is left
//! closed and the producer observes a full-timeout miss — that state is a
//! wiring bug, which [`crate::handlers::HandlerRegistry::validate`] rejects at
//! startup.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::constants::defaults;
use crate::error::{CentaureaError, HandlerError, Result};
use crate::events::{BackgroundEvent, EventOutcome, SyncGate};
use crate::handlers::HandlerRegistry;
use crate::queue::{InMemoryEventQueue, QueueItem};

/// Executor settings; defaults come from [`crate::constants::defaults`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum items drained per cycle.
    pub batch_size: usize,
    /// Pause between cycles once a batch has settled.
    pub cycle_delay: Duration,
    /// Bound on how long `stop` waits for the loop and scheduler to exit.
    pub shutdown_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            cycle_delay: Duration::from_secs(defaults::CYCLE_DELAY_SECS),
            shutdown_timeout: Duration::from_secs(defaults::SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

/// Running state owned by a started executor.
#[derive(Debug)]
struct RunningTasks {
    process_loop: JoinHandle<()>,
    delay_scheduler: JoinHandle<()>,
}

/// Batch-draining background executor.
///
/// Constructed by the composition root with the shared queue and the handler
/// registry, started once at process startup, and stopped at shutdown.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use centaurea_core::executor::{BackgroundExecutor, ExecutorConfig};
/// use centaurea_core::handlers::HandlerRegistry;
/// use centaurea_core::queue::InMemoryEventQueue;
/// use centaurea_core::services::{InMemoryExpressionService, InMemoryWeatherService};
///
/// # async fn example() -> centaurea_core::error::Result<()> {
/// let queue = Arc::new(InMemoryEventQueue::new());
/// let registry = HandlerRegistry::with_default_handlers(
///     Arc::new(InMemoryExpressionService::new()),
///     Arc::new(InMemoryWeatherService::new()),
/// );
/// let executor = BackgroundExecutor::new(queue, Arc::new(registry), ExecutorConfig::default());
/// executor.start()?;
/// // ... serve traffic ...
/// executor.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BackgroundExecutor {
    queue: Arc<InMemoryEventQueue>,
    registry: Arc<HandlerRegistry>,
    config: ExecutorConfig,
    cancel: CancellationToken,
    running: parking_lot::Mutex<Option<RunningTasks>>,
}

impl BackgroundExecutor {
    pub fn new(
        queue: Arc<InMemoryEventQueue>,
        registry: Arc<HandlerRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            queue,
            registry,
            config,
            cancel: CancellationToken::new(),
            running: parking_lot::Mutex::new(None),
        }
    }

    /// The process-wide cancellation token. Cancelling it stops the executor
    /// loop and the delay scheduler; in-flight handlers run to completion.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Spawn the processing loop and the delayed-lane scheduler.
    pub fn start(&self) -> Result<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(CentaureaError::ExecutorError(
                "Executor is already running".to_string(),
            ));
        }
        if self.cancel.is_cancelled() {
            return Err(CentaureaError::ExecutorError(
                "Executor has been stopped and cannot be restarted".to_string(),
            ));
        }

        let delay_scheduler = self.queue.spawn_delay_scheduler(self.cancel.clone());

        let queue = Arc::clone(&self.queue);
        let registry = Arc::clone(&self.registry);
        let config = self.config.clone();
        let cancel = self.cancel.clone();
        let loop_handle = tokio::spawn(async move {
            process_loop(queue, registry, config, cancel).await;
        });

        *running = Some(RunningTasks {
            process_loop: loop_handle,
            delay_scheduler,
        });
        info!("Background executor started");
        Ok(())
    }

    /// Request shutdown and wait (bounded by `shutdown_timeout`) for the loop
    /// and scheduler tasks to finish. The in-flight batch drains first.
    pub async fn stop(&self) -> Result<()> {
        self.cancel.cancel();

        let Some(tasks) = self.running.lock().take() else {
            return Ok(());
        };

        let drained = tokio::time::timeout(self.config.shutdown_timeout, async {
            let _ = tasks.process_loop.await;
            let _ = tasks.delay_scheduler.await;
        })
        .await;

        match drained {
            Ok(()) => {
                info!("Background executor stopped");
                Ok(())
            }
            Err(_) => Err(CentaureaError::Timeout(
                "Executor did not stop within the shutdown timeout".to_string(),
            )),
        }
    }
}

/// Main processing loop: drain a batch, dispatch it, pace, repeat.
async fn process_loop(
    queue: Arc<InMemoryEventQueue>,
    registry: Arc<HandlerRegistry>,
    config: ExecutorConfig,
    cancel: CancellationToken,
) {
    info!(
        batch_size = config.batch_size,
        cycle_delay_ms = config.cycle_delay.as_millis() as u64,
        "Executor processing loop started"
    );

    while !cancel.is_cancelled() {
        let Some(first) = queue.try_dequeue(&cancel).await else {
            // Cancelled, or the consumed permit pointed at a now-parked item.
            continue;
        };

        let mut batch = vec![first];
        while batch.len() < config.batch_size {
            match queue.poll_dequeue() {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        debug!(batch_len = batch.len(), "Dispatching batch");

        let dispatches = batch
            .into_iter()
            .map(|item| run_single_event(item, &registry, &cancel));
        join_all(dispatches).await;

        // Deliberate pacing between cycles, interruptible by shutdown.
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.cycle_delay) => {}
        }
    }

    info!("Executor processing loop stopped");
}

/// Dispatch one dequeued item: unwrap, fan out handlers, settle the outcome,
/// release the gate.
async fn run_single_event(
    item: QueueItem,
    registry: &Arc<HandlerRegistry>,
    cancel: &CancellationToken,
) {
    let (event, gate) = item.into_parts();
    let handlers = registry.handlers_for(event.kind());

    if handlers.is_empty() {
        // Leaving the gate closed means a sync producer observes a
        // full-timeout miss; registry validation exists to catch this wiring
        // error before any traffic.
        warn!(
            kind = event.kind().as_str(),
            event_id = %event.id(),
            "No handlers registered for event kind"
        );
        return;
    }

    let fan_out: Vec<JoinHandle<std::result::Result<(), HandlerError>>> = handlers
        .iter()
        .map(|handler| {
            let handler = Arc::clone(handler);
            let event = Arc::clone(&event);
            let cancel = cancel.clone();
            tokio::spawn(async move { handler.handle(&event, &cancel).await })
        })
        .collect();

    for joined in join_all(fan_out).await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(handler_error)) => {
                error!(
                    kind = event.kind().as_str(),
                    event_id = %event.id(),
                    error = %handler_error,
                    "Background handler failed"
                );
                event.record_outcome(EventOutcome::Failed(handler_error));
            }
            Err(join_error) => {
                error!(
                    kind = event.kind().as_str(),
                    event_id = %event.id(),
                    error = %join_error,
                    "Background handler panicked"
                );
                event.record_outcome(EventOutcome::Failed(HandlerError::Internal(
                    join_error.to_string(),
                )));
            }
        }
    }

    release_gate(&event, gate);
}

fn release_gate(event: &Arc<BackgroundEvent>, gate: Option<Arc<SyncGate>>) {
    if let Some(gate) = gate {
        debug!(event_id = %event.id(), "Releasing sync gate");
        gate.release();
    }
}
