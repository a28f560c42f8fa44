//! Delayed and repeating event delivery.
//!
//! An [`EventScheduler`] owns a small tokio runtime with a single named
//! worker thread. Every scheduled supplier runs on that thread and its event
//! is posted to the scheduler's bus from there, so listeners of scheduled
//! events run on the timer thread rather than on the caller's.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

use evbus_core::Event;

use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::shared::SharedBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    OneShot,
    Periodic,
}

struct PendingTask {
    mode: Mode,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct TaskState {
    runs: AtomicU64,
    cancelled: AtomicBool,
    finished: AtomicBool,
}

/// Marks its task finished when dropped, whether the body returned, panicked
/// or was aborted
struct FinishGuard(Arc<TaskState>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finished.store(true, Ordering::SeqCst);
    }
}

/// Handle to a scheduled delivery
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    abort: AbortHandle,
    state: Arc<TaskState>,
}

impl ScheduledTask {
    /// Cancel the task. A delivery already in progress completes.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the task will never fire again
    pub fn is_finished(&self) -> bool {
        self.is_cancelled() || self.state.finished.load(Ordering::SeqCst)
    }

    /// How many times the supplier has been invoked
    pub fn runs(&self) -> u64 {
        self.state.runs.load(Ordering::SeqCst)
    }
}

/// Posts supplied events after a delay or on a fixed cadence
pub struct EventScheduler {
    bus: SharedBus,
    config: SchedulerConfig,
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    tasks: Mutex<Vec<PendingTask>>,
    shut_down: AtomicBool,
}

impl EventScheduler {
    /// Start a scheduler posting to `bus`
    pub fn new(bus: impl Into<SharedBus>, config: SchedulerConfig) -> SchedulerResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(config.thread_name.clone())
            .enable_time()
            .build()?;
        let handle = runtime.handle().clone();

        tracing::debug!(thread = %config.thread_name, "Event scheduler started");

        Ok(Self {
            bus: bus.into(),
            config,
            runtime: Mutex::new(Some(runtime)),
            handle,
            tasks: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Start a scheduler posting to the process-wide bus
    pub fn global(config: SchedulerConfig) -> SchedulerResult<Self> {
        Self::new(SharedBus::Global, config)
    }

    /// Post the supplied event once, after `delay`
    pub fn schedule<E, F>(&self, delay: Duration, supplier: F) -> SchedulerResult<ScheduledTask>
    where
        E: Event,
        F: FnOnce() -> Option<E> + Send + 'static,
    {
        let bus = self.bus.clone();
        self.spawn(Mode::OneShot, move |state| async move {
            time::sleep(delay).await;
            state.runs.fetch_add(1, Ordering::SeqCst);
            deliver(&bus, supplier());
        })
    }

    /// Post a supplied event every `period`, starting after `initial_delay`
    ///
    /// Ticks missed while the timer thread was busy are delivered back to back.
    /// The task ends at the first delivery whose listeners fail.
    pub fn schedule_at_fixed_rate<E, F>(
        &self,
        initial_delay: Duration,
        period: Duration,
        mut supplier: F,
    ) -> SchedulerResult<ScheduledTask>
    where
        E: Event,
        F: FnMut() -> Option<E> + Send + 'static,
    {
        if period.is_zero() {
            return Err(SchedulerError::InvalidPeriod);
        }
        let bus = self.bus.clone();
        self.spawn(Mode::Periodic, move |state| async move {
            let mut ticker = time::interval_at(Instant::now() + initial_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                ticker.tick().await;
                state.runs.fetch_add(1, Ordering::SeqCst);
                if !deliver(&bus, supplier()) {
                    break;
                }
            }
        })
    }

    /// Post a supplied event repeatedly, waiting `delay` between the end of
    /// one delivery and the start of the next
    pub fn schedule_with_fixed_delay<E, F>(
        &self,
        initial_delay: Duration,
        delay: Duration,
        mut supplier: F,
    ) -> SchedulerResult<ScheduledTask>
    where
        E: Event,
        F: FnMut() -> Option<E> + Send + 'static,
    {
        if delay.is_zero() {
            return Err(SchedulerError::InvalidPeriod);
        }
        let bus = self.bus.clone();
        self.spawn(Mode::Periodic, move |state| async move {
            time::sleep(initial_delay).await;
            loop {
                state.runs.fetch_add(1, Ordering::SeqCst);
                if !deliver(&bus, supplier()) {
                    break;
                }
                time::sleep(delay).await;
            }
        })
    }

    /// Run `job` on the timer thread after `delay`
    pub(crate) fn run_after<F>(&self, delay: Duration, job: F) -> SchedulerResult<ScheduledTask>
    where
        F: FnOnce() + Send + 'static,
    {
        self.spawn(Mode::OneShot, move |state| async move {
            time::sleep(delay).await;
            state.runs.fetch_add(1, Ordering::SeqCst);
            job();
        })
    }

    fn spawn<T, Fut>(&self, mode: Mode, task: T) -> SchedulerResult<ScheduledTask>
    where
        T: FnOnce(Arc<TaskState>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // Checked under the task lock so shutdown cannot miss a new task
        let mut tasks = self.tasks.lock();
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(SchedulerError::ShutDown);
        }
        tasks.retain(|pending| !pending.handle.is_finished());

        let state = Arc::new(TaskState::default());
        let body = task(state.clone());
        let guard = FinishGuard(state.clone());
        let handle = self.handle.spawn(async move {
            let _guard = guard;
            body.await;
        });
        let abort = handle.abort_handle();
        tasks.push(PendingTask { mode, handle });

        Ok(ScheduledTask { abort, state })
    }

    /// Stop accepting work and wind the timer thread down
    ///
    /// Repeating tasks are cancelled at once. Pending one-shot deliveries get
    /// up to `shutdown_timeout` to fire; whatever is still waiting after that
    /// is dropped. Idempotent.
    ///
    /// Blocks the calling thread, so it must not be called from inside an
    /// async runtime, including from a listener of a scheduled event.
    pub fn shutdown(&self) {
        let pending = {
            let mut tasks = self.tasks.lock();
            if self.shut_down.swap(true, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *tasks)
        };

        let mut one_shots = Vec::new();
        for task in pending {
            match task.mode {
                Mode::Periodic => task.handle.abort(),
                Mode::OneShot => one_shots.push(task.handle),
            }
        }

        let Some(runtime) = self.runtime.lock().take() else {
            return;
        };

        let timeout = self.config.shutdown_timeout();
        let waiting = one_shots.len();
        let drained = runtime.block_on(async move {
            time::timeout(timeout, async move {
                for handle in one_shots {
                    let _ = handle.await;
                }
            })
            .await
            .is_ok()
        });

        if drained {
            tracing::debug!(waiting, "Event scheduler shut down");
        } else {
            tracing::warn!(
                waiting,
                timeout_ms = timeout.as_millis() as u64,
                "Event scheduler shutdown timed out, dropping pending tasks"
            );
        }
        runtime.shutdown_background();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Bus the scheduled events are posted to
    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl std::fmt::Debug for EventScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventScheduler")
            .field("pending", &self.tasks.lock().len())
            .field("shut_down", &self.is_shutdown())
            .field("config", &self.config)
            .finish()
    }
}

impl Drop for EventScheduler {
    fn drop(&mut self) {
        self.shut_down.store(true, Ordering::SeqCst);
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}

/// Post `event` if the supplier produced one
///
/// Returns false when a listener failed.
fn deliver<E: Event>(bus: &SharedBus, event: Option<E>) -> bool {
    let Some(event) = event else {
        return true;
    };
    match bus.get().post(event) {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Scheduled event delivery failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evbus_core::EventBus;
    use std::sync::atomic::AtomicUsize;

    struct Tick;
    impl Event for Tick {}

    fn quick_config() -> SchedulerConfig {
        SchedulerConfig {
            shutdown_timeout_ms: 500,
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn test_zero_period_rejected() {
        let scheduler = EventScheduler::new(Arc::new(EventBus::new()), quick_config())
            .expect("runtime starts");
        let result = scheduler.schedule_at_fixed_rate(Duration::ZERO, Duration::ZERO, || {
            Some(Tick)
        });
        assert!(matches!(result, Err(SchedulerError::InvalidPeriod)));
        let result = scheduler.schedule_with_fixed_delay(Duration::ZERO, Duration::ZERO, || {
            Some(Tick)
        });
        assert!(matches!(result, Err(SchedulerError::InvalidPeriod)));
    }

    #[test]
    fn test_schedule_after_shutdown_fails() {
        let scheduler = EventScheduler::new(Arc::new(EventBus::new()), quick_config())
            .expect("runtime starts");
        scheduler.shutdown();
        scheduler.shutdown();
        assert!(scheduler.is_shutdown());

        let result = scheduler.schedule(Duration::ZERO, || Some(Tick));
        assert!(matches!(result, Err(SchedulerError::ShutDown)));
    }

    #[test]
    fn test_shutdown_drains_one_shots() {
        let bus = Arc::new(EventBus::new());
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        bus.on(move |_: &mut Tick| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let scheduler = EventScheduler::new(&bus, quick_config()).expect("runtime starts");
        let task = scheduler
            .schedule(Duration::from_millis(20), || Some(Tick))
            .expect("scheduled");
        scheduler.shutdown();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
        assert_eq!(task.runs(), 1);
    }
}
