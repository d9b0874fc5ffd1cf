use futures::future::join_all;
use futures::FutureExt;
use loadmeter_common::{LoadMeterError, Result, DEFAULT_SHUTDOWN_GRACE};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type SharedQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Task>>>;

/// Lifecycle of a [`LoadGenerator`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    NotStarted,
    Running,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GeneratorState::NotStarted => "not started",
            GeneratorState::Running => "running",
            GeneratorState::ShuttingDown => "shutting down",
            GeneratorState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// How [`LoadGenerator::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every queued and in-flight task finished within the grace period.
    Graceful,
    /// The grace period elapsed; the listed number of workers were still busy and got aborted.
    Forced { aborted_workers: usize },
}

struct Pool {
    queue: mpsc::UnboundedSender<Task>,
    workers: Vec<JoinHandle<()>>,
}

struct Inner {
    state: GeneratorState,
    pool: Option<Pool>,
}

/// Fixed-size pool of tokio workers for fire-and-forget load tasks.
///
/// `execute` only enqueues; it never waits for the task. Completion
/// tracking is the caller's job, typically a channel or counter the task
/// signals when it is done.
pub struct LoadGenerator {
    capacity: usize,
    grace_period: Duration,
    inner: Mutex<Inner>,
    queued: Arc<AtomicUsize>,
    panicked: Arc<AtomicU64>,
}

impl LoadGenerator {
    pub fn new(capacity: usize) -> Self {
        Self::with_grace_period(capacity, DEFAULT_SHUTDOWN_GRACE)
    }

    pub fn with_grace_period(capacity: usize, grace_period: Duration) -> Self {
        Self {
            capacity,
            grace_period,
            inner: Mutex::new(Inner { state: GeneratorState::NotStarted, pool: None }),
            queued: Arc::new(AtomicUsize::new(0)),
            panicked: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn state(&self) -> GeneratorState {
        self.inner.lock().state
    }

    /// Tasks submitted but not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// Tasks that panicked. Their workers kept running.
    pub fn panicked_tasks(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }

    /// Spawn `capacity` workers on the current tokio runtime.
    pub fn start(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(LoadMeterError::InvalidCapacity(self.capacity));
        }
        let handle = Handle::try_current().map_err(|_| LoadMeterError::NoRuntime)?;

        let mut inner = self.inner.lock();
        if inner.state != GeneratorState::NotStarted {
            return Err(LoadMeterError::illegal_state("start", inner.state));
        }

        let (tx, rx) = mpsc::unbounded_channel::<Task>();
        let rx: SharedQueue = Arc::new(tokio::sync::Mutex::new(rx));
        let workers = (0..self.capacity)
            .map(|id| {
                handle.spawn(worker_loop(
                    id,
                    Arc::clone(&rx),
                    Arc::clone(&self.queued),
                    Arc::clone(&self.panicked),
                ))
            })
            .collect();

        inner.pool = Some(Pool { queue: tx, workers });
        inner.state = GeneratorState::Running;
        debug!(capacity = self.capacity, "load generator started");
        Ok(())
    }

    /// Queue `task` for a worker. Fails without running the task unless the
    /// generator is `Running`.
    pub fn execute<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inner = self.inner.lock();
        let pool = match (inner.state, inner.pool.as_ref()) {
            (GeneratorState::Running, Some(pool)) => pool,
            (state, _) => return Err(LoadMeterError::illegal_state("execute", state)),
        };

        self.queued.fetch_add(1, Ordering::Relaxed);
        if pool.queue.send(Box::pin(task)).is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
            return Err(LoadMeterError::illegal_state("execute", inner.state));
        }
        Ok(())
    }

    /// Queue a synchronous closure. It runs on tokio's blocking pool while
    /// occupying one worker slot.
    pub fn execute_blocking<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(async move {
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
            }
        })
    }

    /// Stop accepting work, let workers drain the queue, and abort whatever
    /// is still running once the grace period is up.
    ///
    /// Calling this on a generator that is not running is a no-op.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        let pool = {
            let mut inner = self.inner.lock();
            match inner.state {
                GeneratorState::Running => {
                    inner.state = GeneratorState::ShuttingDown;
                    inner.pool.take()
                }
                GeneratorState::NotStarted => {
                    inner.state = GeneratorState::Terminated;
                    None
                }
                GeneratorState::ShuttingDown | GeneratorState::Terminated => None,
            }
        };
        let Some(Pool { queue, mut workers }) = pool else {
            return ShutdownOutcome::Graceful;
        };

        // Closing the queue is the workers' stop signal once it is empty.
        drop(queue);

        let drained = tokio::time::timeout(self.grace_period, join_all(workers.iter_mut())).await;
        let outcome = match drained {
            Ok(_) => ShutdownOutcome::Graceful,
            Err(_) => {
                let aborted_workers = workers.iter().filter(|w| !w.is_finished()).count();
                for worker in &workers {
                    worker.abort();
                }
                // Abort only requests cancellation; wait until no worker can touch `queued`.
                // Finished handles may already have yielded their output and must not be polled again.
                join_all(workers.into_iter().filter(|w| !w.is_finished())).await;
                self.queued.store(0, Ordering::Relaxed);
                warn!(
                    aborted_workers,
                    grace_ms = self.grace_period.as_millis() as u64,
                    "load generator did not drain within grace period, aborting workers"
                );
                ShutdownOutcome::Forced { aborted_workers }
            }
        };

        self.inner.lock().state = GeneratorState::Terminated;
        debug!(?outcome, "load generator terminated");
        outcome
    }
}

async fn worker_loop(id: usize, queue: SharedQueue, queued: Arc<AtomicUsize>, panicked: Arc<AtomicU64>) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(task) = next else { break };
        queued.fetch_sub(1, Ordering::Relaxed);

        if AssertUnwindSafe(task).catch_unwind().await.is_err() {
            panicked.fetch_add(1, Ordering::Relaxed);
            warn!(worker = id, "load task panicked");
        }
    }
    debug!(worker = id, "worker exiting");
}
