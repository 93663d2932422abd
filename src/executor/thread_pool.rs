use super::panic_handler::{PanicHandler, PanicStrategy};
use super::task::{Outcome, Task, TaskId};
use super::worker::{Worker, WorkerId, WorkerState, WorkerStatus};
use crate::config::Config;
use crate::error::{Error, Result, TaskError};
use crate::handle::{self, TaskHandle, TaskResult};
use crate::stats::{PoolStats, WorkerSnapshot};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Queue contents and the stop flag, always read and written together.
struct Queue {
    tasks: VecDeque<Task>,
    stop: bool,
}

/// State shared between the pool handle and every worker thread.
pub(crate) struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
    // lock-free mirror of `Queue::stop` for cheap reads
    closed: AtomicBool,
    pub(crate) panics: PanicHandler,
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    fn new(panic_strategy: PanicStrategy) -> Self {
        Self {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                stop: false,
            }),
            available: Condvar::new(),
            closed: AtomicBool::new(false),
            panics: PanicHandler::new(panic_strategy),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    fn push(&self, task: Task) -> Result<()> {
        let mut queue = self.queue.lock();
        if queue.stop {
            return Err(Error::PoolClosed);
        }
        queue.tasks.push_back(task);
        self.submitted.fetch_add(1, Ordering::Relaxed);
        drop(queue);

        self.available.notify_one();
        Ok(())
    }

    /// Block until a task is available. Returns `None` once stop has been
    /// raised and nothing is left to drain.
    pub(crate) fn next_task(&self) -> Option<Task> {
        let mut queue = self.queue.lock();
        loop {
            if let Some(task) = queue.tasks.pop_front() {
                return Some(task);
            }
            if queue.stop {
                return None;
            }
            self.available.wait(&mut queue);
        }
    }

    /// Raise the stop flag and wake every worker. Returns the number of
    /// tasks still queued at that moment.
    fn stop(&self) -> usize {
        let mut queue = self.queue.lock();
        queue.stop = true;
        self.closed.store(true, Ordering::Release);
        let pending = queue.tasks.len();
        drop(queue);

        self.available.notify_all();
        pending
    }

    pub(crate) fn record_outcome(&self, outcome: Outcome) {
        match outcome {
            Outcome::Completed => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            // panics are counted by the panic handler
            Outcome::Failed | Outcome::Panicked => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

struct WorkerHandle {
    id: WorkerId,
    state: Arc<WorkerState>,
    thread: Option<JoinHandle<()>>,
}

/// Fixed-size pool of worker threads fed from a single FIFO queue.
///
/// Dropping the pool shuts it down: new submissions are refused, every task
/// already queued is executed, and all workers are joined.
pub struct ThreadPool {
    workers: Vec<WorkerHandle>,
    shared: Arc<Shared>,
    num_threads: usize,
}

impl ThreadPool {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let mut pool = ThreadPool {
            workers: Vec::with_capacity(num_threads),
            shared: Arc::new(Shared::new(config.panic_strategy)),
            num_threads,
        };

        for id in 0..num_threads {
            let worker = Worker::new(id);
            let state = worker.state.clone();
            let shared = pool.shared.clone();
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            // on failure `pool` is dropped, which stops and joins the
            // workers spawned so far
            let thread = builder
                .spawn(move || worker.run(&shared))
                .map_err(|e| Error::spawn(format!("worker {}: {}", id, e)))?;

            pool.workers.push(WorkerHandle {
                id,
                state,
                thread: Some(thread),
            });
        }

        tracing::info!(
            threads = num_threads,
            prefix = %config.thread_name_prefix,
            "thread pool started"
        );

        Ok(pool)
    }

    pub fn with_threads(num_threads: usize) -> Result<Self> {
        let config = Config::builder().num_threads(num_threads).build()?;
        Self::new(&config)
    }

    /// One worker per logical CPU.
    pub fn with_default_threads() -> Result<Self> {
        Self::new(&Config::default())
    }

    /// Queue `f` and return a handle to its result.
    ///
    /// A panic inside `f` is captured and reported by the handle.
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit_task(move || Ok(f()))
    }

    /// Queue `f` with `args` bound now; `args` is typically a tuple.
    pub fn submit_with<F, A, T>(&self, f: F, args: A) -> Result<TaskHandle<T>>
    where
        F: FnOnce(A) -> T + Send + 'static,
        A: Send + 'static,
        T: Send + 'static,
    {
        self.submit(move || f(args))
    }

    /// Queue a fallible task. An `Err` it returns is captured as
    /// [`TaskError::Failed`].
    pub fn try_submit<F, T, E>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.submit_task(move || f().map_err(TaskError::failed))
    }

    /// Queue `f` without a handle.
    ///
    /// Nothing observes the result, so a panic inside `f` is only visible as
    /// a `tracing` event and in [`PoolStats::panicked`].
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_shutdown() {
            return Err(Error::PoolClosed);
        }
        self.shared.push(Task::detached(f))
    }

    fn submit_task<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> TaskResult<T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_shutdown() {
            return Err(Error::PoolClosed);
        }

        let id = TaskId::next();
        let (handle, completer) = handle::channel(id);
        self.shared.push(Task::with_completer(id, f, completer))?;
        Ok(handle)
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn queued_tasks(&self) -> usize {
        self.shared.queue.lock().tasks.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Stop accepting work without waiting. Workers keep draining the queue;
    /// [`shutdown`](Self::shutdown) or drop joins them.
    pub fn close(&self) {
        let pending = self.shared.stop();
        tracing::debug!(pending, "thread pool closed");
    }

    /// Stop accepting work, run everything still queued, and join all
    /// workers. Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        let pending = self.shared.stop();

        let mut joined = 0;
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    tracing::error!(worker = worker.id, "worker thread panicked");
                }
                joined += 1;
            }
        }

        if joined > 0 {
            let stats = self.stats();
            tracing::info!(
                drained = pending,
                completed = stats.completed,
                failed = stats.failed,
                "thread pool shut down"
            );
        }
    }

    /// Snapshot of the pool's counters.
    ///
    /// A task is counted before its handle becomes ready, so after a
    /// successful `join` or `get` that task already shows in `completed` or
    /// `failed`. Counters are read one at a time; while other work is in
    /// flight they may disagree with each other. After
    /// [`shutdown`](Self::shutdown) they are exact.
    pub fn stats(&self) -> PoolStats {
        let mut idle_workers = 0;
        let mut running_workers = 0;
        for worker in &self.workers {
            match worker.state.status() {
                WorkerStatus::Idle => idle_workers += 1,
                WorkerStatus::Running => running_workers += 1,
                WorkerStatus::Exiting => {}
            }
        }

        PoolStats {
            num_threads: self.num_threads,
            submitted: self.shared.submitted.load(Ordering::Relaxed),
            completed: self.shared.completed.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            panicked: self.shared.panics.panic_count() as u64,
            queued: self.queued_tasks(),
            idle_workers,
            running_workers,
        }
    }

    pub fn worker_stats(&self) -> Vec<WorkerSnapshot> {
        self.workers
            .iter()
            .map(|w| Worker::snapshot(w.id, &w.state))
            .collect()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads)
            .field("queued", &self.queued_tasks())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
