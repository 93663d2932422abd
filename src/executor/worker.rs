// worker thread stuff
use super::task::Outcome;
use super::thread_pool::Shared;
use crate::stats::WorkerSnapshot;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type WorkerId = usize;

/// Where a worker is in its loop.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerStatus {
    /// Waiting for a task or for the stop signal.
    Idle = 0,
    /// Executing a task, queue lock released.
    Running = 1,
    /// Saw stop with an empty queue; the thread is done.
    Exiting = 2,
}

impl WorkerStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WorkerStatus::Idle,
            1 => WorkerStatus::Running,
            _ => WorkerStatus::Exiting,
        }
    }
}

// stats for each worker
#[derive(Debug)]
pub struct WorkerState {
    status: AtomicU8,
    pub tasks_executed: AtomicU64,
    pub tasks_failed: AtomicU64,
    pub idle_time_ns: AtomicU64,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(WorkerStatus::Idle as u8),
            tasks_executed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            idle_time_ns: AtomicU64::new(0),
        }
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: WorkerStatus) {
        self.status.store(status as u8, Ordering::Release);
    }
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub state: Arc<WorkerState>,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            state: Arc::new(WorkerState::new()),
        }
    }

    // main loop
    pub fn run(&self, shared: &Shared) {
        tracing::debug!(worker = self.id, "worker started");

        loop {
            self.state.set_status(WorkerStatus::Idle);
            let idle_start = Instant::now();

            // None means stop was raised and the queue is drained
            let Some(task) = shared.next_task() else {
                break;
            };

            self.state
                .idle_time_ns
                .fetch_add(idle_start.elapsed().as_nanos() as u64, Ordering::Relaxed);
            self.state.set_status(WorkerStatus::Running);

            let tid = task.id;
            let queued_for = task.enqueued_at.elapsed();
            task.execute(&shared.panics, &mut |outcome| {
                self.state.tasks_executed.fetch_add(1, Ordering::Relaxed);
                if outcome != Outcome::Completed {
                    self.state.tasks_failed.fetch_add(1, Ordering::Relaxed);
                }
                shared.record_outcome(outcome);

                tracing::trace!(
                    worker = self.id,
                    task = %tid,
                    ?outcome,
                    queued_us = queued_for.as_micros() as u64,
                    "task finished"
                );
            });
        }

        self.state.set_status(WorkerStatus::Exiting);
        tracing::debug!(
            worker = self.id,
            executed = self.state.tasks_executed.load(Ordering::Relaxed),
            "worker exiting"
        );
    }

    pub fn snapshot(id: WorkerId, state: &WorkerState) -> WorkerSnapshot {
        WorkerSnapshot {
            id,
            status: state.status(),
            tasks_executed: state.tasks_executed.load(Ordering::Relaxed),
            tasks_failed: state.tasks_failed.load(Ordering::Relaxed),
            idle_time: Duration::from_nanos(state.idle_time_ns.load(Ordering::Relaxed)),
        }
    }
}
