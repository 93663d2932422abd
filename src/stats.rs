//! Point-in-time counters for a pool and its workers.

use crate::executor::{WorkerId, WorkerStatus};
use std::time::Duration;

/// Snapshot returned by [`ThreadPool::stats`](crate::ThreadPool::stats).
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub num_threads: usize,
    pub submitted: u64,
    /// Tasks that returned normally.
    pub completed: u64,
    /// Tasks that panicked or returned an error.
    pub failed: u64,
    /// Subset of `failed` that panicked.
    pub panicked: u64,
    pub queued: usize,
    pub idle_workers: usize,
    pub running_workers: usize,
}

impl PoolStats {
    pub fn finished(&self) -> u64 {
        self.completed + self.failed
    }

    /// Submitted tasks not yet finished, queued or running.
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.finished())
    }

    pub fn utilization(&self) -> f64 {
        let live = self.idle_workers + self.running_workers;
        if live == 0 {
            return 0.0;
        }
        self.running_workers as f64 / live as f64
    }

    pub fn success_rate(&self) -> f64 {
        let finished = self.finished();
        if finished == 0 {
            return 1.0;
        }
        self.completed as f64 / finished as f64
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSnapshot {
    pub id: WorkerId,
    pub status: WorkerStatus,
    pub tasks_executed: u64,
    pub tasks_failed: u64,
    pub idle_time: Duration,
}
