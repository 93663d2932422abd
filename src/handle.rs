//! Write-once result cells connecting a submitted task to its caller.
//!
//! Every submission creates a [`TaskHandle`] for the caller and a
//! [`Completer`] that travels with the task into the queue. The worker that
//! runs the task writes exactly once through the completer; the handle can be
//! read any number of times afterwards.
//!
//! Each cell has its own lock and condvar, so readers of one task never
//! contend with the pool's queue or with unrelated tasks.

use crate::error::TaskError;
use crate::executor::TaskId;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type TaskResult<T> = std::result::Result<T, TaskError>;

struct Slot<T> {
    state: Mutex<Option<TaskResult<T>>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn fill(&self, result: TaskResult<T>) {
        let mut state = self.state.lock();
        debug_assert!(state.is_none(), "result slot written twice");
        *state = Some(result);
        drop(state);
        self.ready.notify_all();
    }
}

/// Create a connected handle/completer pair for the task `id`.
pub(crate) fn channel<T>(id: TaskId) -> (TaskHandle<T>, Completer<T>) {
    let slot = Arc::new(Slot {
        state: Mutex::new(None),
        ready: Condvar::new(),
    });

    let handle = TaskHandle {
        id,
        slot: slot.clone(),
    };
    let completer = Completer {
        slot,
        completed: false,
    };

    (handle, completer)
}

/// Caller-side view of a task's eventual outcome.
///
/// The handle is `Sync` for `T: Send`; wrap it in an `Arc` to let several
/// threads observe the same task.
pub struct TaskHandle<T> {
    id: TaskId,
    slot: Arc<Slot<T>>,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Non-blocking check for completion.
    pub fn is_ready(&self) -> bool {
        self.slot.state.lock().is_some()
    }

    /// Block until the task has finished. A captured failure is not surfaced
    /// here; read it with [`get`](Self::get) or [`join`](Self::join).
    pub fn wait(&self) {
        let mut state = self.slot.state.lock();
        while state.is_none() {
            self.slot.ready.wait(&mut state);
        }
    }

    /// Block for at most `timeout`. Returns whether the task finished.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        // a deadline past the end of `Instant` is the same as no deadline
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut state = self.slot.state.lock();
        while state.is_none() {
            if self.slot.ready.wait_until(&mut state, deadline).timed_out() {
                return state.is_some();
            }
        }
        true
    }

    /// Consume the handle, blocking until the outcome is available.
    pub fn join(self) -> TaskResult<T> {
        let mut state = self.slot.state.lock();
        while state.is_none() {
            self.slot.ready.wait(&mut state);
        }
        state.take().unwrap_or(Err(TaskError::Abandoned))
    }
}

impl<T: Clone> TaskHandle<T> {
    /// Block until the outcome is available and return a copy of it.
    ///
    /// Repeated calls observe the same value or the same failure.
    pub fn get(&self) -> TaskResult<T> {
        let mut state = self.slot.state.lock();
        loop {
            if let Some(result) = state.as_ref() {
                return result.clone();
            }
            self.slot.ready.wait(&mut state);
        }
    }

    pub fn try_get(&self) -> Option<TaskResult<T>> {
        self.slot.state.lock().clone()
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Worker-side write end of a [`TaskHandle`].
///
/// Dropping a completer that was never used resolves the handle to
/// [`TaskError::Abandoned`], so no reader waits forever.
pub(crate) struct Completer<T> {
    slot: Arc<Slot<T>>,
    completed: bool,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, result: TaskResult<T>) {
        self.completed = true;
        self.slot.fill(result);
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.completed {
            self.slot.fill(Err(TaskError::Abandoned));
        }
    }
}
