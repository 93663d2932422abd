//! Task representation and execution.

use super::panic_handler::PanicHandler;
use crate::error::TaskError;
use crate::handle::Completer;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task, allocated in increasing order.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// How a task ended, as seen by the worker that ran it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Failed,
    Panicked,
}

/// Type-erased unit of work. Arguments are already bound; running it
/// delivers the result to wherever the job was created to report.
///
/// `record` sees the outcome before any handle is fulfilled, so counters are
/// current by the time a caller observes the result.
pub(crate) trait Job: Send {
    fn run(self: Box<Self>, id: TaskId, panics: &PanicHandler, record: &mut dyn FnMut(Outcome));
}

/// A job whose outcome is written into a [`TaskHandle`](crate::TaskHandle).
struct HandleJob<F, T> {
    func: F,
    completer: Completer<T>,
}

impl<F, T> Job for HandleJob<F, T>
where
    F: FnOnce() -> Result<T, TaskError> + Send,
    T: Send,
{
    fn run(self: Box<Self>, id: TaskId, panics: &PanicHandler, record: &mut dyn FnMut(Outcome)) {
        let HandleJob { func, completer } = *self;

        let (outcome, result) = match panics.execute(id, func) {
            Ok(Ok(value)) => (Outcome::Completed, Ok(value)),
            Ok(Err(err)) => {
                tracing::debug!(task = %id, error = %err, "task returned an error");
                (Outcome::Failed, Err(err))
            }
            Err(panic) => (
                Outcome::Panicked,
                Err(TaskError::Panicked {
                    message: panic.message,
                }),
            ),
        };

        record(outcome);
        completer.complete(result);
    }
}

/// A fire-and-forget job with nobody waiting on it.
struct DetachedJob<F> {
    func: F,
}

impl<F> Job for DetachedJob<F>
where
    F: FnOnce() + Send,
{
    fn run(self: Box<Self>, id: TaskId, panics: &PanicHandler, record: &mut dyn FnMut(Outcome)) {
        match panics.execute(id, self.func) {
            Ok(()) => record(Outcome::Completed),
            Err(panic) => {
                // no handle carries this failure, so always leave a trace
                tracing::debug!(
                    task = %id,
                    message = %panic.message,
                    "detached task panicked"
                );
                record(Outcome::Panicked);
            }
        }
    }
}

/// Internal task representation
pub(crate) struct Task {
    pub(crate) id: TaskId,
    job: Box<dyn Job + 'static>,
    pub(crate) enqueued_at: Instant,
}

impl Task {
    /// Task that reports into `completer`.
    pub(crate) fn with_completer<F, T>(id: TaskId, func: F, completer: Completer<T>) -> Self
    where
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
        T: Send + 'static,
    {
        Task {
            id,
            job: Box::new(HandleJob { func, completer }),
            enqueued_at: Instant::now(),
        }
    }

    pub(crate) fn detached<F>(func: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            job: Box::new(DetachedJob { func }),
            enqueued_at: Instant::now(),
        }
    }

    /// Execute the task, reporting its outcome to `record` first.
    pub(crate) fn execute(self, panics: &PanicHandler, record: &mut dyn FnMut(Outcome)) {
        self.job.run(self.id, panics, record)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("enqueued_at", &self.enqueued_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::PanicStrategy;
    use crate::handle;

    fn run(task: Task, panics: &PanicHandler) -> Outcome {
        let mut seen = None;
        task.execute(panics, &mut |outcome| seen = Some(outcome));
        seen.expect("outcome not recorded")
    }

    #[test]
    fn test_task_ids_increase() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert!(b > a);
        assert_eq!(a.to_string(), format!("task-{}", a.as_u64()));
    }

    #[test]
    fn test_value_reaches_handle() {
        let panics = PanicHandler::new(PanicStrategy::Isolate);
        let id = TaskId::next();
        let (handle, completer) = handle::channel(id);

        let task = Task::with_completer(id, || Ok::<_, TaskError>(2 + 3), completer);
        assert_eq!(run(task, &panics), Outcome::Completed);
        assert_eq!(handle.join().unwrap(), 5);
    }

    #[test]
    fn test_panic_reaches_handle() {
        let panics = PanicHandler::new(PanicStrategy::Isolate);
        let id = TaskId::next();
        let (handle, completer) = handle::channel::<u8>(id);

        let task = Task::with_completer(id, || panic!("test"), completer);
        assert_eq!(run(task, &panics), Outcome::Panicked);

        let err = handle.join().unwrap_err();
        assert!(err.is_panic());
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn test_dropped_task_abandons_handle() {
        let id = TaskId::next();
        let (handle, completer) = handle::channel::<u8>(id);
        let task = Task::with_completer(id, || Ok(1), completer);

        drop(task);
        assert!(matches!(handle.join(), Err(TaskError::Abandoned)));
    }

    #[test]
    fn test_detached_panic_is_contained() {
        let panics = PanicHandler::new(PanicStrategy::Isolate);
        let task = Task::detached(|| panic!("boom"));
        assert_eq!(run(task, &panics), Outcome::Panicked);
        assert_eq!(panics.panic_count(), 1);
    }

    #[test]
    fn test_outcome_recorded_before_handle_ready() {
        let panics = PanicHandler::new(PanicStrategy::Isolate);
        let id = TaskId::next();
        let (handle, completer) = handle::channel::<u8>(id);
        let task = Task::with_completer(id, || Ok(9), completer);

        let mut ready_when_recorded = None;
        task.execute(&panics, &mut |outcome| {
            assert_eq!(outcome, Outcome::Completed);
            ready_when_recorded = Some(handle.is_ready());
        });

        assert_eq!(ready_when_recorded, Some(false));
        assert_eq!(handle.join().unwrap(), 9);
    }
}
