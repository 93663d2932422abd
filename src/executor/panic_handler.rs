use super::task::TaskId;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// Capture the panic into the task's handle without logging.
    Isolate,
    /// Capture the panic and emit a `warn` event.
    #[default]
    LogAndContinue,
}

/// Runs task bodies and turns panics into [`PanicInfo`].
#[derive(Debug)]
pub struct PanicHandler {
    strategy: PanicStrategy,
    panic_count: AtomicUsize,
}

impl PanicHandler {
    pub fn new(strategy: PanicStrategy) -> Self {
        Self {
            strategy,
            panic_count: AtomicUsize::new(0),
        }
    }

    pub fn execute<F, R>(&self, task_id: TaskId, f: F) -> Result<R, PanicInfo>
    where
        F: FnOnce() -> R,
    {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => Ok(result),
            Err(payload) => {
                self.panic_count.fetch_add(1, Ordering::Relaxed);

                let panic_info = PanicInfo::from_payload(payload);

                if self.strategy == PanicStrategy::LogAndContinue {
                    tracing::warn!(
                        task = %task_id,
                        message = %panic_info.message,
                        "task panicked"
                    );
                }

                Err(panic_info)
            }
        }
    }

    pub fn panic_count(&self) -> usize {
        self.panic_count.load(Ordering::Relaxed)
    }
}

impl Default for PanicHandler {
    fn default() -> Self {
        Self::new(PanicStrategy::default())
    }
}

#[derive(Debug, Clone)]
pub struct PanicInfo {
    pub message: String,
}

impl PanicInfo {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Self { message }
    }
}
