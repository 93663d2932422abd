//! Task execution infrastructure.
//!
//! This module provides the worker threads, the task representation, and the
//! fixed-size thread pool that ties them together.

pub mod panic_handler;
pub mod task;
pub mod thread_pool;
pub mod worker;

pub use panic_handler::{PanicHandler, PanicInfo, PanicStrategy};
pub use task::TaskId;
pub use thread_pool::ThreadPool;
pub use worker::{WorkerId, WorkerState, WorkerStatus};
