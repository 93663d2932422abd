//! qpool - a fixed-size worker thread pool
//!
//! A set of long-lived worker threads pulls type-erased tasks from one shared
//! FIFO queue. Every submission returns a [`TaskHandle`] that later yields the
//! task's value, or the failure it produced, without ever taking a worker
//! down with it.
//!
//! # Quick Start
//!
//! ```
//! use qpool::prelude::*;
//!
//! let pool = ThreadPool::with_threads(4).unwrap();
//!
//! let sum = pool.submit_with(|(a, b): (i32, i32)| a + b, (2, 3)).unwrap();
//! let text = pool.submit(|| String::from("abc")).unwrap();
//!
//! assert_eq!(sum.get().unwrap(), 5);
//! assert_eq!(text.join().unwrap(), "abc");
//! // dropping the pool drains the queue and joins the workers
//! ```
//!
//! # Features
//!
//! - **FIFO dispatch**: tasks are dequeued strictly in submission order
//! - **Panic isolation**: a panicking task resolves its handle to an error
//! - **Graceful shutdown**: queued work is always drained before workers exit
//! - **Introspection**: pool and per-worker counters via [`PoolStats`]
//! - **Diagnostics**: lifecycle events through the `tracing` facade

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod handle;
pub mod prelude;
pub mod stats;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result, TaskError};
pub use executor::{PanicStrategy, TaskId, ThreadPool, WorkerStatus};
pub use handle::{TaskHandle, TaskResult};
pub use stats::{PoolStats, WorkerSnapshot};
