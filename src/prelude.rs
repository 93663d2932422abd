pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result, TaskError};
pub use crate::executor::{PanicStrategy, ThreadPool};
pub use crate::handle::{TaskHandle, TaskResult};
pub use crate::stats::PoolStats;
