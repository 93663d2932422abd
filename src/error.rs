use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the pool itself, synchronously, to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("thread pool is closed")]
    PoolClosed,

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to spawn worker: {0}")]
    Spawn(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn spawn<S: Into<String>>(msg: S) -> Self {
        Error::Spawn(msg.into())
    }
}

/// Failure captured while running a task, surfaced when its handle is read.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    #[error("task panicked: {message}")]
    Panicked { message: String },

    #[error("task failed: {0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync + 'static>),

    #[error("task was dropped before it ran")]
    Abandoned,
}

impl TaskError {
    pub fn failed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TaskError::Failed(Arc::new(err))
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked { .. })
    }

    /// Message of the underlying failure, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            TaskError::Panicked { message } => message.clone(),
            TaskError::Failed(err) => err.to_string(),
            TaskError::Abandoned => "abandoned".to_string(),
        }
    }
}
