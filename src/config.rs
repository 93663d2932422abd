use crate::error::{Error, Result};
use crate::executor::PanicStrategy;
use std::env;

const MAX_THREADS: usize = 1024;

pub const ENV_NUM_THREADS: &str = "QPOOL_NUM_THREADS";
pub const ENV_THREAD_NAME_PREFIX: &str = "QPOOL_THREAD_NAME_PREFIX";
pub const ENV_STACK_SIZE: &str = "QPOOL_STACK_SIZE";

#[derive(Debug, Clone)]
pub struct Config {
    /// Worker count; `None` means one per logical CPU.
    pub num_threads: Option<usize>,
    pub stack_size: Option<usize>,
    pub thread_name_prefix: String,
    pub panic_strategy: PanicStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "qpool-worker".to_string(),
            panic_strategy: PanicStrategy::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Defaults overlaid with `QPOOL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(n) = read_env_usize(ENV_NUM_THREADS)? {
            config.num_threads = Some(n);
        }
        if let Ok(prefix) = env::var(ENV_THREAD_NAME_PREFIX) {
            config.thread_name_prefix = prefix;
        }
        if let Some(size) = read_env_usize(ENV_STACK_SIZE)? {
            config.stack_size = Some(size);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > MAX_THREADS {
                return Err(Error::config(format!(
                    "num_threads too large (max {})",
                    MAX_THREADS
                )));
            }
        }

        if self.stack_size == Some(0) {
            return Err(Error::config("stack_size must be > 0"));
        }

        if self.thread_name_prefix.contains('\0') {
            return Err(Error::config("thread_name_prefix must not contain NUL"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }
}

fn read_env_usize(key: &str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| Error::config(format!("{}={:?}: {}", key, raw, e))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::config(format!("{}: {}", key, e))),
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
