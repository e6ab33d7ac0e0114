//! Worker pool configuration.

use super::{Config, parse_env_bool, parse_env_var};
use crate::error::{PrimkitError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Smallest stack size accepted for worker threads.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Configuration for [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of worker threads spawned at construction
    pub num_workers: usize,
    /// Worker threads are named `{thread_name_prefix}-{index}`
    pub thread_name_prefix: String,
    /// Stack size for worker threads; `None` uses the platform default
    pub stack_size: Option<usize>,
    /// Drop jobs still queued at shutdown instead of running them
    pub discard_on_shutdown: bool,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            thread_name_prefix: "primkit-worker".to_string(),
            stack_size: None,
            discard_on_shutdown: false,
        }
    }
}

impl WorkerPoolConfig {
    /// Default configuration with an explicit worker count.
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Self::default()
        }
    }
}

impl Config for WorkerPoolConfig {
    fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(PrimkitError::configuration(
                "num_workers must be greater than 0",
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(PrimkitError::configuration(
                "thread_name_prefix must not be empty",
            ));
        }
        if let Some(size) = self.stack_size {
            if size < MIN_STACK_SIZE {
                return Err(PrimkitError::configuration(format!(
                    "stack_size must be at least {} bytes, got {}",
                    MIN_STACK_SIZE, size
                )));
            }
        }
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.num_workers =
            parse_env_var(&format!("{}POOL_NUM_WORKERS", prefix), config.num_workers);
        if let Ok(name) = env::var(format!("{}POOL_THREAD_NAME_PREFIX", prefix)) {
            config.thread_name_prefix = name;
        }
        config.stack_size = env::var(format!("{}POOL_STACK_SIZE", prefix))
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .or(config.stack_size);
        config.discard_on_shutdown = parse_env_bool(
            &format!("{}POOL_DISCARD_ON_SHUTDOWN", prefix),
            config.discard_on_shutdown,
        );
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            num_workers: num_cpus::get().max(1) * 2,
            ..Self::default()
        }
    }

    fn memory_preset() -> Self {
        Self {
            num_workers: 2,
            stack_size: Some(256 * 1024),
            ..Self::default()
        }
    }

    fn realtime_preset() -> Self {
        // Shutdown waits only for jobs already running
        Self {
            num_workers: num_cpus::get().max(1),
            discard_on_shutdown: true,
            ..Self::default()
        }
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self).map_err(|e| {
            PrimkitError::configuration(format!("Failed to serialize worker pool config: {}", e))
        })?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PrimkitError::configuration(format!("Failed to parse worker pool config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}
