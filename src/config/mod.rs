//! Configuration APIs for primkit
//!
//! Every tunable component has a configuration struct implementing the
//! [`Config`] trait, which provides validation, environment initialization,
//! presets and JSON persistence.
//!
//! - [`HashIndexConfig`]: initial table size and growth threshold of a
//!   [`HashIndex`](crate::HashIndex)
//! - [`WorkerPoolConfig`]: worker count, thread naming and shutdown behaviour
//!   of a [`WorkerPool`](crate::WorkerPool)
//!
//! # Environment Initialization
//!
//! ```rust
//! use primkit::config::{Config, WorkerPoolConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads PRIMKIT_POOL_NUM_WORKERS, PRIMKIT_POOL_THREAD_NAME_PREFIX, ...
//! let config = WorkerPoolConfig::from_env()?;
//!
//! // Custom prefix: MYAPP_POOL_NUM_WORKERS, ...
//! let config = WorkerPoolConfig::from_env_with_prefix("MYAPP_")?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use std::env;
use std::fmt;
use std::path::Path;

pub mod hash_index;
pub mod worker_pool;


pub use hash_index::HashIndexConfig;
pub use worker_pool::WorkerPoolConfig;

/// Common configuration trait providing validation, environment initialization,
/// and preset management functionality.
pub trait Config: Clone + fmt::Debug {
    /// Validate the configuration for correctness and consistency.
    fn validate(&self) -> Result<()>;

    /// Initialize configuration from environment variables.
    ///
    /// Environment variables use the format `PRIMKIT_{COMPONENT}_{FIELD}`,
    /// for example `PRIMKIT_POOL_NUM_WORKERS=8`.
    fn from_env() -> Result<Self>
    where
        Self: Default,
    {
        Self::from_env_with_prefix("PRIMKIT_")
    }

    /// Initialize configuration from environment variables with a custom prefix.
    ///
    /// Unset or unparsable variables keep their default value; the result
    /// is validated before it is returned.
    fn from_env_with_prefix(prefix: &str) -> Result<Self>
    where
        Self: Default;

    /// Preset tuned for throughput at the cost of memory.
    fn performance_preset() -> Self;

    /// Preset tuned for a small footprint.
    fn memory_preset() -> Self;

    /// Preset tuned for predictable latency.
    fn realtime_preset() -> Self;

    /// Balanced preset, identical to the default configuration.
    fn balanced_preset() -> Self
    where
        Self: Default,
    {
        Self::default()
    }

    /// Save configuration to a JSON file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Load and validate configuration from a JSON file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>;
}

/// Parse an environment variable, falling back to `default` when it is
/// unset or does not parse.
pub fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr + Clone,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a boolean environment variable.
///
/// Accepts "true", "1", "yes", "on" (case-insensitive) as true,
/// everything else as false.
pub fn parse_env_bool(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .map(|s| {
            let s = s.trim().to_lowercase();
            matches!(s.as_str(), "true" | "1" | "yes" | "on")
        })
        .unwrap_or(default)
}
