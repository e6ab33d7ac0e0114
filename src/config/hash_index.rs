//! Hash index sizing configuration.

use super::{Config, parse_env_var};
use crate::error::{PrimkitError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of slots when a caller asks for capacity 0.
pub const DEFAULT_INITIAL_CAPACITY: usize = 512;

/// Default growth threshold.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// Configuration for [`HashIndex`](crate::HashIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashIndexConfig {
    /// Number of slots allocated up front
    pub initial_capacity: usize,
    /// Occupancy ratio above which the table doubles and rehashes, in (0, 0.75]
    pub max_load_factor: f64,
}

impl Default for HashIndexConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl HashIndexConfig {
    /// Default configuration with a different initial capacity.
    pub fn with_initial_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }
}

impl Config for HashIndexConfig {
    fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(PrimkitError::configuration(
                "initial_capacity must be greater than 0",
            ));
        }
        if !self.max_load_factor.is_finite()
            || self.max_load_factor <= 0.0
            || self.max_load_factor > DEFAULT_MAX_LOAD_FACTOR
        {
            return Err(PrimkitError::configuration(format!(
                "max_load_factor must be in (0, {}], got {}",
                DEFAULT_MAX_LOAD_FACTOR, self.max_load_factor
            )));
        }
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.initial_capacity = parse_env_var(
            &format!("{}HASH_INITIAL_CAPACITY", prefix),
            config.initial_capacity,
        );
        config.max_load_factor = parse_env_var(
            &format!("{}HASH_MAX_LOAD_FACTOR", prefix),
            config.max_load_factor,
        );
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        // Short probe chains
        Self {
            initial_capacity: 4096,
            max_load_factor: 0.5,
        }
    }

    fn memory_preset() -> Self {
        Self {
            initial_capacity: 64,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    fn realtime_preset() -> Self {
        // Large table up front so rehashes are rare
        Self {
            initial_capacity: 16384,
            max_load_factor: 0.6,
        }
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self).map_err(|e| {
            PrimkitError::configuration(format!("Failed to serialize hash index config: {}", e))
        })?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PrimkitError::configuration(format!("Failed to parse hash index config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}
