//! Error handling for the primkit library
//!
//! Recoverable failures are reported through [`PrimkitError`]. Resource
//! exhaustion on the infallible code paths never surfaces here; it is routed
//! through [`crate::error_recovery::fatal_error`] instead.

use thiserror::Error;

/// Main error type for the primkit library
#[derive(Error, Debug)]
pub enum PrimkitError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Memory allocation failures
    #[error("Memory allocation failed: requested {size} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        size: usize,
    },

    /// Index out of bounds access
    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The invalid index
        index: usize,
        /// The valid size/length
        size: usize,
    },

    /// Hash value 0 marks an empty bucket and cannot be stored
    #[error("Hash value 0 is reserved for empty buckets")]
    ReservedHash,

    /// Job submitted to a pool that has been shut down
    #[error("Worker pool is stopped")]
    PoolStopped,

    /// The OS refused to start a worker thread
    #[error("Failed to spawn worker thread: {source}")]
    ThreadSpawn {
        /// Error reported by the OS
        source: std::io::Error,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl PrimkitError {
    /// Create an out of memory error
    pub fn out_of_memory(size: usize) -> Self {
        Self::OutOfMemory { size }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::OutOfBounds { index, size }
    }

    /// Create a reserved hash error
    pub fn reserved_hash() -> Self {
        Self::ReservedHash
    }

    /// Create a pool stopped error
    pub fn pool_stopped() -> Self {
        Self::PoolStopped
    }

    /// Create a thread spawn error
    pub fn thread_spawn(source: std::io::Error) -> Self {
        Self::ThreadSpawn { source }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::OutOfMemory { .. } => false,
            Self::OutOfBounds { .. } => false,
            Self::ReservedHash => false,
            Self::PoolStopped => false,
            Self::ThreadSpawn { .. } => true,
            Self::Configuration { .. } => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::OutOfMemory { .. } => "memory",
            Self::OutOfBounds { .. } => "bounds",
            Self::ReservedHash => "hash",
            Self::PoolStopped => "pool",
            Self::ThreadSpawn { .. } => "thread",
            Self::Configuration { .. } => "config",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PrimkitError>;

/// Assert that an index is within bounds
#[inline]
pub fn check_bounds(index: usize, size: usize) -> Result<()> {
    if index >= size {
        Err(PrimkitError::out_of_bounds(index, size))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PrimkitError::configuration("test message");
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_bounds_checking() {
        assert!(check_bounds(5, 10).is_ok());
        assert!(check_bounds(10, 10).is_err());
        assert!(check_bounds(15, 10).is_err());
        assert!(check_bounds(0, 0).is_err());
    }

    #[test]
    fn test_all_error_types() {
        let memory_err = PrimkitError::out_of_memory(1024);
        assert_eq!(memory_err.category(), "memory");
        assert!(!memory_err.is_recoverable());

        let bounds_err = PrimkitError::out_of_bounds(5, 3);
        assert_eq!(bounds_err.category(), "bounds");
        assert!(!bounds_err.is_recoverable());

        let hash_err = PrimkitError::reserved_hash();
        assert_eq!(hash_err.category(), "hash");

        let pool_err = PrimkitError::pool_stopped();
        assert_eq!(pool_err.category(), "pool");
        assert!(!pool_err.is_recoverable());

        let spawn_err = PrimkitError::thread_spawn(std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            "resource temporarily unavailable",
        ));
        assert_eq!(spawn_err.category(), "thread");
        assert!(spawn_err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let bounds_err = PrimkitError::out_of_bounds(10, 5);
        let display = format!("{}", bounds_err);
        assert!(display.contains("Out of bounds"));
        assert!(display.contains("10"));
        assert!(display.contains("5"));

        let oom = PrimkitError::out_of_memory(4096);
        assert!(format!("{}", oom).contains("4096"));

        let spawn_err = PrimkitError::thread_spawn(std::io::Error::other("no threads left"));
        assert!(format!("{}", spawn_err).contains("no threads left"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: PrimkitError = io_error.into();

        assert_eq!(err.category(), "io");
        assert!(err.is_recoverable());
        assert!(format!("{}", err).contains("I/O error"));
    }

    #[test]
    fn test_error_debug() {
        let err = PrimkitError::configuration("debug test");
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Configuration"));
        assert!(debug_str.contains("debug test"));
    }
}
