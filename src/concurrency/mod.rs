//! Thread-based job execution
//!
//! This module provides a fixed-size pool of OS worker threads consuming
//! boxed closures from a shared FIFO queue.

pub mod worker_pool;

pub use worker_pool::{DEFAULT_WORKERS, Job, PoolHandle, PoolState, WorkerPool};
