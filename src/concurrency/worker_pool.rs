//! WorkerPool: fixed set of OS threads draining a shared FIFO job queue
//!
//! All pool state lives under a single mutex: the job queue, the `head`
//! cursor of the next job to dequeue, the number of running jobs, the number
//! of live workers and the `stopping` flag. Two condition variables hang off
//! it: "work available" wakes workers, "idle" wakes callers of
//! [`WorkerPool::wait_idle`].
//!
//! Dequeued jobs are not removed from the queue; the cursor just advances.
//! The queue is compacted by the next `submit` once every queued job has been
//! taken, so a steady stream of submissions does not grow it without bound.
//!
//! # Examples
//!
//! ```rust
//! use primkit::WorkerPool;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let pool = WorkerPool::new(4);
//! let counter = Arc::new(AtomicUsize::new(0));
//! for _ in 0..16 {
//!     let counter = Arc::clone(&counter);
//!     pool.submit(move || {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     })
//!     .unwrap();
//! }
//! pool.wait_idle();
//! assert_eq!(counter.load(Ordering::Relaxed), 16);
//! pool.shutdown();
//! ```

use crate::config::{Config, WorkerPoolConfig};
use crate::containers::GrowableArray;
use crate::error::{PrimkitError, Result};
use crate::error_recovery::fatal_error;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Worker count used when a pool is created with 0 workers
pub const DEFAULT_WORKERS: usize = 2;

/// Unit of work executed by a pool worker
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Lifecycle of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    /// Accepting and running jobs
    Running,
    /// Shutdown requested; workers are finishing the remaining jobs
    Stopping,
    /// Every worker has exited
    Stopped,
}

/// State protected by the pool mutex
struct PoolInner {
    /// Submitted jobs; slots before `head` have already been taken
    queue: GrowableArray<Option<Job>>,
    /// Index of the next job to dequeue
    head: usize,
    /// Workers currently running a job
    working: usize,
    /// Workers that have not exited yet
    threads: usize,
    /// Set once by shutdown, never cleared
    stopping: bool,
}

impl PoolInner {
    #[inline]
    fn has_queued(&self) -> bool {
        self.head < self.queue.len()
    }

    #[inline]
    fn pending(&self) -> usize {
        self.queue.len() - self.head
    }

    /// Condition `wait_idle` blocks on
    #[inline]
    fn is_busy(&self) -> bool {
        if self.stopping {
            self.threads > 0
        } else {
            self.working > 0 || self.has_queued()
        }
    }

    fn state(&self) -> PoolState {
        match (self.stopping, self.threads) {
            (false, _) => PoolState::Running,
            (true, 0) => PoolState::Stopped,
            (true, _) => PoolState::Stopping,
        }
    }
}

struct Shared {
    inner: Mutex<PoolInner>,
    work_available: Condvar,
    idle: Condvar,
    discard_on_shutdown: bool,
    num_workers: usize,
}

impl Shared {
    fn submit(&self, job: Job) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.stopping {
            return Err(PrimkitError::pool_stopped());
        }

        if inner.head >= inner.queue.len() {
            inner.queue.clear();
            inner.head = 0;
        }
        inner.queue.push(Some(job));
        drop(inner);

        self.work_available.notify_one();
        Ok(())
    }

    fn wait_idle(&self) {
        let mut inner = self.inner.lock();
        while inner.is_busy() {
            self.idle.wait(&mut inner);
        }
    }

    /// Whether a worker should exit instead of taking another job
    fn should_exit(&self, inner: &PoolInner) -> bool {
        inner.stopping && (self.discard_on_shutdown || !inner.has_queued())
    }
}

/// Pool of worker threads executing submitted jobs in FIFO order
///
/// Dropping the pool performs the same shutdown as [`shutdown`](Self::shutdown).
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("WorkerPool")
            .field("num_workers", &self.shared.num_workers)
            .field("state", &inner.state())
            .field("pending_jobs", &inner.pending())
            .field("busy_workers", &inner.working)
            .finish()
    }
}

impl WorkerPool {
    /// Start a pool with `num_workers` threads (2 when 0 is given)
    ///
    /// Failure to start a worker thread is fatal; use
    /// [`try_new`](Self::try_new) to handle it instead.
    pub fn new(num_workers: usize) -> Self {
        match Self::try_new(num_workers) {
            Ok(pool) => pool,
            Err(e) => fatal_error(&e),
        }
    }

    /// Start a pool, returning [`PrimkitError::ThreadSpawn`] if a worker
    /// cannot be started
    pub fn try_new(num_workers: usize) -> Result<Self> {
        let num_workers = if num_workers == 0 {
            DEFAULT_WORKERS
        } else {
            num_workers
        };
        Self::with_config(&WorkerPoolConfig::with_workers(num_workers))
    }

    /// Start a pool from a validated configuration
    pub fn with_config(config: &WorkerPoolConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            inner: Mutex::new(PoolInner {
                queue: GrowableArray::new(),
                head: 0,
                working: 0,
                threads: 0,
                stopping: false,
            }),
            work_available: Condvar::new(),
            idle: Condvar::new(),
            discard_on_shutdown: config.discard_on_shutdown,
            num_workers: config.num_workers,
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(config.num_workers),
        };

        for index in 0..config.num_workers {
            let mut builder =
                thread::Builder::new().name(format!("{}-{}", config.thread_name_prefix, index));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }

            let shared = Arc::clone(&pool.shared);
            match builder.spawn(move || worker_loop(&shared)) {
                Ok(handle) => {
                    pool.shared.inner.lock().threads += 1;
                    pool.workers.push(handle);
                }
                Err(e) => {
                    log::error!(
                        "WorkerPool: failed to spawn worker {} of {}: {}",
                        index,
                        config.num_workers,
                        e
                    );
                    pool.stop_and_join();
                    return Err(PrimkitError::thread_spawn(e));
                }
            }
        }

        log::debug!(
            "WorkerPool: started {} workers (prefix {:?}, discard_on_shutdown {})",
            config.num_workers,
            config.thread_name_prefix,
            config.discard_on_shutdown
        );
        Ok(pool)
    }

    /// Enqueue a job
    ///
    /// Never blocks waiting for capacity. Fails with
    /// [`PrimkitError::PoolStopped`] once shutdown has begun.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.submit(Box::new(job))
    }

    /// Enqueue a plain function with its argument; the returned status is ignored
    pub fn submit_fn<A>(&self, func: fn(A) -> i32, arg: A) -> Result<()>
    where
        A: Send + 'static,
    {
        self.submit(move || run_status_fn(func, arg))
    }

    /// Block until no job is queued or running
    ///
    /// After shutdown has begun this instead waits for every worker to exit.
    /// Must not be called from inside a job.
    pub fn wait_idle(&self) {
        self.shared.wait_idle();
    }

    /// Stop accepting jobs, run every queued job and join every worker
    ///
    /// With `discard_on_shutdown` set, only jobs already running are waited
    /// for and the rest of the queue is dropped.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    /// Cloneable submitter that can be moved into jobs
    pub fn handle(&self) -> PoolHandle {
        PoolHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        self.shared.inner.lock().state()
    }

    /// Jobs submitted but not yet dequeued
    pub fn pending_jobs(&self) -> usize {
        self.shared.inner.lock().pending()
    }

    /// Workers currently running a job
    pub fn busy_workers(&self) -> usize {
        self.shared.inner.lock().working
    }

    /// Workers that have not exited
    pub fn live_workers(&self) -> usize {
        self.shared.inner.lock().threads
    }

    /// Number of workers the pool was started with
    pub fn num_workers(&self) -> usize {
        self.shared.num_workers
    }

    fn stop_and_join(&mut self) {
        {
            let mut inner = self.shared.inner.lock();
            if inner.stopping && self.workers.is_empty() {
                return;
            }
            inner.stopping = true;
        }
        self.shared.work_available.notify_all();
        self.shared.wait_idle();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("WorkerPool: worker thread terminated abnormally");
            }
        }

        let (discarded, queue) = {
            let mut inner = self.shared.inner.lock();
            let pending = inner.pending();
            inner.head = 0;
            (pending, mem::take(&mut inner.queue))
        };
        if discarded > 0 {
            log::debug!("WorkerPool: discarded {} queued jobs at shutdown", discarded);
        }
        // Queued closures are dropped outside the lock
        drop(queue);

        log::debug!("WorkerPool: stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

/// Cloneable job submitter sharing a [`WorkerPool`]'s queue
///
/// A handle may outlive its pool; submissions then fail with
/// [`PrimkitError::PoolStopped`].
#[derive(Clone)]
pub struct PoolHandle {
    shared: Arc<Shared>,
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl PoolHandle {
    /// Enqueue a job; see [`WorkerPool::submit`]
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.submit(Box::new(job))
    }

    /// Enqueue a plain function with its argument; see [`WorkerPool::submit_fn`]
    pub fn submit_fn<A>(&self, func: fn(A) -> i32, arg: A) -> Result<()>
    where
        A: Send + 'static,
    {
        self.submit(move || run_status_fn(func, arg))
    }

    /// Lifecycle state of the pool
    pub fn state(&self) -> PoolState {
        self.shared.inner.lock().state()
    }

    /// Jobs submitted but not yet dequeued
    pub fn pending_jobs(&self) -> usize {
        self.shared.inner.lock().pending()
    }
}

#[inline]
fn run_status_fn<A>(func: fn(A) -> i32, arg: A) {
    let status = func(arg);
    log::trace!("WorkerPool: job returned status {}", status);
}

fn worker_loop(shared: &Shared) {
    let mut inner = shared.inner.lock();

    loop {
        while !inner.stopping && !inner.has_queued() {
            shared.work_available.wait(&mut inner);
        }
        if shared.should_exit(&inner) {
            break;
        }

        let head = inner.head;
        let job = inner.queue[head].take();
        inner.head += 1;
        inner.working += 1;

        if let Some(job) = job {
            MutexGuard::unlocked(&mut inner, || run_job(job));
        }

        inner.working -= 1;
        if !inner.stopping && inner.working == 0 && !inner.has_queued() {
            shared.idle.notify_all();
        }
    }

    inner.threads -= 1;
    shared.idle.notify_all();
}

fn run_job(job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        log::error!(
            "WorkerPool: job panicked on worker {}",
            thread::current().name().unwrap_or("<unnamed>")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_default_worker_count() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.num_workers(), DEFAULT_WORKERS);
        assert_eq!(pool.live_workers(), DEFAULT_WORKERS);
        assert_eq!(pool.state(), PoolState::Running);
    }

    #[test]
    fn test_wait_idle_on_empty_pool() {
        let pool = WorkerPool::new(2);
        pool.wait_idle();
        assert_eq!(pool.pending_jobs(), 0);
        assert_eq!(pool.busy_workers(), 0);
    }

    #[test]
    fn test_every_job_runs_once() {
        let pool = WorkerPool::new(4);
        let counts: Arc<Vec<AtomicUsize>> =
            Arc::new((0..100).map(|_| AtomicUsize::new(0)).collect());

        for i in 0..100 {
            let counts = Arc::clone(&counts);
            pool.submit(move || {
                counts[i].fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.wait_idle();

        assert!(counts.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn test_fifo_with_single_worker() {
        let pool = WorkerPool::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..50 {
            let order = Arc::clone(&order);
            pool.submit(move || order.lock().push(i)).unwrap();
        }
        pool.wait_idle();

        assert_eq!(*order.lock(), (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_queue_compacts_after_drain() {
        let pool = WorkerPool::new(1);
        for _ in 0..10 {
            pool.submit(|| {}).unwrap();
        }
        pool.wait_idle();
        pool.submit(|| {}).unwrap();
        pool.wait_idle();

        let inner = pool.shared.inner.lock();
        assert!(inner.queue.len() <= 1);
        assert_eq!(inner.head, inner.queue.len());
    }

    #[test]
    fn test_shutdown_waits_for_running_job() {
        let pool = WorkerPool::new(1);
        let done = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = std::sync::mpsc::channel();

        let flag = Arc::clone(&done);
        pool.submit(move || {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(100));
            flag.store(1, Ordering::SeqCst);
        })
        .unwrap();

        started_rx.recv().unwrap();
        pool.shutdown();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_submit_fn() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        fn record(n: usize) -> i32 {
            CALLS.fetch_add(n, Ordering::SeqCst);
            0
        }

        let pool = WorkerPool::new(2);
        pool.submit_fn(record, 3).unwrap();
        pool.handle().submit_fn(record, 4).unwrap();
        pool.wait_idle();
        assert_eq!(CALLS.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_reentrant_submit() {
        let pool = WorkerPool::new(2);
        let handle = pool.handle();
        let counter = Arc::new(AtomicUsize::new(0));

        let outer = Arc::clone(&counter);
        pool.submit(move || {
            outer.fetch_add(1, Ordering::SeqCst);
            let inner = Arc::clone(&outer);
            handle
                .submit(move || {
                    inner.fetch_add(10, Ordering::SeqCst);
                })
                .unwrap();
        })
        .unwrap();

        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_handle_after_shutdown() {
        let pool = WorkerPool::new(2);
        let handle = pool.handle();
        assert_eq!(handle.state(), PoolState::Running);

        pool.shutdown();
        assert_eq!(handle.state(), PoolState::Stopped);
        assert!(matches!(handle.submit(|| {}), Err(PrimkitError::PoolStopped)));
        assert_eq!(handle.pending_jobs(), 0);
    }

    #[test]
    fn test_panicking_job_does_not_wedge_pool() {
        let pool = WorkerPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(|| panic!("job failure")).unwrap();
        let c = Arc::clone(&counter);
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(pool.live_workers(), 1);
        assert_eq!(pool.busy_workers(), 0);
    }

    #[test]
    fn test_discard_on_shutdown_drops_queued_jobs() {
        let config = WorkerPoolConfig {
            discard_on_shutdown: true,
            ..WorkerPoolConfig::with_workers(1)
        };
        let pool = WorkerPool::with_config(&config).unwrap();
        let handle = pool.handle();
        let counter = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = std::sync::mpsc::channel();

        // Hold the only worker until shutdown has begun
        pool.submit(move || {
            started_tx.send(()).unwrap();
            while handle.state() == PoolState::Running {
                thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();
        started_rx.recv().unwrap();

        for _ in 0..5 {
            let c = Arc::clone(&counter);
            pool.submit(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert_eq!(pool.pending_jobs(), 5);

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_runs_queued_jobs() {
        let pool = WorkerPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(|| thread::sleep(Duration::from_millis(20))).unwrap();
        for _ in 0..10 {
            let c = Arc::clone(&counter);
            pool.submit(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_shutdown_immediately_after_submit() {
        for _ in 0..200 {
            let pool = WorkerPool::new(2);
            let done = Arc::new(AtomicUsize::new(0));

            let flag = Arc::clone(&done);
            pool.submit(move || {
                thread::sleep(Duration::from_millis(1));
                flag.store(1, Ordering::SeqCst);
            })
            .unwrap();
            pool.shutdown();

            assert_eq!(done.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_thread_names() {
        let config = WorkerPoolConfig {
            thread_name_prefix: "indexer".to_string(),
            ..WorkerPoolConfig::with_workers(1)
        };
        let pool = WorkerPool::with_config(&config).unwrap();
        let name = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&name);
        pool.submit(move || {
            *slot.lock() = thread::current().name().map(str::to_string);
        })
        .unwrap();
        pool.wait_idle();

        assert_eq!(name.lock().as_deref(), Some("indexer-0"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = WorkerPoolConfig::with_workers(0);
        assert!(matches!(
            WorkerPool::with_config(&config),
            Err(PrimkitError::Configuration { .. })
        ));
    }

    #[test]
    fn test_drop_shuts_down() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle;
        {
            let pool = WorkerPool::new(2);
            handle = pool.handle();
            let c = Arc::clone(&counter);
            pool.submit(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            pool.wait_idle();
        }
        assert_eq!(handle.state(), PoolState::Stopped);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_output() {
        let pool = WorkerPool::new(1);
        let debug = format!("{:?}", pool);
        assert!(debug.contains("WorkerPool"));
        assert!(debug.contains("Running"));
        assert!(format!("{:?}", pool.handle()).contains("PoolHandle"));
    }
}
