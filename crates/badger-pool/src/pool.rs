//! Worker threads fed by a crossbeam channel.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::error::PoolError;

/// A unit of work run on a pool thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs tasks in the background.
pub trait Executor {
    /// Queue `task` for execution.
    fn schedule(&self, task: Task) -> Result<(), PoolError>;

    /// Stop accepting tasks, run everything already queued, and wait for
    /// the workers to exit. Idempotent.
    fn shutdown(&mut self);
}

/// A fixed set of worker threads sharing one task queue.
///
/// Tasks run in queue order per worker; across workers there is no
/// ordering. A panicking task is logged and does not take its worker
/// down. Dropping the pool shuts it down.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use badger_pool::{Executor, ThreadPool};
///
/// let mut pool = ThreadPool::new(2).unwrap();
/// let hits = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let hits = Arc::clone(&hits);
///     pool.execute(move || {
///         hits.fetch_add(1, Ordering::Relaxed);
///     })
///     .unwrap();
/// }
/// pool.shutdown();
/// assert_eq!(hits.load(Ordering::Relaxed), 10);
/// ```
pub struct ThreadPool {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Start `threads` workers over an unbounded queue.
    pub fn new(threads: usize) -> Result<Self, PoolError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self::start(threads, tx, rx)
    }

    /// Start `threads` workers over a queue holding at most `capacity`
    /// pending tasks. [`schedule`](Executor::schedule) blocks while the
    /// queue is full.
    pub fn bounded(threads: usize, capacity: usize) -> Result<Self, PoolError> {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self::start(threads, tx, rx)
    }

    fn start(threads: usize, tx: Sender<Task>, rx: Receiver<Task>) -> Result<Self, PoolError> {
        if threads == 0 {
            return Err(PoolError::InvalidThreadCount);
        }
        let mut pool = Self {
            sender: Some(tx),
            workers: Vec::with_capacity(threads),
        };
        for i in 0..threads {
            let rx = rx.clone();
            let spawned = thread::Builder::new()
                .name(format!("badger-pool-{i}"))
                .spawn(move || worker_loop(i, rx));
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    // Dropping `pool` joins the workers started so far.
                    return Err(PoolError::Spawn {
                        reason: e.to_string(),
                    });
                }
            }
        }
        debug!(threads, "thread pool started");
        Ok(pool)
    }

    /// Queue a closure for execution.
    pub fn execute<F>(&self, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(Box::new(f))
    }

    /// Number of worker threads still attached to the pool.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Whether [`shutdown`](Executor::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.sender.is_none()
    }
}

impl Executor for ThreadPool {
    fn schedule(&self, task: Task) -> Result<(), PoolError> {
        let sender = self.sender.as_ref().ok_or(PoolError::ShutDown)?;
        sender.send(task).map_err(|_| PoolError::ShutDown)
    }

    fn shutdown(&mut self) {
        // Closing the channel lets workers drain what is queued, then exit.
        if self.sender.take().is_none() {
            return;
        }
        let threads = self.workers.len();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("pool worker exited abnormally");
            }
        }
        debug!(threads, "thread pool shut down");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("threads", &self.workers.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

fn worker_loop(worker: usize, rx: Receiver<Task>) {
    while let Ok(task) = rx.recv() {
        trace!(worker, "running task");
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            warn!(worker, "task panicked");
        }
    }
    // Channel closed and drained.
}
