//! # Work Scheduler
//!
//! This module provides a single-worker scheduler that moves expensive,
//! latency-tolerant work off the caller's real-time loop.
//!
//! ## Architecture Overview
//!
//! - `WorkScheduler`: Owns the worker thread, the pending set and the main-thread queue
//! - `WorkHandler`: Strategy supplying execution, ranking and main-thread draining
//! - `MainThreadQueue`: Work pushed by the worker for the caller's thread
//!
//! ## Selection
//!
//! The pending set is unordered. Every time the worker becomes free it scans the
//! whole set, removes the item ranked lowest by `WorkHandler::compare_async_work`
//! (the first one encountered on ties) and executes it. Ranking keys such as the
//! distance to a moving player change continuously, so nothing is precomputed
//! at insertion time. The scan is O(n), which is cheap at the tens to low
//! hundreds of items this is used with.
//!
//! When the pending set is empty the worker blocks on a condition variable
//! until `add_work` or `shutdown` wakes it.
//!
//! ## Failures
//!
//! `do_async_work` returning `Err` or panicking is logged and counted; the
//! failed item is dropped and the worker moves on to the next selection.
//! A panicking comparator is logged too, and that selection falls back to the
//! oldest pending item.
//!
//! ## Shutdown
//!
//! `shutdown` (also run on drop) abandons pending work: it marks the scheduler
//! stopped, takes the pending items, lets an in-flight item run to completion,
//! joins the worker and hands the abandoned items back to the caller.
//!
//! ## Example Usage
//! ```rust
//! use std::cmp::Ordering;
//! use std::convert::Infallible;
//! use voxel_chunk_builder::engine_state::task_management::{
//!     task::{MainThreadQueue, WorkHandler},
//!     WorkScheduler,
//! };
//!
//! struct Doubler;
//!
//! impl WorkHandler for Doubler {
//!     type MainThreadWork = u32;
//!     type AsyncWork = u32;
//!     type Error = Infallible;
//!
//!     fn do_async_work(&self, work: u32, main_thread: &MainThreadQueue<u32>) -> Result<(), Infallible> {
//!         main_thread.push(work * 2);
//!         Ok(())
//!     }
//!
//!     fn compare_async_work(&self, x: &u32, y: &u32) -> Ordering {
//!         x.cmp(y)
//!     }
//!
//!     fn do_main_thread_works(&self, works: Vec<u32>) {
//!         println!("doubled: {works:?}");
//!     }
//! }
//!
//! let mut scheduler = WorkScheduler::new(Doubler, "doubler");
//! scheduler.add_work(21);
//! scheduler.start_worker_thread().unwrap();
//!
//! // In the main loop:
//! scheduler.process_main_thread_works();
//!
//! scheduler.shutdown();
//! ```

pub mod task;

use std::{
    any::Any,
    cmp::Ordering,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use log::{debug, error, info, warn};
use task::{MainThreadQueue, WorkHandler};

use crate::error::SchedulerError;

/// Pending work plus the stop flag, guarded together so the worker can never
/// pick an item after shutdown has claimed the set.
struct PendingWorks<A> {
    works: Vec<A>,
    shut_down: bool,
}

/// State shared between the scheduler handle and its worker thread.
struct SchedulerShared<H: WorkHandler> {
    handler: H,
    pending: Mutex<PendingWorks<H::AsyncWork>>,
    work_available: Condvar,
    main_thread: MainThreadQueue<H::MainThreadWork>,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Runs one background worker that executes one unit of async work at a time,
/// always picking the currently best-ranked pending item.
///
/// # Thread Safety
/// - `add_work`, `add_main_thread_work` and the counters may be called from any thread
/// - `process_main_thread_works` must be called from the caller's own thread
pub struct WorkScheduler<H: WorkHandler> {
    shared: Arc<SchedulerShared<H>>,
    worker: Option<JoinHandle<()>>,
    thread_name: String,
}

impl<H: WorkHandler> WorkScheduler<H> {
    /// Creates a scheduler and runs the handler's `initialize` hook.
    ///
    /// No thread is spawned until [`start_worker_thread`](Self::start_worker_thread).
    ///
    /// # Arguments
    /// * `handler` - The strategy to run
    /// * `thread_name` - Name given to the worker thread
    pub fn new(mut handler: H, thread_name: impl Into<String>) -> Self {
        handler.initialize();

        WorkScheduler {
            shared: Arc::new(SchedulerShared {
                handler,
                pending: Mutex::new(PendingWorks {
                    works: Vec::new(),
                    shut_down: false,
                }),
                work_available: Condvar::new(),
                main_thread: MainThreadQueue::new(),
                completed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
            }),
            worker: None,
            thread_name: thread_name.into(),
        }
    }

    /// Spawns the background worker.
    ///
    /// Calling this on a running scheduler is a logged no-op. Work added
    /// before the worker starts is kept and processed once it runs.
    ///
    /// # Errors
    /// - `SchedulerError::ShutDown` if the scheduler was shut down
    /// - `SchedulerError::Spawn` if the thread could not be created
    pub fn start_worker_thread(&mut self) -> Result<(), SchedulerError> {
        if self.is_shut_down() {
            return Err(SchedulerError::ShutDown);
        }

        if self.worker.is_some() {
            warn!("Worker thread '{}' is already running", self.thread_name);
            return Ok(());
        }

        let shared = self.shared.clone();
        let worker = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || worker_loop(shared))?;

        info!("Started worker thread '{}'", self.thread_name);
        self.worker = Some(worker);
        Ok(())
    }

    /// Adds one unit of async work to the pending set and wakes the worker.
    ///
    /// Identical items are not merged; each call adds an independent entry.
    ///
    /// # Returns
    /// `false` if the scheduler has been shut down and the item was dropped.
    pub fn add_work(&self, work: H::AsyncWork) -> bool {
        let mut pending = self.shared.lock_pending();
        if pending.shut_down {
            warn!(
                "Dropping work {:?} added to shut down scheduler '{}'",
                work, self.thread_name
            );
            return false;
        }

        pending.works.push(work);
        drop(pending);

        self.shared.work_available.notify_one();
        true
    }

    /// Buffers work for the caller's thread.
    pub fn add_main_thread_work(&self, work: H::MainThreadWork) {
        self.shared.main_thread.push(work);
    }

    /// Drains buffered main-thread work and hands it to the handler.
    ///
    /// The handler is not invoked when nothing is buffered.
    ///
    /// # Returns
    /// The number of items processed.
    pub fn process_main_thread_works(&self) -> usize {
        let works = self.shared.main_thread.drain();
        let count = works.len();
        if count > 0 {
            self.shared.handler.do_main_thread_works(works);
        }
        count
    }

    /// Stops the worker and abandons pending work.
    ///
    /// An item already being executed runs to completion before the worker
    /// exits. Calling this again returns an empty list.
    ///
    /// # Returns
    /// The pending items that were never started, in insertion order.
    pub fn shutdown(&mut self) -> Vec<H::AsyncWork> {
        let abandoned = {
            let mut pending = self.shared.lock_pending();
            pending.shut_down = true;
            std::mem::take(&mut pending.works)
        };
        self.shared.work_available.notify_all();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Worker thread '{}' terminated abnormally", self.thread_name);
            }
            info!(
                "Stopped worker thread '{}', abandoned {} pending work item(s)",
                self.thread_name,
                abandoned.len()
            );
        }

        abandoned
    }

    /// The handler this scheduler runs.
    pub fn handler(&self) -> &H {
        &self.shared.handler
    }

    /// Number of items waiting to be selected.
    pub fn pending_count(&self) -> usize {
        self.shared.lock_pending().works.len()
    }

    /// Number of items that completed successfully.
    pub fn completed_count(&self) -> usize {
        self.shared.completed.load(AtomicOrdering::Acquire)
    }

    /// Number of items that failed or panicked.
    pub fn failed_count(&self) -> usize {
        self.shared.failed.load(AtomicOrdering::Acquire)
    }

    /// Whether the worker thread has been started, has not been shut down
    /// and is still alive.
    pub fn is_running(&self) -> bool {
        let alive = self
            .worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished());
        alive && !self.is_shut_down()
    }

    /// Whether `shutdown` has been called. A shut down scheduler never runs again.
    pub fn is_shut_down(&self) -> bool {
        self.shared.lock_pending().shut_down
    }
}

impl<H: WorkHandler> Drop for WorkScheduler<H> {
    fn drop(&mut self) {
        let abandoned = self.shutdown();
        if !abandoned.is_empty() {
            debug!(
                "Dropped scheduler '{}' with {} pending work item(s)",
                self.thread_name,
                abandoned.len()
            );
        }
    }
}

impl<H: WorkHandler> SchedulerShared<H> {
    fn lock_pending(&self) -> MutexGuard<'_, PendingWorks<H::AsyncWork>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until work is available and removes the best-ranked item.
    ///
    /// Returns `None` once the scheduler is shut down.
    fn next_work(&self) -> Option<H::AsyncWork> {
        let mut pending = self.lock_pending();
        loop {
            if pending.shut_down {
                return None;
            }

            let ranked = panic::catch_unwind(AssertUnwindSafe(|| {
                take_best(&mut pending.works, |x, y| {
                    self.handler.compare_async_work(x, y)
                })
            }));
            let selected = match ranked {
                Ok(work) => work,
                Err(payload) => {
                    error!(
                        "Ranking pending work panicked, taking the oldest item instead: {}",
                        panic_message(payload.as_ref())
                    );
                    (!pending.works.is_empty()).then(|| pending.works.remove(0))
                }
            };
            if let Some(work) = selected {
                return Some(work);
            }

            pending = self
                .work_available
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn run(&self, work: H::AsyncWork) {
        let label = log::log_enabled!(log::Level::Error).then(|| format!("{work:?}"));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.handler.do_async_work(work, &self.main_thread)
        }));

        match outcome {
            Ok(Ok(())) => {
                self.completed.fetch_add(1, AtomicOrdering::AcqRel);
            }
            Ok(Err(err)) => {
                self.failed.fetch_add(1, AtomicOrdering::AcqRel);
                error!(
                    "Async work {} failed and was dropped: {}",
                    label.unwrap_or_default(),
                    err
                );
            }
            Err(payload) => {
                self.failed.fetch_add(1, AtomicOrdering::AcqRel);
                error!(
                    "Async work {} panicked and was dropped: {}",
                    label.unwrap_or_default(),
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

fn worker_loop<H: WorkHandler>(shared: Arc<SchedulerShared<H>>) {
    debug!("Worker loop entered");
    while let Some(work) = shared.next_work() {
        shared.run(work);
    }
    debug!("Worker loop exited");
}

/// Removes and returns the element ranked lowest by `compare`.
///
/// On ties the first encountered element wins. The relative order of the
/// remaining elements is preserved.
pub(crate) fn take_best<T>(
    works: &mut Vec<T>,
    compare: impl Fn(&T, &T) -> Ordering,
) -> Option<T> {
    let mut best = 0;
    for (i, work) in works.iter().enumerate().skip(1) {
        if compare(work, &works[best]) == Ordering::Less {
            best = i;
        }
    }

    if works.is_empty() {
        None
    } else {
        Some(works.remove(best))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
