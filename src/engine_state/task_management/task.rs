//! # Work Handler Traits
//!
//! This module defines the hooks a [`WorkScheduler`](super::WorkScheduler) is
//! parameterized with.
//!
//! ## Core Components
//! - `WorkHandler`: Supplies the async work, the selection comparator and the
//!   main-thread drain for one scheduler
//! - `MainThreadQueue`: Buffer of work destined for the caller's own thread
//!
//! ## Work Lifecycle
//! 1. Async work is published via `WorkScheduler::add_work()`
//! 2. The worker picks the pending item ranked lowest by `compare_async_work()`
//! 3. `do_async_work()` runs on the worker thread and may push main-thread work
//! 4. The caller drains main-thread work with `WorkScheduler::process_main_thread_works()`
//!
//! ## Thread Safety
//! - The handler is shared between the caller and the worker, so it must be `Sync`
//! - Any state `do_async_work()` writes that the caller also touches must be synchronized

use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    sync::{Arc, Mutex, PoisonError},
};

/// The strategy a [`WorkScheduler`](super::WorkScheduler) runs.
///
/// # Implementation Guidelines
/// - `compare_async_work` is evaluated fresh on every selection, so it may read
///   live state such as a published player position
/// - `compare_async_work` runs while the pending set is locked; if it panics the
///   selection falls back to the oldest pending item
/// - `do_async_work` may fail or panic; the scheduler logs the failure and keeps running
pub trait WorkHandler: Send + Sync + 'static {
    /// Work buffered for the caller's thread.
    type MainThreadWork: Send + 'static;
    /// Work executed on the background worker.
    type AsyncWork: Debug + Send + 'static;
    /// Failure reported by `do_async_work`.
    type Error: Display + Send + 'static;

    /// One-time setup, called by `WorkScheduler::new` before any worker exists.
    fn initialize(&mut self) {}

    /// Executes one unit of async work on the worker thread.
    ///
    /// # Arguments
    /// * `work` - The selected item, already removed from the pending set
    /// * `main_thread` - Queue for follow-up work that must run on the caller's thread
    fn do_async_work(
        &self,
        work: Self::AsyncWork,
        main_thread: &MainThreadQueue<Self::MainThreadWork>,
    ) -> Result<(), Self::Error>;

    /// Orders two pending items. The smallest item is executed next.
    fn compare_async_work(&self, x: &Self::AsyncWork, y: &Self::AsyncWork) -> Ordering;

    /// Processes buffered main-thread work. Only ever called from
    /// `WorkScheduler::process_main_thread_works`, never by the worker.
    fn do_main_thread_works(&self, works: Vec<Self::MainThreadWork>);
}

/// A cloneable, thread-safe buffer of work for the caller's thread.
pub struct MainThreadQueue<M> {
    works: Arc<Mutex<Vec<M>>>,
}

impl<M> MainThreadQueue<M> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            works: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Buffers one item.
    pub fn push(&self, work: M) {
        self.works
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(work);
    }

    /// Takes every buffered item, in insertion order.
    pub fn drain(&self) -> Vec<M> {
        std::mem::take(&mut *self.works.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.works.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M> Clone for MainThreadQueue<M> {
    fn clone(&self) -> Self {
        Self {
            works: self.works.clone(),
        }
    }
}

impl<M> Default for MainThreadQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}
