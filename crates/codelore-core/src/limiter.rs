//! Bounded concurrency admission for expensive asynchronous work.
//!
//! A [`Limiter`] admits at most `max_concurrent` tasks at once. It wraps a
//! fair `tokio::sync::Semaphore`: a submission asks for a permit when its
//! future is first polled, and waiters are admitted strictly in that order.
//! Driving submissions in call order (`join_all`, or awaiting one by one)
//! makes admission order equal submission order.
//!
//! ## Usage
//!
//! ```ignore
//! use codelore_core::limiter::Limiter;
//!
//! let limiter = Limiter::new(4);
//! let results = futures::future::join_all(
//!     paths.iter().map(|p| limiter.run(move || tokio::fs::read_to_string(p))),
//! )
//! .await;
//! ```
//!
//! The permit is held by the submission's own future, so it is returned when
//! the task completes, fails, panics (including inside the closure that
//! builds the task future), or when the future is dropped.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{trace, warn};

/// Admission limiter bounding concurrently running tasks.
///
/// Cloning is cheap; clones share one semaphore.
#[derive(Debug, Clone)]
pub struct Limiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl Limiter {
    /// Create a limiter admitting at most `max_concurrent` tasks at once.
    ///
    /// A limit of zero would never admit anything and is raised to one.
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = if max_concurrent == 0 {
            warn!("Limiter created with max_concurrent = 0, using 1");
            1
        } else {
            max_concurrent
        };

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Maximum number of concurrently admitted tasks
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of tasks currently holding a permit
    pub fn active(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Submit a task, returning a future that resolves to the task's own output.
    ///
    /// `task` is invoked only once a permit is held, and the permit is held
    /// until the future it returns completes. Failures, including panics, stay
    /// with this submission: the permit goes back and queued tasks keep flowing.
    pub fn run<F, Fut, T>(&self, task: F) -> impl Future<Output = T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let semaphore = Arc::clone(&self.semaphore);

        async move {
            // The semaphore is never closed, so acquisition only waits
            let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
            trace!("Admitted task ({} permits left)", semaphore.available_permits());
            let output = task().await;
            drop(permit);
            output
        }
    }
}
