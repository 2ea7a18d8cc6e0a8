//! # Workpool
//!
//! A bounded worker pool for batches of independent remote calls.
//!
//! Two execution modes are provided:
//!
//! - [`Pool::run_all`]: every item runs to completion and yields its own
//!   `Result`. One item's failure never affects its siblings.
//! - [`Pool::run_fail_fast`]: the first error stops scheduling of items that
//!   have not started yet and is returned to the caller. Items already in
//!   flight are awaited before the call returns, so no worker outlives the
//!   batch.
//!
//! Per-item failures that should be reported but not abort the batch are
//! collected in a [`BatchReport`] as [`SoftError`]s.
//!
//! ## Example
//!
//! ```
//! use workpool::Pool;
//!
//! let pool = Pool::new(3).unwrap();
//! let results = pool.run_all(&[1, 2, 3], |n| if *n == 2 { Err("two") } else { Ok(n * 10) });
//! assert_eq!(results, vec![Ok(10), Err("two"), Ok(30)]);
//!
//! let first_error = pool.run_fail_fast(&[1, 2, 3], |n| if *n == 2 { Err("two") } else { Ok(()) });
//! assert_eq!(first_error, Err("two"));
//! ```

pub mod report;

pub use report::{BatchReport, SoftError};

use rayon::prelude::*;
use thiserror::Error;

/// Errors raised while setting up a pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A pool needs at least one worker
    #[error("worker count must be at least 1")]
    NoWorkers,

    /// The underlying thread pool could not be created
    #[error("failed to create thread pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// A fixed-size pool of worker threads.
pub struct Pool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl Pool {
    /// Create a pool with `workers` threads.
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        if workers == 0 {
            return Err(PoolError::NoWorkers);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("workpool-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// Run `f` over every item and collect each outcome, in input order.
    pub fn run_all<T, R, E, F>(&self, items: &[T], f: F) -> Vec<Result<R, E>>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync + Send,
    {
        if items.len() <= 1 || self.workers == 1 {
            return items.iter().map(&f).collect();
        }
        self.pool
            .install(|| items.par_iter().map(|item| f(item)).collect())
    }

    /// Run `f` over every item, stopping at the first error.
    ///
    /// Items not yet started when an error occurs are skipped. When several
    /// items fail concurrently, which error is returned is unspecified.
    pub fn run_fail_fast<T, R, E, F>(&self, items: &[T], f: F) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync + Send,
    {
        if items.len() <= 1 || self.workers == 1 {
            return items.iter().map(&f).collect();
        }
        self.pool
            .install(|| items.par_iter().map(|item| f(item)).collect())
    }
}
