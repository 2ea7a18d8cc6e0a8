//! Stack actions
//!
//! An action mutates remote state for every stack of a batch. Failures that
//! only concern one stack are recorded in the returned report; anything else
//! aborts the batch with an error.

pub mod delete;
pub mod protection;
pub mod tag;

use anyhow::Result;
use cfnkit::{Client, Stack};
use workpool::BatchReport;

/// Bound on concurrent remote calls made by one action
pub const MAX_WORKERS: usize = 3;

/// Outcome of running an action over a batch
pub type ActionReport = BatchReport;

pub trait Action: Send + Sync {
    /// Registry name of this action
    fn name(&self) -> &'static str;

    fn process(&self, client: &Client, stacks: &[Stack]) -> Result<ActionReport>;
}
