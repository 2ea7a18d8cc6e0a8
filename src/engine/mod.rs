//! Execution engine for stackward
//!
//! The engine runs one policy at a time:
//! 1. Listing - Enumerate every stack in the region
//! 2. Filtering - Narrow the batch through each filter in order
//! 3. Acting - Confirm, then run each action over the matched stacks

pub mod context;
pub mod executor;

pub use context::{AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback, PromptConfirm};
pub use executor::{PolicyOutcome, RunOptions, run_policy};
