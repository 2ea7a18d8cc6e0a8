//! Callbacks the executor uses to interact with the user

use anyhow::Result;

/// Progress callback for long-running stages
pub trait ProgressCallback {
    /// A stage started (e.g. listing stacks, running a filter)
    fn on_stage(&mut self, message: &str);

    /// All stages of a policy finished
    fn on_finish(&mut self);
}

/// Confirmation callback, asked before any action mutates remote state
pub trait ConfirmCallback {
    /// `true` if the user confirmed
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_stage(&mut self, _message: &str) {}
    fn on_finish(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Interactive confirmation on the terminal
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}
