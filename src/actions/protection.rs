//! Set-protection action

use super::{Action, ActionReport, MAX_WORKERS};
use anyhow::Result;
use cfnkit::{Client, Stack};
use serde::{Deserialize, Serialize};
use workpool::{Pool, SoftError};

pub const PERMISSIONS: &[&str] = &["cloudformation:UpdateStack"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtectionConfig {
    /// Desired termination protection state
    #[serde(default)]
    pub state: bool,
}

/// Sets termination protection on every stack. A failure on one stack is
/// logged and reported without affecting the others.
#[derive(Debug, Clone)]
pub struct ProtectionAction {
    state: bool,
}

impl ProtectionAction {
    pub fn new(config: &ProtectionConfig) -> Self {
        Self {
            state: config.state,
        }
    }
}

impl Action for ProtectionAction {
    fn name(&self) -> &'static str {
        "set-protection"
    }

    fn process(&self, client: &Client, stacks: &[Stack]) -> Result<ActionReport> {
        let pool = Pool::new(MAX_WORKERS)?;
        let results = pool.run_all(stacks, |stack| {
            client
                .update_termination_protection(&stack.stack_name, self.state)
                .map_err(|e| {
                    log::error!(
                        "Error updating protection stack:{} error:{}",
                        stack.stack_name,
                        e
                    );
                    SoftError::new(&stack.stack_name, e.to_string())
                })
        });

        let mut report = ActionReport::default();
        for (stack, result) in stacks.iter().zip(results) {
            match result {
                Ok(()) => report.add_success(&stack.stack_name),
                Err(soft) => report.add_soft_error(soft),
            }
        }
        Ok(report)
    }
}
