//! Policy executor - lists stacks, runs filters, then runs actions

use anyhow::{Context, Result};
use cfnkit::{Client, Stack};
use serde::Serialize;

use super::context::{ConfirmCallback, ProgressCallback};
use crate::actions::ActionReport;
use crate::schema::Policy;

/// Options for running policies
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run filters only; report which actions would run
    pub dry_run: bool,
}

/// Report of one action over the matched stacks
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub action: String,
    #[serde(flatten)]
    pub report: ActionReport,
}

/// Result of running one policy
#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyOutcome {
    pub policy: String,
    pub matched: Vec<Stack>,
    pub actions: Vec<ActionOutcome>,
    /// Actions were not run (dry run or declined)
    pub skipped: bool,
}

impl PolicyOutcome {
    pub fn soft_errors(&self) -> usize {
        self.actions.iter().map(|a| a.report.soft_errors.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.soft_errors() == 0
    }
}

/// Run a single policy
///
/// Filter and action errors abort the policy. Per-stack soft errors are
/// collected in the returned outcome.
pub fn run_policy(
    client: &Client,
    policy: &Policy,
    opts: &RunOptions,
    progress: &mut dyn ProgressCallback,
    confirm: &mut dyn ConfirmCallback,
) -> Result<PolicyOutcome> {
    let mut outcome = PolicyOutcome {
        policy: policy.name.clone(),
        ..Default::default()
    };

    progress.on_stage("Listing stacks");
    let listed = client.describe_stacks(None);
    let mut stacks = match listed {
        Ok(stacks) => stacks,
        Err(e) => {
            progress.on_finish();
            return Err(e).context("Failed to list stacks");
        }
    };
    log::info!("{}: {} stacks listed", policy.name, stacks.len());

    for filter in &policy.filters {
        progress.on_stage(&format!("Filtering {} stacks ({})", stacks.len(), filter.name()));
        stacks = match filter.process(client, stacks) {
            Ok(kept) => kept,
            Err(e) => {
                progress.on_finish();
                return Err(e).with_context(|| {
                    format!("Policy '{}': filter '{}' failed", policy.name, filter.name())
                });
            }
        };
        log::debug!("{}: {} stacks after {}", policy.name, stacks.len(), filter.name());
    }
    progress.on_finish();
    outcome.matched = stacks;

    if outcome.matched.is_empty() || policy.actions.is_empty() {
        return Ok(outcome);
    }

    if opts.dry_run {
        log::info!(
            "{}: dry run, skipping {} actions",
            policy.name,
            policy.actions.len()
        );
        outcome.skipped = true;
        return Ok(outcome);
    }

    let prompt = format!(
        "Run {} on {} stacks for policy '{}'?",
        action_names(policy),
        outcome.matched.len(),
        policy.name
    );
    if !confirm.confirm(&prompt)? {
        outcome.skipped = true;
        return Ok(outcome);
    }

    for action in &policy.actions {
        log::info!(
            "{}: running {} on {} stacks",
            policy.name,
            action.name(),
            outcome.matched.len()
        );
        let report = action.process(client, &outcome.matched).with_context(|| {
            format!("Policy '{}': action '{}' failed", policy.name, action.name())
        })?;
        outcome.actions.push(ActionOutcome {
            action: action.name().to_string(),
            report,
        });
    }

    Ok(outcome)
}

fn action_names(policy: &Policy) -> String {
    policy
        .actions
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(", ")
}
