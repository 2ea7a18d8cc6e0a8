use anyhow::{Context as _, Result};
use cfnkit::{Client, ClientConfig, RetryConfig};
use colored::Colorize;

use crate::Context;
use crate::cli::{OutputFormat, RunArgs};
use crate::engine::{
    self, AutoConfirm, ConfirmCallback, NoProgress, PolicyOutcome, ProgressCallback, PromptConfirm,
    RunOptions,
};
use crate::paths;
use crate::progress::SpinnerProgress;
use crate::schema::{PolicyFile, Settings};
use crate::ui;

pub fn run(ctx: &Context, args: RunArgs) -> Result<()> {
    let path = paths::policy_path(args.policy.as_deref())?;
    let file = PolicyFile::load(&path)?;
    let policies = file.select(&args.names)?;

    if policies.is_empty() {
        ui::warn(&format!("No policies in {}", path.display()));
        return Ok(());
    }

    let config = client_config(&file.settings, args.region, args.profile);
    let client = Client::new(&config).map_err(|e| {
        let category = e.category();
        anyhow::anyhow!("{e}\n  {}", category.advice())
    })?;

    let json = args.output == OutputFormat::Json;
    let opts = RunOptions {
        dry_run: args.dry_run,
    };
    let mut confirm: Box<dyn ConfirmCallback> = if args.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };

    let mut outcomes = Vec::with_capacity(policies.len());
    for policy in &policies {
        let mut progress: Box<dyn ProgressCallback> = if ctx.quiet || json {
            Box::new(NoProgress)
        } else {
            Box::new(SpinnerProgress::default())
        };
        let outcome = engine::run_policy(
            &client,
            policy,
            &opts,
            progress.as_mut(),
            confirm.as_mut(),
        )?;
        if !json {
            print_outcome(ctx, &outcome);
        }
        outcomes.push(outcome);
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcomes).context("Failed to serialize results")?
        );
    }

    let soft_errors: usize = outcomes.iter().map(PolicyOutcome::soft_errors).sum();
    if soft_errors > 0 {
        anyhow::bail!("{soft_errors} stacks could not be processed");
    }
    Ok(())
}

/// Merge command-line overrides into the policy file settings
pub fn client_config(
    settings: &Settings,
    region: Option<String>,
    profile: Option<String>,
) -> ClientConfig {
    let mut retry = RetryConfig::default();
    if let Some(attempts) = settings.retry_attempts {
        retry.max_attempts = attempts.max(1);
    }
    ClientConfig {
        region: region.or_else(|| settings.region.clone()),
        profile: profile.or_else(|| settings.profile.clone()),
        retry,
    }
}

fn print_outcome(ctx: &Context, outcome: &PolicyOutcome) {
    ui::header(&format!("Policy: {}", outcome.policy));

    if outcome.matched.is_empty() {
        ui::dim("No stacks matched");
        return;
    }

    ui::section(&format!("Matched {} stacks", outcome.matched.len()));
    for stack in &outcome.matched {
        println!(
            "  {:<40} {}",
            ui::truncate(&stack.stack_name, 40),
            ui::status(stack.stack_status.as_str())
        );
        if ctx.verbose > 0 {
            ui::kv("id", &stack.stack_id);
            if let Some(topics) = &stack.annotations.topics {
                ui::kv("topics", &topics.len().to_string());
            }
        }
    }

    if outcome.skipped {
        println!();
        ui::info("Actions skipped - no changes made");
        return;
    }

    for action in &outcome.actions {
        ui::section(&format!("Action: {}", action.action));
        for name in &action.report.succeeded {
            println!("  {} {}", "✓".green(), name);
        }
        for soft in &action.report.soft_errors {
            println!("  {} {}", "✗".red(), soft);
        }
    }

    println!();
    if outcome.is_success() {
        ui::success(&format!("Policy '{}' completed", outcome.policy));
    } else {
        ui::warn(&format!(
            "Policy '{}' completed with {} errors",
            outcome.policy,
            outcome.soft_errors()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            region: Some("us-east-1".into()),
            profile: Some("ops".into()),
            retry_attempts: Some(2),
        };

        let config = client_config(&settings, Some("eu-west-1".into()), None);

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.profile.as_deref(), Some("ops"));
        assert_eq!(config.retry.max_attempts, 2);
    }

    #[test]
    fn test_default_retry() {
        let config = client_config(&Settings::default(), None, None);

        assert_eq!(config.retry, RetryConfig::default());
        assert!(config.region.is_none());
    }
}
