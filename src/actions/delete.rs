//! Delete action
//!
//! Stacks blocked by termination protection either have the flag cleared
//! and the delete retried (`force = true`) or are reported and skipped.
//! Any other failure stops the batch.

use super::{Action, ActionReport, MAX_WORKERS};
use anyhow::{Context, Result};
use cfnkit::{Client, Stack};
use serde::{Deserialize, Serialize};
use workpool::{Pool, SoftError};

pub const PERMISSIONS: &[&str] = &["cloudformation:DeleteStack", "cloudformation:UpdateStack"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteConfig {
    /// Clear termination protection before deleting
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Deleted,
    Skipped(SoftError),
}

#[derive(Debug, Clone)]
pub struct DeleteAction {
    force: bool,
}

impl DeleteAction {
    pub fn new(config: &DeleteConfig) -> Self {
        Self {
            force: config.force,
        }
    }

    fn process_stack(&self, client: &Client, stack: &Stack) -> Result<Outcome> {
        let name = stack.stack_name.as_str();

        let err = match client.delete_stack(name) {
            Ok(()) => return Ok(Outcome::Deleted),
            Err(e) if e.is_termination_protected() => e,
            Err(e) => return Err(e).with_context(|| format!("Failed to delete stack {name}")),
        };

        if !self.force {
            let message = err.api_message().unwrap_or_default();
            log::error!("Error deleting stack:{} error:{}", name, message);
            return Ok(Outcome::Skipped(SoftError::new(name, message)));
        }

        log::info!("Disabling termination protection on {}", name);
        client
            .update_termination_protection(name, false)
            .with_context(|| format!("Failed to disable termination protection on {name}"))?;
        client
            .delete_stack(name)
            .with_context(|| format!("Failed to delete stack {name}"))?;
        Ok(Outcome::Deleted)
    }
}

impl Action for DeleteAction {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn process(&self, client: &Client, stacks: &[Stack]) -> Result<ActionReport> {
        let pool = Pool::new(MAX_WORKERS)?;
        let outcomes = pool.run_fail_fast(stacks, |stack| self.process_stack(client, stack))?;

        let mut report = ActionReport::default();
        for (stack, outcome) in stacks.iter().zip(outcomes) {
            match outcome {
                Outcome::Deleted => report.add_success(&stack.stack_name),
                Outcome::Skipped(soft) => report.add_soft_error(soft),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfnkit::backend::memory::{Call, MemoryBackend, Operation};
    use cfnkit::{Error, RetryConfig, StackStatus};
    use std::sync::Arc;

    fn protected(name: &str) -> Stack {
        Stack::new(format!("id-{name}"), name, StackStatus::RollbackComplete)
            .with_termination_protection(true)
    }

    fn unprotected(name: &str) -> Stack {
        Stack::new(format!("id-{name}"), name, StackStatus::RollbackComplete)
    }

    fn setup(stacks: &[Stack]) -> (Arc<MemoryBackend>, Client) {
        let backend = Arc::new(
            stacks
                .iter()
                .cloned()
                .fold(MemoryBackend::new(), MemoryBackend::with_stack),
        );
        let client = Client::with_backend(Box::new(Arc::clone(&backend)), RetryConfig::no_retry());
        (backend, client)
    }

    #[test]
    fn test_protected_without_force_is_soft_error() {
        let stacks = vec![protected("web")];
        let (backend, client) = setup(&stacks);

        let report = DeleteAction::new(&DeleteConfig { force: false })
            .process(&client, &stacks)
            .unwrap();

        assert_eq!(report.soft_errors.len(), 1);
        assert_eq!(report.soft_errors[0].item, "web");
        assert!(
            report.soft_errors[0]
                .message
                .contains("cannot be deleted while TerminationProtection is enabled")
        );
        assert_eq!(backend.calls_for("web"), vec![Call::DeleteStack("web".into())]);
        assert_eq!(backend.stack_names(), vec!["web"]);
    }

    #[test]
    fn test_protected_with_force_disables_then_deletes() {
        let stacks = vec![protected("web")];
        let (backend, client) = setup(&stacks);

        let report = DeleteAction::new(&DeleteConfig { force: true })
            .process(&client, &stacks)
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(
            backend.calls_for("web"),
            vec![
                Call::DeleteStack("web".into()),
                Call::UpdateTerminationProtection {
                    stack_name: "web".into(),
                    enabled: false,
                },
                Call::DeleteStack("web".into()),
            ]
        );
        assert!(backend.stack_names().is_empty());
    }

    #[test]
    fn test_force_with_mixed_batch() {
        let stacks = vec![protected("StackA"), unprotected("StackB")];
        let (backend, client) = setup(&stacks);

        let report = DeleteAction::new(&DeleteConfig { force: true })
            .process(&client, &stacks)
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.succeeded, vec!["StackA", "StackB"]);
        assert!(backend.stack_names().is_empty());
        assert_eq!(backend.calls_for("StackB"), vec![Call::DeleteStack("StackB".into())]);
        let protection_calls = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::UpdateTerminationProtection { .. }))
            .count();
        assert_eq!(protection_calls, 1);
    }

    #[test]
    fn test_soft_errors_do_not_stop_siblings() {
        let stacks = vec![protected("a"), unprotected("b"), protected("c"), unprotected("d")];
        let (backend, client) = setup(&stacks);

        let report = DeleteAction::new(&DeleteConfig::default())
            .process(&client, &stacks)
            .unwrap();

        assert_eq!(report.succeeded, vec!["b", "d"]);
        let skipped: Vec<_> = report.soft_errors.iter().map(|e| e.item.as_str()).collect();
        assert_eq!(skipped, vec!["a", "c"]);
        assert_eq!(backend.stack_names(), vec!["a", "c"]);
    }

    #[test]
    fn test_other_errors_are_fatal() {
        let stacks = vec![unprotected("web")];
        let (backend, client) = setup(&stacks);
        backend.fail_next(
            Operation::DeleteStack,
            "web",
            Error::api("AccessDenied", "User is not authorized"),
        );

        let err = DeleteAction::new(&DeleteConfig { force: true })
            .process(&client, &stacks)
            .unwrap_err();

        let cause = err.downcast_ref::<Error>().unwrap();
        assert_eq!(cause.code(), Some("AccessDenied"));
        assert!(backend.calls().iter().all(|c| !matches!(c, Call::UpdateTerminationProtection { .. })));
    }

    #[test]
    fn test_validation_error_with_other_message_is_fatal() {
        let stacks = vec![unprotected("web")];
        let (backend, client) = setup(&stacks);
        backend.fail_next(
            Operation::DeleteStack,
            "web",
            Error::api("ValidationError", "Stack is in DELETE_IN_PROGRESS state"),
        );

        let result = DeleteAction::new(&DeleteConfig::default()).process(&client, &stacks);

        assert!(result.is_err());
    }

    #[test]
    fn test_failure_on_forced_path_is_fatal() {
        let stacks = vec![protected("web")];
        let (backend, client) = setup(&stacks);
        backend.fail_next(
            Operation::UpdateTerminationProtection,
            "web",
            Error::api("AccessDenied", "not allowed"),
        );

        let err = DeleteAction::new(&DeleteConfig { force: true })
            .process(&client, &stacks)
            .unwrap_err();

        assert!(err.to_string().contains("termination protection"));
        assert_eq!(backend.stack_names(), vec!["web"]);
        assert_eq!(backend.calls_for("web").len(), 2);
    }
}
