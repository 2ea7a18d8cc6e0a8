//! In-memory backend that records every call.
//!
//! Behaves like the remote API closely enough for the action and filter
//! tests: termination protection blocks deletes, bulk describes omit the
//! protection flag, and failures can be scripted per operation and target.

use crate::backend::Backend;
use crate::error::{Error, Result, TERMINATION_PROTECTED_MESSAGE, VALIDATION_ERROR};
use crate::types::{GetTemplateRequest, Stack, Topic, UpdateStackRequest};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Remote operations, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// describe-stacks
    DescribeStacks,
    /// delete-stack
    DeleteStack,
    /// update-termination-protection
    UpdateTerminationProtection,
    /// update-stack
    UpdateStack,
    /// get-template
    GetTemplate,
    /// list-topics
    ListTopics,
    /// get-topic-attributes
    GetTopicAttributes,
}

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// describe-stacks, optionally for one stack
    DescribeStacks(Option<String>),
    /// delete-stack
    DeleteStack(String),
    /// update-termination-protection
    UpdateTerminationProtection {
        /// Target stack
        stack_name: String,
        /// Requested flag state
        enabled: bool,
    },
    /// update-stack
    UpdateStack(UpdateStackRequest),
    /// get-template
    GetTemplate(GetTemplateRequest),
    /// list-topics
    ListTopics,
    /// get-topic-attributes
    GetTopicAttributes(String),
}

impl Call {
    /// The stack or topic this call targeted, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Call::DescribeStacks(name) => name.as_deref(),
            Call::DeleteStack(name) => Some(name),
            Call::UpdateTerminationProtection { stack_name, .. } => Some(stack_name),
            Call::UpdateStack(request) => Some(&request.stack_name),
            Call::GetTemplate(request) => Some(&request.stack_name),
            Call::ListTopics => None,
            Call::GetTopicAttributes(arn) => Some(arn),
        }
    }
}

#[derive(Default)]
struct State {
    stacks: Vec<Stack>,
    templates: HashMap<String, Value>,
    topics: BTreeMap<String, Topic>,
    failures: HashMap<(Operation, String), VecDeque<Error>>,
    calls: Vec<Call>,
}

impl State {
    fn find_stack(&self, name_or_id: &str) -> Option<usize> {
        self.stacks
            .iter()
            .position(|s| s.stack_name == name_or_id || s.stack_id == name_or_id)
    }

    fn take_failure(&mut self, operation: Operation, target: &str) -> Option<Error> {
        let queue = self.failures.get_mut(&(operation, target.to_string()))?;
        queue.pop_front()
    }
}

fn missing_stack(name: &str) -> Error {
    Error::api(VALIDATION_ERROR, format!("Stack with id {name} does not exist"))
}

/// In-memory backend with call recording and scripted failures.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a stack.
    pub fn with_stack(self, stack: Stack) -> Self {
        self.state().stacks.push(stack);
        self
    }

    /// Store the template body of a stack, keyed by stack id.
    pub fn with_template(self, stack_id: impl Into<String>, body: Value) -> Self {
        self.state().templates.insert(stack_id.into(), body);
        self
    }

    /// Add a topic.
    pub fn with_topic(self, topic: Topic) -> Self {
        self.state()
            .topics
            .insert(topic.topic_arn.clone(), topic);
        self
    }

    /// Make the next call of `operation` against `target` fail with `error`.
    ///
    /// Multiple failures for the same pair are returned in order.
    pub fn fail_next(&self, operation: Operation, target: impl Into<String>, error: Error) {
        self.state()
            .failures
            .entry((operation, target.into()))
            .or_default()
            .push_back(error);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls made against a single stack or topic, in order.
    pub fn calls_for(&self, target: &str) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.target() == Some(target))
            .cloned()
            .collect()
    }

    /// Names of the stacks that still exist.
    pub fn stack_names(&self) -> Vec<String> {
        self.state()
            .stacks
            .iter()
            .map(|s| s.stack_name.clone())
            .collect()
    }

    /// Current state of one stack, as a single-stack describe would report it.
    pub fn stack(&self, name: &str) -> Option<Stack> {
        let state = self.state();
        state.find_stack(name).map(|i| state.stacks[i].clone())
    }
}

impl Backend for MemoryBackend {
    fn describe_stacks(&self, stack_name: Option<&str>) -> Result<Vec<Stack>> {
        let mut state = self.state();
        state
            .calls
            .push(Call::DescribeStacks(stack_name.map(String::from)));
        if let Some(err) = state.take_failure(Operation::DescribeStacks, stack_name.unwrap_or("")) {
            return Err(err);
        }

        match stack_name {
            Some(name) => {
                let index = state.find_stack(name).ok_or_else(|| missing_stack(name))?;
                let mut stack = state.stacks[index].clone();
                if stack.enable_termination_protection.is_none() {
                    stack.enable_termination_protection = Some(false);
                }
                Ok(vec![stack])
            }
            None => Ok(state
                .stacks
                .iter()
                .cloned()
                .map(|mut s| {
                    s.enable_termination_protection = None;
                    s
                })
                .collect()),
        }
    }

    fn delete_stack(&self, stack_name: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::DeleteStack(stack_name.to_string()));
        if let Some(err) = state.take_failure(Operation::DeleteStack, stack_name) {
            return Err(err);
        }

        // Deleting a stack that does not exist succeeds, as the API does.
        let Some(index) = state.find_stack(stack_name) else {
            return Ok(());
        };
        if state.stacks[index].enable_termination_protection == Some(true) {
            return Err(Error::api(
                VALIDATION_ERROR,
                format!("Stack [{stack_name}] {TERMINATION_PROTECTED_MESSAGE}"),
            ));
        }
        state.stacks.remove(index);
        Ok(())
    }

    fn update_termination_protection(&self, stack_name: &str, enabled: bool) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::UpdateTerminationProtection {
            stack_name: stack_name.to_string(),
            enabled,
        });
        if let Some(err) = state.take_failure(Operation::UpdateTerminationProtection, stack_name) {
            return Err(err);
        }

        let index = state
            .find_stack(stack_name)
            .ok_or_else(|| missing_stack(stack_name))?;
        state.stacks[index].enable_termination_protection = Some(enabled);
        Ok(())
    }

    fn update_stack(&self, request: &UpdateStackRequest) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::UpdateStack(request.clone()));
        if let Some(err) = state.take_failure(Operation::UpdateStack, &request.stack_name) {
            return Err(err);
        }

        let index = state
            .find_stack(&request.stack_name)
            .ok_or_else(|| missing_stack(&request.stack_name))?;
        let stack = &mut state.stacks[index];
        stack.tags = request.tags.clone();
        stack.capabilities = request.capabilities.clone();
        stack.notification_arns = request.notification_arns.clone();
        Ok(())
    }

    fn get_template(&self, request: &GetTemplateRequest) -> Result<Value> {
        let mut state = self.state();
        state.calls.push(Call::GetTemplate(request.clone()));
        if let Some(err) = state.take_failure(Operation::GetTemplate, &request.stack_name) {
            return Err(err);
        }

        let index = state
            .find_stack(&request.stack_name)
            .ok_or_else(|| missing_stack(&request.stack_name))?;
        let stack_id = state.stacks[index].stack_id.clone();
        Ok(state
            .templates
            .get(&stack_id)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())))
    }

    fn list_topics(&self) -> Result<Vec<String>> {
        let mut state = self.state();
        state.calls.push(Call::ListTopics);
        if let Some(err) = state.take_failure(Operation::ListTopics, "") {
            return Err(err);
        }
        Ok(state.topics.keys().cloned().collect())
    }

    fn get_topic_attributes(&self, topic_arn: &str) -> Result<Topic> {
        let mut state = self.state();
        state
            .calls
            .push(Call::GetTopicAttributes(topic_arn.to_string()));
        if let Some(err) = state.take_failure(Operation::GetTopicAttributes, topic_arn) {
            return Err(err);
        }
        state
            .topics
            .get(topic_arn)
            .cloned()
            .ok_or_else(|| Error::api("NotFound", "Topic does not exist"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StackStatus;

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_stack(
                Stack::new("id-web", "web", StackStatus::CreateComplete)
                    .with_termination_protection(true),
            )
            .with_stack(Stack::new("id-db", "db", StackStatus::CreateComplete))
    }

    #[test]
    fn test_bulk_describe_hides_protection() {
        let backend = backend();

        let all = backend.describe_stacks(None).unwrap();
        assert!(all.iter().all(|s| s.enable_termination_protection.is_none()));

        let one = backend.describe_stacks(Some("web")).unwrap();
        assert_eq!(one[0].enable_termination_protection, Some(true));

        let one = backend.describe_stacks(Some("db")).unwrap();
        assert_eq!(one[0].enable_termination_protection, Some(false));
    }

    #[test]
    fn test_protected_delete_is_rejected() {
        let backend = backend();

        let err = backend.delete_stack("web").unwrap_err();
        assert!(err.is_termination_protected());
        assert_eq!(backend.stack_names(), vec!["web", "db"]);

        backend.update_termination_protection("web", false).unwrap();
        backend.delete_stack("web").unwrap();
        assert_eq!(backend.stack_names(), vec!["db"]);
    }

    #[test]
    fn test_scripted_failure_is_consumed_once() {
        let backend = backend();
        backend.fail_next(
            Operation::DeleteStack,
            "db",
            Error::api("Throttling", "Rate exceeded"),
        );

        assert!(backend.delete_stack("db").is_err());
        assert!(backend.delete_stack("db").is_ok());
        assert_eq!(backend.calls_for("db").len(), 2);
    }

    #[test]
    fn test_unknown_topic_is_not_found() {
        let backend = MemoryBackend::new().with_topic(Topic::new("arn:a"));

        assert!(backend.get_topic_attributes("arn:a").is_ok());
        let err = backend.get_topic_attributes("arn:b").unwrap_err();
        assert_eq!(err.code(), Some("NotFound"));
    }
}
