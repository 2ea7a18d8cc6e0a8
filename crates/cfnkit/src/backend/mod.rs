//! Backend abstraction for stack and topic operations.
//!
//! The [`Backend`] trait is the raw remote API surface. Retry and
//! classification live above it in [`crate::Client`], so a backend makes
//! exactly one remote call per method invocation.

pub mod aws;
pub mod memory;

use crate::error::Result;
use crate::types::{GetTemplateRequest, Stack, Topic, UpdateStackRequest};
use serde_json::Value;
use std::sync::Arc;

/// Backend trait for stack management operations.
///
/// This trait abstracts the underlying API implementation, enabling:
/// - Real calls through the `aws` CLI
/// - In-memory implementations for testing
///
/// Implementations must be safe to share across worker threads.
pub trait Backend: Send + Sync {
    /// Describe one stack by name or id, or every stack when `stack_name` is `None`.
    ///
    /// Only single-stack describes report `EnableTerminationProtection`.
    fn describe_stacks(&self, stack_name: Option<&str>) -> Result<Vec<Stack>>;

    /// Delete a stack by name.
    fn delete_stack(&self, stack_name: &str) -> Result<()>;

    /// Enable or disable termination protection on a stack.
    fn update_termination_protection(&self, stack_name: &str, enabled: bool) -> Result<()>;

    /// Update a stack, replacing tags, parameters, capabilities and notification ARNs.
    fn update_stack(&self, request: &UpdateStackRequest) -> Result<()>;

    /// Fetch a template body; either a string or a structured document.
    fn get_template(&self, request: &GetTemplateRequest) -> Result<Value>;

    /// List the ARNs of every notification topic.
    fn list_topics(&self) -> Result<Vec<String>>;

    /// Fetch the attributes of a single topic.
    fn get_topic_attributes(&self, topic_arn: &str) -> Result<Topic>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn describe_stacks(&self, stack_name: Option<&str>) -> Result<Vec<Stack>> {
        (**self).describe_stacks(stack_name)
    }

    fn delete_stack(&self, stack_name: &str) -> Result<()> {
        (**self).delete_stack(stack_name)
    }

    fn update_termination_protection(&self, stack_name: &str, enabled: bool) -> Result<()> {
        (**self).update_termination_protection(stack_name, enabled)
    }

    fn update_stack(&self, request: &UpdateStackRequest) -> Result<()> {
        (**self).update_stack(request)
    }

    fn get_template(&self, request: &GetTemplateRequest) -> Result<Value> {
        (**self).get_template(request)
    }

    fn list_topics(&self) -> Result<Vec<String>> {
        (**self).list_topics()
    }

    fn get_topic_attributes(&self, topic_arn: &str) -> Result<Topic> {
        (**self).get_topic_attributes(topic_arn)
    }
}
