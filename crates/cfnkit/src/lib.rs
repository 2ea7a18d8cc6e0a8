//! # cfnkit
//!
//! Typed client for CloudFormation stack operations.
//!
//! This crate provides:
//! - A data model for stacks, tags, parameters, templates and topics
//! - Classified errors that distinguish throttling, validation and access failures
//! - Retry with exponential backoff around every remote call
//! - A [`Backend`](backend::Backend) trait with an `aws` CLI implementation
//!   and an in-memory implementation for tests
//!
//! ## Example
//!
//! ```no_run
//! use cfnkit::{Client, ClientConfig};
//!
//! let client = Client::new(&ClientConfig::default()).expect("aws CLI not available");
//!
//! for stack in client.describe_stacks(None).expect("describe failed") {
//!     println!("{} ({})", stack.stack_name, stack.stack_status);
//! }
//! ```
//!
//! ## Retry Logic
//!
//! Throttling and network errors are retried with exponential backoff.
//! Every other error is returned on the first failure with its remote code
//! intact, so callers can classify it.
//!
//! ```no_run
//! use cfnkit::{Client, ClientConfig, RetryConfig};
//! use std::time::Duration;
//!
//! let config = ClientConfig {
//!     region: Some("us-east-1".into()),
//!     retry: RetryConfig::new(3, Duration::from_secs(1), 2.0),
//!     ..Default::default()
//! };
//! let client = Client::new(&config).unwrap();
//! client.update_termination_protection("web", false).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod retry;
pub mod topics;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use topics::{ResourceModel, TopicManager};
pub use types::{
    Annotations, GetTemplateRequest, Parameter, RetryConfig, Stack, StackStatus, Tag,
    TemplateStage, Topic, UpdateStackRequest,
};

use backend::{Backend, aws::AwsCliBackend};
use serde_json::Value;

/// Settings used to construct a [`Client`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Region to target; the CLI default is used when unset
    pub region: Option<String>,
    /// Named credentials profile; the CLI default is used when unset
    pub profile: Option<String>,
    /// Retry behavior for every remote call
    pub retry: RetryConfig,
}

/// High-level client for stack and topic operations.
///
/// Every method is one remote call wrapped in retry. The client holds no
/// mutable state and is shared by reference across worker threads.
pub struct Client {
    backend: Box<dyn Backend>,
    retry: RetryConfig,
}

impl Client {
    /// Create a new Client backed by the `aws` CLI.
    ///
    /// Returns an error if the CLI is not installed.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let backend = AwsCliBackend::new(config.region.clone(), config.profile.clone())?;
        Ok(Self {
            backend: Box::new(backend),
            retry: config.retry.clone(),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>, retry: RetryConfig) -> Self {
        Self { backend, retry }
    }

    fn retried<T>(&self, operation: impl FnMut() -> Result<T>) -> Result<T> {
        retry::with_retry(&self.retry, Some(&retry::LogCallback), operation)
    }

    // =========================================================================
    // Stack Operations
    // =========================================================================

    /// Describe one stack, or every stack when `stack_name` is `None`.
    pub fn describe_stacks(&self, stack_name: Option<&str>) -> Result<Vec<Stack>> {
        self.retried(|| self.backend.describe_stacks(stack_name))
    }

    /// Delete a stack by name.
    pub fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.retried(|| self.backend.delete_stack(stack_name))
    }

    /// Enable or disable termination protection.
    pub fn update_termination_protection(&self, stack_name: &str, enabled: bool) -> Result<()> {
        self.retried(|| {
            self.backend
                .update_termination_protection(stack_name, enabled)
        })
    }

    /// Issue a whole-object stack update.
    pub fn update_stack(&self, request: &UpdateStackRequest) -> Result<()> {
        self.retried(|| self.backend.update_stack(request))
    }

    /// Fetch a template body.
    pub fn get_template(&self, request: &GetTemplateRequest) -> Result<Value> {
        self.retried(|| self.backend.get_template(request))
    }

    // =========================================================================
    // Topic Operations
    // =========================================================================

    /// List every topic ARN.
    pub fn list_topics(&self) -> Result<Vec<String>> {
        self.retried(|| self.backend.list_topics())
    }

    /// Fetch one topic's attributes.
    pub fn get_topic_attributes(&self, topic_arn: &str) -> Result<Topic> {
        self.retried(|| self.backend.get_topic_attributes(topic_arn))
    }

    /// Resource manager for topics.
    pub fn topics(&self) -> TopicManager<'_> {
        TopicManager::new(self)
    }
}
