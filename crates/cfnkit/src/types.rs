//! Core types for stack management.
//!
//! Field names follow the management API's PascalCase wire names so that
//! `describe-stacks` output deserializes directly into [`Stack`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Lifecycle state of a stack.
///
/// Unknown states are preserved verbatim in [`StackStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StackStatus {
    /// CREATE_IN_PROGRESS
    CreateInProgress,
    /// CREATE_FAILED
    CreateFailed,
    /// CREATE_COMPLETE
    CreateComplete,
    /// ROLLBACK_IN_PROGRESS
    RollbackInProgress,
    /// ROLLBACK_FAILED
    RollbackFailed,
    /// ROLLBACK_COMPLETE
    RollbackComplete,
    /// DELETE_IN_PROGRESS
    DeleteInProgress,
    /// DELETE_FAILED
    DeleteFailed,
    /// DELETE_COMPLETE
    DeleteComplete,
    /// UPDATE_IN_PROGRESS
    UpdateInProgress,
    /// UPDATE_COMPLETE
    UpdateComplete,
    /// UPDATE_FAILED
    UpdateFailed,
    /// UPDATE_ROLLBACK_IN_PROGRESS
    UpdateRollbackInProgress,
    /// UPDATE_ROLLBACK_FAILED
    UpdateRollbackFailed,
    /// UPDATE_ROLLBACK_COMPLETE
    UpdateRollbackComplete,
    /// REVIEW_IN_PROGRESS
    ReviewInProgress,
    /// IMPORT_COMPLETE
    ImportComplete,
    /// Any state this crate does not name
    Other(String),
}

impl StackStatus {
    /// Wire name of this status (e.g. `ROLLBACK_COMPLETE`).
    pub fn as_str(&self) -> &str {
        match self {
            StackStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            StackStatus::CreateFailed => "CREATE_FAILED",
            StackStatus::CreateComplete => "CREATE_COMPLETE",
            StackStatus::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            StackStatus::RollbackFailed => "ROLLBACK_FAILED",
            StackStatus::RollbackComplete => "ROLLBACK_COMPLETE",
            StackStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            StackStatus::DeleteFailed => "DELETE_FAILED",
            StackStatus::DeleteComplete => "DELETE_COMPLETE",
            StackStatus::UpdateInProgress => "UPDATE_IN_PROGRESS",
            StackStatus::UpdateComplete => "UPDATE_COMPLETE",
            StackStatus::UpdateFailed => "UPDATE_FAILED",
            StackStatus::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            StackStatus::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            StackStatus::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            StackStatus::ReviewInProgress => "REVIEW_IN_PROGRESS",
            StackStatus::ImportComplete => "IMPORT_COMPLETE",
            StackStatus::Other(s) => s,
        }
    }
}

impl From<String> for StackStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CREATE_IN_PROGRESS" => StackStatus::CreateInProgress,
            "CREATE_FAILED" => StackStatus::CreateFailed,
            "CREATE_COMPLETE" => StackStatus::CreateComplete,
            "ROLLBACK_IN_PROGRESS" => StackStatus::RollbackInProgress,
            "ROLLBACK_FAILED" => StackStatus::RollbackFailed,
            "ROLLBACK_COMPLETE" => StackStatus::RollbackComplete,
            "DELETE_IN_PROGRESS" => StackStatus::DeleteInProgress,
            "DELETE_FAILED" => StackStatus::DeleteFailed,
            "DELETE_COMPLETE" => StackStatus::DeleteComplete,
            "UPDATE_IN_PROGRESS" => StackStatus::UpdateInProgress,
            "UPDATE_COMPLETE" => StackStatus::UpdateComplete,
            "UPDATE_FAILED" => StackStatus::UpdateFailed,
            "UPDATE_ROLLBACK_IN_PROGRESS" => StackStatus::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_FAILED" => StackStatus::UpdateRollbackFailed,
            "UPDATE_ROLLBACK_COMPLETE" => StackStatus::UpdateRollbackComplete,
            "REVIEW_IN_PROGRESS" => StackStatus::ReviewInProgress,
            "IMPORT_COMPLETE" => StackStatus::ImportComplete,
            _ => StackStatus::Other(s),
        }
    }
}

impl From<StackStatus> for String {
    fn from(status: StackStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key/value tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A stack parameter, either with a value or as a "use previous value" marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    /// Parameter key
    pub parameter_key: String,
    /// Current value (masked for NoEcho parameters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<String>,
    /// Keep the value the stack already has
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_previous_value: Option<bool>,
    /// Resolved value for SSM parameter types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_value: Option<String>,
}

impl Parameter {
    /// A marker that keeps the previous value of `key` without re-submitting it.
    pub fn use_previous(key: impl Into<String>) -> Self {
        Self {
            parameter_key: key.into(),
            parameter_value: None,
            use_previous_value: Some(true),
            resolved_value: None,
        }
    }

    /// A parameter with an explicit value.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter_key: key.into(),
            parameter_value: Some(value.into()),
            use_previous_value: None,
            resolved_value: None,
        }
    }
}

/// A notification topic.
///
/// Serializes as a flat attribute record so attribute filters can address
/// `TopicArn`, `DisplayName`, `Owner`, ... uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique topic id
    #[serde(rename = "TopicArn")]
    pub topic_arn: String,
    /// Remaining topic attributes
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl Topic {
    /// Create a topic without attributes.
    pub fn new(topic_arn: impl Into<String>) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Build a topic from a `get-topic-attributes` attribute map.
    ///
    /// The `TopicArn` attribute, when present, is lifted into `topic_arn`.
    pub fn from_attributes(topic_arn: &str, mut attributes: BTreeMap<String, String>) -> Self {
        let topic_arn = attributes
            .remove("TopicArn")
            .unwrap_or_else(|| topic_arn.to_string());
        Self {
            topic_arn,
            attributes,
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up a field by name, including `TopicArn`.
    pub fn field(&self, name: &str) -> Option<&str> {
        if name == "TopicArn" {
            Some(&self.topic_arn)
        } else {
            self.attributes.get(name).map(String::as_str)
        }
    }
}

/// Local annotations attached to a stack by filters.
///
/// Never sent to the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Annotations {
    /// Resolved notification topics, in the stack's own ARN order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Topic>>,
    /// Number of list items matched by the last list-item filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item_matches: Option<usize>,
}

impl Annotations {
    /// Whether no annotation has been set.
    pub fn is_empty(&self) -> bool {
        self.topics.is_none() && self.list_item_matches.is_none()
    }
}

/// A stack as returned by `describe-stacks`.
///
/// Records are read-only snapshots: mutating calls do not refresh them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    /// Globally unique stack id (an ARN)
    pub stack_id: String,
    /// Logical stack name, also usable as a lookup key
    pub stack_name: String,
    /// Lifecycle state
    pub stack_status: StackStatus,
    /// When the stack was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    /// Tags in wire order
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Parameters in wire order
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Capabilities acknowledged by the last update
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Notification topic ARNs
    #[serde(default, rename = "NotificationARNs")]
    pub notification_arns: Vec<String>,
    /// Only reported when the stack is described individually
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_termination_protection: Option<bool>,
    /// Local annotations written by filters
    #[serde(
        default,
        rename = "stackward:Annotations",
        skip_serializing_if = "Annotations::is_empty"
    )]
    pub annotations: Annotations,
    /// Remote fields not modelled above (`Description`, `Outputs`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Stack {
    /// Create a stack record with the given id, name and status.
    pub fn new(
        stack_id: impl Into<String>,
        stack_name: impl Into<String>,
        stack_status: StackStatus,
    ) -> Self {
        Self {
            stack_id: stack_id.into(),
            stack_name: stack_name.into(),
            stack_status,
            creation_time: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            capabilities: Vec::new(),
            notification_arns: Vec::new(),
            enable_termination_protection: None,
            annotations: Annotations::default(),
            extra: BTreeMap::new(),
        }
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Add a parameter with a value.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::with_value(key, value));
        self
    }

    /// Add a capability.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Add a notification topic ARN.
    pub fn with_notification_arn(mut self, arn: impl Into<String>) -> Self {
        self.notification_arns.push(arn.into());
        self
    }

    /// Set the termination protection flag.
    pub fn with_termination_protection(mut self, enabled: bool) -> Self {
        self.enable_termination_protection = Some(enabled);
        self
    }

    /// Value of the tag `key`, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

/// Stage of a template to retrieve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateStage {
    /// The template as submitted
    Original,
    /// The template after transforms are applied
    #[default]
    Processed,
}

impl fmt::Display for TemplateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateStage::Original => f.write_str("Original"),
            TemplateStage::Processed => f.write_str("Processed"),
        }
    }
}

/// Request for `get-template`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetTemplateRequest {
    /// Stack name or id; the template filter always passes the id
    pub stack_name: String,
    /// Retrieve the template of this change set instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_set_name: Option<String>,
    /// Template stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_stage: Option<TemplateStage>,
}

/// Request for `update-stack`.
///
/// The API replaces every list wholesale, so callers must echo back the
/// fields they do not intend to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStackRequest {
    /// Stack to update
    pub stack_name: String,
    /// Reuse the currently deployed template
    pub use_previous_template: bool,
    /// Parameters, normally all "use previous value" markers
    pub parameters: Vec<Parameter>,
    /// Capabilities to acknowledge
    pub capabilities: Vec<String>,
    /// Notification topic ARNs
    #[serde(rename = "NotificationARNs")]
    pub notification_arns: Vec<String>,
    /// Complete tag set
    pub tags: Vec<Tag>,
}

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(20),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_deserializes_describe_output() {
        let json = r#"{
            "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/web/abc",
            "StackName": "web",
            "StackStatus": "ROLLBACK_COMPLETE",
            "CreationTime": "2024-03-01T10:00:00.123000+00:00",
            "Description": "web tier",
            "Parameters": [{"ParameterKey": "Env", "ParameterValue": "prod"}],
            "Capabilities": ["CAPABILITY_IAM"],
            "NotificationARNs": ["arn:aws:sns:us-east-1:123456789012:alerts"],
            "Tags": [{"Key": "team", "Value": "core"}]
        }"#;

        let stack: Stack = serde_json::from_str(json).unwrap();

        assert_eq!(stack.stack_name, "web");
        assert_eq!(stack.stack_status, StackStatus::RollbackComplete);
        assert_eq!(stack.parameters[0].parameter_value.as_deref(), Some("prod"));
        assert_eq!(stack.notification_arns.len(), 1);
        assert_eq!(stack.tag("team"), Some("core"));
        assert_eq!(stack.enable_termination_protection, None);
        assert_eq!(stack.extra.get("Description"), Some(&Value::from("web tier")));
        assert!(stack.annotations.is_empty());
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status = StackStatus::from("IMPORT_ROLLBACK_COMPLETE".to_string());
        assert_eq!(status, StackStatus::Other("IMPORT_ROLLBACK_COMPLETE".to_string()));
        assert_eq!(status.to_string(), "IMPORT_ROLLBACK_COMPLETE");
    }

    #[test]
    fn test_update_request_wire_names() {
        let request = UpdateStackRequest {
            stack_name: "web".into(),
            use_previous_template: true,
            parameters: vec![Parameter::use_previous("Env")],
            capabilities: vec!["CAPABILITY_IAM".into()],
            notification_arns: vec![],
            tags: vec![Tag::new("team", "core")],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["UsePreviousTemplate"], Value::Bool(true));
        assert_eq!(
            value["Parameters"][0],
            serde_json::json!({"ParameterKey": "Env", "UsePreviousValue": true})
        );
        assert!(value["NotificationARNs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_topic_from_attributes_lifts_arn() {
        let mut attrs = BTreeMap::new();
        attrs.insert("TopicArn".to_string(), "arn:aws:sns:us-east-1:1:alerts".to_string());
        attrs.insert("DisplayName".to_string(), "Alerts".to_string());

        let topic = Topic::from_attributes("ignored", attrs);
        assert_eq!(topic.topic_arn, "arn:aws:sns:us-east-1:1:alerts");
        assert_eq!(topic.field("TopicArn"), Some("arn:aws:sns:us-east-1:1:alerts"));
        assert_eq!(topic.field("DisplayName"), Some("Alerts"));
        assert!(!topic.attributes.contains_key("TopicArn"));
    }

    #[test]
    fn test_retry_config_delay() {
        let config = RetryConfig::new(5, Duration::from_secs(1), 2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(20));
    }
}
