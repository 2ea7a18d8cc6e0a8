//! Backend that drives the `aws` CLI.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{GetTemplateRequest, Stack, Topic, UpdateStackRequest};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::process::Command;

/// Backend that executes `aws cloudformation` and `aws sns` commands.
pub struct AwsCliBackend {
    /// Path to the aws executable
    aws_path: String,
    region: Option<String>,
    profile: Option<String>,
}

#[derive(Deserialize)]
struct DescribeStacksOutput {
    #[serde(rename = "Stacks", default)]
    stacks: Vec<Stack>,
}

#[derive(Deserialize)]
struct GetTemplateOutput {
    #[serde(rename = "TemplateBody", default)]
    template_body: Value,
}

#[derive(Deserialize)]
struct ListTopicsOutput {
    #[serde(rename = "Topics", default)]
    topics: Vec<TopicRef>,
}

#[derive(Deserialize)]
struct TopicRef {
    #[serde(rename = "TopicArn")]
    topic_arn: String,
}

#[derive(Deserialize)]
struct TopicAttributesOutput {
    #[serde(rename = "Attributes", default)]
    attributes: BTreeMap<String, String>,
}

impl AwsCliBackend {
    /// Create a new backend bound to an optional region and profile.
    ///
    /// Returns an error if the `aws` CLI is not installed.
    pub fn new(region: Option<String>, profile: Option<String>) -> Result<Self> {
        let aws_path = which::which("aws")
            .map_err(|_| Error::CliNotFound)?
            .to_string_lossy()
            .to_string();
        Ok(Self {
            aws_path,
            region,
            profile,
        })
    }

    /// Arguments prepended to every invocation.
    fn global_args(&self) -> Vec<String> {
        let mut args = vec!["--output".to_string(), "json".to_string()];
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }

    /// Run an aws command and return stdout, mapping failures to classified errors.
    fn run_aws(&self, args: &[&str]) -> Result<String> {
        let operation = args.iter().take(2).copied().collect::<Vec<_>>().join(" ");
        log::debug!("aws {}", args.join(" "));

        let output = Command::new(&self.aws_path)
            .args(self.global_args())
            .args(args)
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute aws: {}", e),
                stderr: String::new(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_cli_output(&stderr, &operation));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_aws_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let stdout = self.run_aws(args)?;
        parse_output(&stdout)
    }
}

/// Parse CLI JSON output; commands without output print nothing.
fn parse_output<T: DeserializeOwned>(stdout: &str) -> Result<T> {
    let trimmed = stdout.trim();
    let body = if trimmed.is_empty() { "{}" } else { trimmed };
    Ok(serde_json::from_str(body)?)
}

impl Backend for AwsCliBackend {
    fn describe_stacks(&self, stack_name: Option<&str>) -> Result<Vec<Stack>> {
        let mut args = vec!["cloudformation", "describe-stacks"];
        if let Some(name) = stack_name {
            args.extend(["--stack-name", name]);
        }
        let output: DescribeStacksOutput = self.run_aws_json(&args)?;
        Ok(output.stacks)
    }

    fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.run_aws(&["cloudformation", "delete-stack", "--stack-name", stack_name])?;
        Ok(())
    }

    fn update_termination_protection(&self, stack_name: &str, enabled: bool) -> Result<()> {
        let flag = if enabled {
            "--enable-termination-protection"
        } else {
            "--no-enable-termination-protection"
        };
        self.run_aws(&[
            "cloudformation",
            "update-termination-protection",
            "--stack-name",
            stack_name,
            flag,
        ])?;
        Ok(())
    }

    fn update_stack(&self, request: &UpdateStackRequest) -> Result<()> {
        let input = serde_json::to_string(request)?;
        self.run_aws(&["cloudformation", "update-stack", "--cli-input-json", &input])?;
        Ok(())
    }

    fn get_template(&self, request: &GetTemplateRequest) -> Result<Value> {
        let input = serde_json::to_string(request)?;
        let output: GetTemplateOutput =
            self.run_aws_json(&["cloudformation", "get-template", "--cli-input-json", &input])?;
        Ok(output.template_body)
    }

    fn list_topics(&self) -> Result<Vec<String>> {
        let output: ListTopicsOutput = self.run_aws_json(&["sns", "list-topics"])?;
        Ok(output.topics.into_iter().map(|t| t.topic_arn).collect())
    }

    fn get_topic_attributes(&self, topic_arn: &str) -> Result<Topic> {
        let output: TopicAttributesOutput =
            self.run_aws_json(&["sns", "get-topic-attributes", "--topic-arn", topic_arn])?;
        Ok(Topic::from_attributes(topic_arn, output.attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(region: Option<&str>, profile: Option<&str>) -> AwsCliBackend {
        AwsCliBackend {
            aws_path: "aws".to_string(),
            region: region.map(String::from),
            profile: profile.map(String::from),
        }
    }

    #[test]
    fn test_global_args() {
        assert_eq!(backend(None, None).global_args(), vec!["--output", "json"]);
        assert_eq!(
            backend(Some("eu-west-1"), Some("ops")).global_args(),
            vec!["--output", "json", "--region", "eu-west-1", "--profile", "ops"]
        );
    }

    #[test]
    fn test_parse_empty_output() {
        let output: GetTemplateOutput = parse_output("\n").unwrap();
        assert_eq!(output.template_body, Value::Null);
    }

    #[test]
    fn test_parse_template_output() {
        let stdout = r#"{"TemplateBody": {"Resources": {"Bucket": {"Type": "AWS::S3::Bucket"}}},
                         "StagesAvailable": ["Original", "Processed"]}"#;
        let output: GetTemplateOutput = parse_output(stdout).unwrap();
        assert!(output.template_body.is_object());

        let stdout = r#"{"TemplateBody": "Resources:\n  Bucket:\n    Type: AWS::S3::Bucket\n"}"#;
        let output: GetTemplateOutput = parse_output(stdout).unwrap();
        assert!(output.template_body.is_string());
    }

    #[test]
    fn test_parse_list_topics_output() {
        let stdout = r#"{"Topics": [{"TopicArn": "arn:aws:sns:us-east-1:1:a"},
                                    {"TopicArn": "arn:aws:sns:us-east-1:1:b"}]}"#;
        let output: ListTopicsOutput = parse_output(stdout).unwrap();
        assert_eq!(output.topics.len(), 2);
        assert_eq!(output.topics[1].topic_arn, "arn:aws:sns:us-east-1:1:b");
    }

    #[test]
    fn test_parse_describe_stacks_output() {
        let stdout = r#"{"Stacks": [{"StackId": "id-1", "StackName": "web",
                                     "StackStatus": "CREATE_COMPLETE",
                                     "EnableTerminationProtection": true}]}"#;
        let output: DescribeStacksOutput = parse_output(stdout).unwrap();
        assert_eq!(output.stacks[0].enable_termination_protection, Some(true));
    }
}
