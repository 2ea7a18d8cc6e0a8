//! Template filter - keeps stacks whose template body matches a pattern

use super::Filter;
use anyhow::{Context, Result};
use cfnkit::{Client, GetTemplateRequest, Stack, TemplateStage};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PERMISSIONS: &[&str] = &["cloudformation:GetTemplate"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    /// Regular expression searched anywhere in the body
    pub pattern: String,
    #[serde(default)]
    pub change_set_name: Option<String>,
    #[serde(default)]
    pub template_stage: TemplateStage,
}

#[derive(Debug)]
pub struct TemplateFilter {
    pattern: Regex,
    change_set_name: Option<String>,
    template_stage: TemplateStage,
}

impl TemplateFilter {
    pub fn new(config: &TemplateConfig) -> Result<Self> {
        let pattern = Regex::new(&config.pattern)
            .with_context(|| format!("Invalid template pattern '{}'", config.pattern))?;
        Ok(Self {
            pattern,
            change_set_name: config.change_set_name.clone(),
            template_stage: config.template_stage,
        })
    }

    fn request(&self, stack: &Stack) -> GetTemplateRequest {
        GetTemplateRequest {
            stack_name: stack.stack_id.clone(),
            change_set_name: self.change_set_name.clone(),
            template_stage: Some(self.template_stage),
        }
    }
}

/// Text form of a template body; structured documents are pretty-printed
pub fn render_body(body: &Value) -> Result<String> {
    match body {
        Value::String(text) => Ok(text.clone()),
        other => serde_json::to_string_pretty(other).context("Failed to render template body"),
    }
}

impl Filter for TemplateFilter {
    fn name(&self) -> &'static str {
        "template"
    }

    fn process(&self, client: &Client, stacks: Vec<Stack>) -> Result<Vec<Stack>> {
        let mut kept = Vec::new();
        for stack in stacks {
            let body = client
                .get_template(&self.request(&stack))
                .with_context(|| format!("Failed to fetch template of {}", stack.stack_name))?;
            if self.pattern.is_match(&render_body(&body)?) {
                kept.push(stack);
            } else {
                log::debug!("{}: template does not match", stack.stack_name);
            }
        }
        Ok(kept)
    }
}
