//! Tag and remove-tag actions
//!
//! The update API replaces tags, parameters, capabilities and notification
//! topics together, so every update echoes the stack's current values for
//! everything except its tags. Parameter values are never re-submitted;
//! each parameter is sent as a "use previous value" marker.

use super::{Action, ActionReport};
use anyhow::{Context, Result};
use cfnkit::{Client, Parameter, Stack, Tag, UpdateStackRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PERMISSIONS: &[&str] = &["cloudformation:UpdateStack"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Single tag form, merged into `tags`
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveTagConfig {
    pub tags: Vec<String>,
}

/// Apply a tag delta to a stack's tags
///
/// Keys stay in the order they first appear; a duplicate key keeps its
/// last value. Removed keys are dropped, then added keys are upserted with
/// new keys appended.
pub fn merge_tags(existing: &[Tag], add: &[(String, String)], remove: &[String]) -> Vec<Tag> {
    let mut merged: Vec<(String, String)> = Vec::with_capacity(existing.len() + add.len());

    for tag in existing {
        upsert(&mut merged, &tag.key, &tag.value);
    }
    merged.retain(|(k, _)| !remove.contains(k));
    for (key, value) in add {
        upsert(&mut merged, key, value);
    }

    merged.into_iter().map(|(k, v)| Tag::new(k, v)).collect()
}

fn upsert(entries: &mut Vec<(String, String)>, key: &str, value: &str) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => entries.push((key.to_string(), value.to_string())),
    }
}

/// Build the update that replaces only the tags of `stack`
pub fn build_update(stack: &Stack, tags: Vec<Tag>) -> UpdateStackRequest {
    UpdateStackRequest {
        stack_name: stack.stack_name.clone(),
        use_previous_template: true,
        parameters: stack
            .parameters
            .iter()
            .map(|p| Parameter::use_previous(&p.parameter_key))
            .collect(),
        capabilities: stack.capabilities.clone(),
        notification_arns: stack.notification_arns.clone(),
        tags,
    }
}

/// Reconciles a tag delta into each stack, one update per stack in input
/// order
#[derive(Debug, Clone)]
pub struct TagAction {
    name: &'static str,
    add: Vec<(String, String)>,
    remove: Vec<String>,
}

impl TagAction {
    pub fn tag(config: &TagConfig) -> Result<Self> {
        let mut tags = config.tags.clone();
        match (&config.key, &config.value) {
            (Some(key), Some(value)) => {
                tags.insert(key.clone(), value.clone());
            }
            (None, None) => {}
            _ => anyhow::bail!("tag action requires both 'key' and 'value'"),
        }
        if tags.is_empty() {
            anyhow::bail!("tag action requires at least one tag");
        }
        Ok(Self {
            name: "tag",
            add: tags.into_iter().collect(),
            remove: Vec::new(),
        })
    }

    pub fn remove(config: &RemoveTagConfig) -> Result<Self> {
        if config.tags.is_empty() {
            anyhow::bail!("remove-tag action requires at least one tag key");
        }
        Ok(Self {
            name: "remove-tag",
            add: Vec::new(),
            remove: config.tags.clone(),
        })
    }
}

impl Action for TagAction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, client: &Client, stacks: &[Stack]) -> Result<ActionReport> {
        let mut report = ActionReport::default();
        for stack in stacks {
            let tags = merge_tags(&stack.tags, &self.add, &self.remove);
            client
                .update_stack(&build_update(stack, tags))
                .with_context(|| format!("Failed to update tags on {}", stack.stack_name))?;
            log::debug!("Updated tags on {}", stack.stack_name);
            report.add_success(&stack.stack_name);
        }
        Ok(report)
    }
}
