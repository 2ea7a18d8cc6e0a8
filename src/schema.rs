//! Policy file schema
//!
//! ```toml
//! [settings]
//! region = "us-east-1"
//!
//! [[policies]]
//! name = "cfn-delete-failed"
//! resource = "cfn"
//! filters = [{ type = "value", key = "StackStatus", value = "ROLLBACK_COMPLETE" }]
//! actions = [{ type = "delete", force = true }]
//! ```

use crate::actions::Action;
use crate::actions::delete::DeleteConfig;
use crate::actions::protection::ProtectionConfig;
use crate::actions::tag::{RemoveTagConfig, TagConfig};
use crate::filters::Filter;
use crate::filters::template::TemplateConfig;
use crate::filters::topic::TopicConfig;
use crate::filters::value::ValueConfig;
use crate::registry;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The only resource type policies can target
pub const RESOURCE_TYPE: &str = "cfn";

// ============================================================================
// Policy File
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
}

/// Connection settings; command-line flags take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub profile: Option<String>,

    /// Attempts per remote call, including the first
    #[serde(default)]
    pub retry_attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub name: String,

    pub resource: String,

    #[serde(default)]
    pub filters: Vec<FilterConfig>,

    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FilterConfig {
    Value(ValueConfig),
    Template(TemplateConfig),
    Topic(TopicConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionConfig {
    Delete(DeleteConfig),
    SetProtection(ProtectionConfig),
    Tag(TagConfig),
    RemoveTag(RemoveTagConfig),
}

/// A policy with every filter and action built
pub struct Policy {
    pub name: String,
    pub filters: Vec<Box<dyn Filter>>,
    pub actions: Vec<Box<dyn Action>>,
}

impl PolicyFile {
    /// Load and parse a policy file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read policy file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid policy file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format in policy file")
    }

    /// Build every policy, failing on the first invalid one
    pub fn compile(&self) -> Result<Vec<Policy>> {
        let mut seen = HashSet::new();
        self.policies
            .iter()
            .map(|policy| {
                if !seen.insert(policy.name.as_str()) {
                    anyhow::bail!("Duplicate policy name '{}'", policy.name);
                }
                policy.compile()
            })
            .collect()
    }

    /// Compile the file and keep the policies named in `names`, in that
    /// order; all of them when `names` is empty
    pub fn select(&self, names: &[String]) -> Result<Vec<Policy>> {
        let compiled = self.compile()?;
        if names.is_empty() {
            return Ok(compiled);
        }
        let mut slots: Vec<Option<Policy>> = compiled.into_iter().map(Some).collect();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let index = self
                .policies
                .iter()
                .position(|p| &p.name == name)
                .with_context(|| format!("No policy named '{}'", name))?;
            if let Some(policy) = slots[index].take() {
                selected.push(policy);
            }
        }
        Ok(selected)
    }
}

impl PolicyConfig {
    pub fn compile(&self) -> Result<Policy> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Policy name cannot be empty");
        }
        if self.resource != RESOURCE_TYPE {
            anyhow::bail!(
                "Policy '{}': unsupported resource '{}' (expected '{}')",
                self.name,
                self.resource,
                RESOURCE_TYPE
            );
        }

        let filters = self
            .filters
            .iter()
            .enumerate()
            .map(|(i, f)| {
                registry::build_filter(f)
                    .with_context(|| format!("Policy '{}': filter #{}", self.name, i + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        let actions = self
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| {
                registry::build_action(a)
                    .with_context(|| format!("Policy '{}': action #{}", self.name, i + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Policy {
            name: self.name.clone(),
            filters,
            actions,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
