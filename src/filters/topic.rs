//! Topic filter - resolves the notification topics of each stack and filters
//! on their attributes
//!
//! Small batches resolve each referenced topic individually; once the batch
//! references [`FETCH_THRESHOLD`] or more distinct topics the whole topic
//! inventory is fetched once instead.

use super::Filter;
use super::list_item::{CountOp, ListItemFilter};
use super::value::{ValueConfig, ValueFilter};
use anyhow::{Context, Result};
use cfnkit::{Client, Stack, Topic};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub const PERMISSIONS: &[&str] = &["sns:GetTopicAttributes", "sns:ListTopics"];

/// Distinct topic count at which resolution switches to a bulk fetch
pub const FETCH_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// One lookup per referenced topic
    Targeted,
    /// One listing of every topic
    Bulk,
}

impl FetchStrategy {
    pub fn for_count(distinct: usize) -> Self {
        if distinct < FETCH_THRESHOLD {
            FetchStrategy::Targeted
        } else {
            FetchStrategy::Bulk
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicConfig {
    #[serde(default)]
    pub attrs: Vec<ValueConfig>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub count_op: CountOp,
}

/// Distinct topic ARNs referenced by `stacks`, in first-seen order
pub fn distinct_topic_arns(stacks: &[Stack]) -> Vec<String> {
    let mut seen = HashSet::new();
    stacks
        .iter()
        .flat_map(|s| s.notification_arns.iter())
        .filter(|arn| seen.insert(arn.as_str()))
        .cloned()
        .collect()
}

/// Attach resolved topics to every stack
///
/// Each stack gets its topics in its own ARN order. ARNs that do not
/// resolve are left out.
pub fn resolve_topics(client: &Client, stacks: &mut [Stack]) -> Result<FetchStrategy> {
    let manager = client.topics();
    let arns = distinct_topic_arns(stacks);
    let strategy = FetchStrategy::for_count(arns.len());
    log::debug!(
        "Resolving {} distinct topics ({:?})",
        arns.len(),
        strategy
    );

    let topics = match strategy {
        FetchStrategy::Targeted => manager.get_resources(&arns),
        FetchStrategy::Bulk => manager.resources(),
    }
    .context("Failed to resolve notification topics")?;

    let id_field = manager.get_model().id;
    let by_id: HashMap<String, Topic> = topics
        .into_iter()
        .filter_map(|t| {
            let id = t.field(id_field)?.to_string();
            Some((id, t))
        })
        .collect();

    for stack in stacks.iter_mut() {
        let resolved = stack
            .notification_arns
            .iter()
            .filter_map(|arn| {
                let topic = by_id.get(arn);
                if topic.is_none() {
                    log::debug!("{}: topic {} not found", stack.stack_name, arn);
                }
                topic.cloned()
            })
            .collect();
        stack.annotations.topics = Some(resolved);
    }

    Ok(strategy)
}

fn annotated_topics(stack: &Stack) -> Option<Vec<Value>> {
    stack.annotations.topics.as_ref().map(|topics| {
        topics
            .iter()
            .filter_map(|t| serde_json::to_value(t).ok())
            .collect()
    })
}

pub struct TopicFilter {
    items: ListItemFilter,
}

impl TopicFilter {
    pub fn new(config: &TopicConfig) -> Result<Self> {
        let attrs = config
            .attrs
            .iter()
            .map(ValueFilter::new)
            .collect::<Result<Vec<_>>>()
            .context("Invalid topic attribute filter")?;
        Ok(Self {
            items: ListItemFilter::new(
                Box::new(annotated_topics),
                attrs,
                config.count,
                config.count_op,
            ),
        })
    }
}

impl Filter for TopicFilter {
    fn name(&self) -> &'static str {
        "topic"
    }

    fn process(&self, client: &Client, mut stacks: Vec<Stack>) -> Result<Vec<Stack>> {
        resolve_topics(client, &mut stacks)?;
        Ok(self.items.apply(stacks))
    }
}
