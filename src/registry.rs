//! Registry of filters and actions
//!
//! Maps policy configuration to built components and describes each
//! registered type for the `schema` command.

use crate::actions::delete::{self, DeleteAction};
use crate::actions::protection::{self, ProtectionAction};
use crate::actions::tag::{self, TagAction};
use crate::actions::Action;
use crate::filters::template::{self, TemplateFilter};
use crate::filters::topic::{self, TopicFilter};
use crate::filters::value::ValueFilter;
use crate::filters::Filter;
use crate::schema::{ActionConfig, FilterConfig};
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Filter,
    Action,
}

/// Description of a registered filter or action
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub name: &'static str,
    pub kind: Kind,
    pub description: &'static str,
    /// Option name and description
    pub options: &'static [(&'static str, &'static str)],
    pub permissions: &'static [&'static str],
}

pub const FILTERS: &[Entry] = &[
    Entry {
        name: "value",
        kind: Kind::Filter,
        description: "Compare a stack field or tag against a value",
        options: &[
            ("key", "Field name, dotted path, or tag:<Key>"),
            ("value", "Expected value; 'present', 'absent' and 'empty' test existence"),
            ("op", "eq (default), ne, gt, gte, lt, lte, regex, contains, in, not-in"),
        ],
        permissions: &[],
    },
    Entry {
        name: "template",
        kind: Kind::Filter,
        description: "Keep stacks whose template body matches a regular expression",
        options: &[
            ("pattern", "Regular expression searched anywhere in the body"),
            ("change_set_name", "Read the template of this change set"),
            ("template_stage", "Original or Processed (default)"),
        ],
        permissions: template::PERMISSIONS,
    },
    Entry {
        name: "topic",
        kind: Kind::Filter,
        description: "Filter on the notification topics of each stack",
        options: &[
            ("attrs", "List of value filters applied to each topic"),
            ("count", "Number of matching topics to compare against"),
            ("count_op", "eq (default), ne, gt, gte, lt, lte"),
        ],
        permissions: topic::PERMISSIONS,
    },
];

pub const ACTIONS: &[Entry] = &[
    Entry {
        name: "delete",
        kind: Kind::Action,
        description: "Delete stacks",
        options: &[(
            "force",
            "Disable termination protection on protected stacks and retry",
        )],
        permissions: delete::PERMISSIONS,
    },
    Entry {
        name: "set-protection",
        kind: Kind::Action,
        description: "Enable or disable termination protection",
        options: &[("state", "Desired protection state (default false)")],
        permissions: protection::PERMISSIONS,
    },
    Entry {
        name: "tag",
        kind: Kind::Action,
        description: "Add or overwrite tags",
        options: &[
            ("tags", "Table of tag keys and values"),
            ("key", "Single tag key"),
            ("value", "Single tag value"),
        ],
        permissions: tag::PERMISSIONS,
    },
    Entry {
        name: "remove-tag",
        kind: Kind::Action,
        description: "Remove tags by key",
        options: &[("tags", "List of tag keys")],
        permissions: tag::PERMISSIONS,
    },
];

/// Look up a registered filter or action by name
pub fn find(name: &str) -> Option<&'static Entry> {
    FILTERS.iter().chain(ACTIONS).find(|e| e.name == name)
}

pub fn build_filter(config: &FilterConfig) -> Result<Box<dyn Filter>> {
    Ok(match config {
        FilterConfig::Value(c) => Box::new(ValueFilter::new(c)?),
        FilterConfig::Template(c) => Box::new(TemplateFilter::new(c)?),
        FilterConfig::Topic(c) => Box::new(TopicFilter::new(c)?),
    })
}

pub fn build_action(config: &ActionConfig) -> Result<Box<dyn Action>> {
    Ok(match config {
        ActionConfig::Delete(c) => Box::new(DeleteAction::new(c)),
        ActionConfig::SetProtection(c) => Box::new(ProtectionAction::new(c)),
        ActionConfig::Tag(c) => Box::new(TagAction::tag(c)?),
        ActionConfig::RemoveTag(c) => Box::new(TagAction::remove(c)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::delete::DeleteConfig;
    use crate::actions::tag::RemoveTagConfig;

    #[test]
    fn test_names_are_unique_and_match_components() {
        let mut names: Vec<_> = FILTERS.iter().chain(ACTIONS).map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FILTERS.len() + ACTIONS.len());

        let action = build_action(&ActionConfig::Delete(DeleteConfig::default())).unwrap();
        assert!(find(action.name()).is_some());
        let action = build_action(&ActionConfig::RemoveTag(RemoveTagConfig {
            tags: vec!["a".into()],
        }))
        .unwrap();
        assert_eq!(find(action.name()).unwrap().kind, Kind::Action);
    }

    #[test]
    fn test_delete_permissions() {
        let entry = find("delete").unwrap();
        assert_eq!(
            entry.permissions,
            &["cloudformation:DeleteStack", "cloudformation:UpdateStack"]
        );
        assert!(find("topic").unwrap().permissions.contains(&"sns:ListTopics"));
    }
}
