//! Value filter - compares one field of a JSON record against a configured value
//!
//! Keys address top-level fields (`StackStatus`), dotted paths into nested
//! objects (`DriftInformation.StackDriftStatus`), or tags (`tag:team`).
//! The special values `present`, `absent` and `empty` test existence rather
//! than equality.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison operators for value filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueOp {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Regex,
    Contains,
    In,
    NotIn,
}

/// Configuration of a value filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueConfig {
    pub key: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub op: ValueOp,
}

#[derive(Debug, Clone)]
enum Expected {
    Present,
    Absent,
    Empty,
    Regex(Regex),
    Value(Value),
}

/// A compiled value filter
#[derive(Debug, Clone)]
pub struct ValueFilter {
    key: String,
    op: ValueOp,
    expected: Expected,
}

impl ValueFilter {
    /// Compile a filter, validating the operator/value combination
    pub fn new(config: &ValueConfig) -> Result<Self> {
        if config.key.trim().is_empty() {
            anyhow::bail!("value filter requires a non-empty key");
        }

        let expected = match (&config.value, config.op) {
            (Value::String(s), ValueOp::Eq) if s == "present" => Expected::Present,
            (Value::String(s), ValueOp::Eq) if s == "absent" => Expected::Absent,
            (Value::String(s), ValueOp::Eq) if s == "empty" => Expected::Empty,
            (Value::String(pattern), ValueOp::Regex) => {
                // Anchored at the start, like a prefix match
                let regex = Regex::new(&format!("^(?:{pattern})"))
                    .with_context(|| format!("Invalid regex for key '{}'", config.key))?;
                Expected::Regex(regex)
            }
            (_, ValueOp::Regex) => anyhow::bail!("regex op requires a string value"),
            (Value::Array(_), ValueOp::In | ValueOp::NotIn) => {
                Expected::Value(config.value.clone())
            }
            (_, ValueOp::In | ValueOp::NotIn) => {
                anyhow::bail!("'{:?}' op requires a list value", config.op)
            }
            (Value::Null, _) => anyhow::bail!("value filter on '{}' requires a value", config.key),
            (value, _) => Expected::Value(value.clone()),
        };

        Ok(Self {
            key: config.key.clone(),
            op: config.op,
            expected,
        })
    }

    /// Shorthand for an equality filter
    pub fn equals(key: &str, value: impl Into<Value>) -> Result<Self> {
        Self::new(&ValueConfig {
            key: key.to_string(),
            value: value.into(),
            op: ValueOp::Eq,
        })
    }

    /// Check whether a record matches
    pub fn matches(&self, record: &Value) -> bool {
        let found = lookup(record, &self.key);

        match &self.expected {
            Expected::Present => found.is_some_and(|v| !v.is_null()),
            Expected::Absent => found.is_none_or(Value::is_null),
            Expected::Empty => found.is_none_or(is_empty),
            Expected::Regex(regex) => found
                .and_then(Value::as_str)
                .is_some_and(|s| regex.is_match(s)),
            Expected::Value(expected) => {
                let Some(found) = found else {
                    return self.op == ValueOp::Ne || self.op == ValueOp::NotIn;
                };
                match self.op {
                    ValueOp::Eq => compare(found, expected) == Some(Ordering::Equal),
                    ValueOp::Ne => compare(found, expected) != Some(Ordering::Equal),
                    ValueOp::Gt => compare(found, expected) == Some(Ordering::Greater),
                    ValueOp::Gte => matches!(
                        compare(found, expected),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    ValueOp::Lt => compare(found, expected) == Some(Ordering::Less),
                    ValueOp::Lte => matches!(
                        compare(found, expected),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    ValueOp::Contains => contains(found, expected),
                    ValueOp::In => in_list(found, expected),
                    ValueOp::NotIn => !in_list(found, expected),
                    ValueOp::Regex => false,
                }
            }
        }
    }
}

/// Resolve a key against a record
///
/// `tag:<Key>` looks the key up in a `Tags` list of `{Key, Value}` pairs.
pub fn lookup<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    if let Some(tag_key) = key.strip_prefix("tag:") {
        return record
            .get("Tags")?
            .as_array()?
            .iter()
            .find(|t| t.get("Key").and_then(Value::as_str) == Some(tag_key))
            .and_then(|t| t.get("Value"));
    }

    if let Some(direct) = record.get(key) {
        return Some(direct);
    }

    key.split('.')
        .try_fold(record, |current, part| current.get(part))
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Compare two values; numbers compare numerically even when one side is a
/// numeric string
fn compare(found: &Value, expected: &Value) -> Option<Ordering> {
    match (found, expected) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            as_number(found)?.partial_cmp(&as_number(expected)?)
        }
        (Value::Bool(a), Value::String(b)) => Some(a.to_string().cmp(&b.to_lowercase())),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

fn contains(found: &Value, expected: &Value) -> bool {
    match found {
        Value::Array(items) => items
            .iter()
            .any(|item| compare(item, expected) == Some(Ordering::Equal)),
        Value::String(s) => expected.as_str().is_some_and(|e| s.contains(e)),
        _ => false,
    }
}

fn in_list(found: &Value, expected: &Value) -> bool {
    expected.as_array().is_some_and(|items| {
        items
            .iter()
            .any(|item| compare(found, item) == Some(Ordering::Equal))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(key: &str, value: Value, op: ValueOp) -> ValueFilter {
        ValueFilter::new(&ValueConfig {
            key: key.to_string(),
            value,
            op,
        })
        .unwrap()
    }

    fn stack() -> Value {
        json!({
            "StackName": "web",
            "StackStatus": "ROLLBACK_COMPLETE",
            "Tags": [{"Key": "team", "Value": "core"}],
            "Capabilities": ["CAPABILITY_IAM"],
            "DriftInformation": {"StackDriftStatus": "DRIFTED"},
            "Outputs": []
        })
    }

    #[test]
    fn test_equality() {
        assert!(filter("StackStatus", json!("ROLLBACK_COMPLETE"), ValueOp::Eq).matches(&stack()));
        assert!(!filter("StackStatus", json!("CREATE_COMPLETE"), ValueOp::Eq).matches(&stack()));
        assert!(filter("StackStatus", json!("CREATE_COMPLETE"), ValueOp::Ne).matches(&stack()));
    }

    #[test]
    fn test_tags_and_paths() {
        assert!(filter("tag:team", json!("core"), ValueOp::Eq).matches(&stack()));
        assert!(filter("tag:owner", json!("absent"), ValueOp::Eq).matches(&stack()));
        assert!(filter("tag:team", json!("present"), ValueOp::Eq).matches(&stack()));
        assert!(
            filter("DriftInformation.StackDriftStatus", json!("DRIFTED"), ValueOp::Eq)
                .matches(&stack())
        );
        assert!(filter("Outputs", json!("empty"), ValueOp::Eq).matches(&stack()));
    }

    #[test]
    fn test_numeric_comparison_across_strings() {
        let record = json!({"SubscriptionsConfirmed": "3"});

        assert!(filter("SubscriptionsConfirmed", json!(2), ValueOp::Gt).matches(&record));
        assert!(filter("SubscriptionsConfirmed", json!(3), ValueOp::Gte).matches(&record));
        assert!(!filter("SubscriptionsConfirmed", json!(3), ValueOp::Lt).matches(&record));
        assert!(filter("SubscriptionsConfirmed", json!(3), ValueOp::Eq).matches(&record));
    }

    #[test]
    fn test_regex_is_anchored_at_start() {
        assert!(filter("StackName", json!("we"), ValueOp::Regex).matches(&stack()));
        assert!(!filter("StackName", json!("eb"), ValueOp::Regex).matches(&stack()));
    }

    #[test]
    fn test_contains_and_in() {
        assert!(filter("Capabilities", json!("CAPABILITY_IAM"), ValueOp::Contains).matches(&stack()));
        assert!(
            filter("StackStatus", json!(["ROLLBACK_COMPLETE", "DELETE_FAILED"]), ValueOp::In)
                .matches(&stack())
        );
        assert!(filter("StackStatus", json!(["DELETE_FAILED"]), ValueOp::NotIn).matches(&stack()));
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let bad_regex = ValueConfig {
            key: "StackName".into(),
            value: json!("("),
            op: ValueOp::Regex,
        };
        assert!(ValueFilter::new(&bad_regex).is_err());

        let scalar_in = ValueConfig {
            key: "StackName".into(),
            value: json!("web"),
            op: ValueOp::In,
        };
        assert!(ValueFilter::new(&scalar_in).is_err());

        let missing_value = ValueConfig {
            key: "StackName".into(),
            value: Value::Null,
            op: ValueOp::Eq,
        };
        assert!(ValueFilter::new(&missing_value).is_err());
    }
}
