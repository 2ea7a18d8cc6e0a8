//! Generic list-item filter
//!
//! Filters stacks by the items of a list extracted from each stack. An item
//! matches when every attribute filter matches it. Without a `count` the
//! stack is kept when any item matches; with a `count` the number of matched
//! items is compared against it.

use super::value::ValueFilter;
use cfnkit::Stack;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison applied to the matched-item count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountOp {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CountOp {
    pub fn compare(self, actual: usize, expected: usize) -> bool {
        match self {
            CountOp::Eq => actual == expected,
            CountOp::Ne => actual != expected,
            CountOp::Gt => actual > expected,
            CountOp::Gte => actual >= expected,
            CountOp::Lt => actual < expected,
            CountOp::Lte => actual <= expected,
        }
    }
}

/// Extracts the list to filter on; `None` when the stack carries no list
pub type Extract = Box<dyn Fn(&Stack) -> Option<Vec<Value>> + Send + Sync>;

pub struct ListItemFilter {
    extract: Extract,
    attrs: Vec<ValueFilter>,
    count: Option<usize>,
    count_op: CountOp,
}

impl ListItemFilter {
    pub fn new(
        extract: Extract,
        attrs: Vec<ValueFilter>,
        count: Option<usize>,
        count_op: CountOp,
    ) -> Self {
        Self {
            extract,
            attrs,
            count,
            count_op,
        }
    }

    fn item_matches(&self, item: &Value) -> bool {
        self.attrs.iter().all(|f| f.matches(item))
    }

    /// Number of items of `stack` matching every attribute filter
    pub fn matched_items(&self, stack: &Stack) -> usize {
        (self.extract)(stack)
            .unwrap_or_default()
            .iter()
            .filter(|item| self.item_matches(item))
            .count()
    }

    /// Keep the stacks whose list satisfies the filter, recording the match
    /// count on each kept stack
    pub fn apply(&self, stacks: Vec<Stack>) -> Vec<Stack> {
        stacks
            .into_iter()
            .filter_map(|mut stack| {
                let matched = self.matched_items(&stack);
                let keep = match self.count {
                    Some(expected) => self.count_op.compare(matched, expected),
                    None => matched > 0,
                };
                log::trace!(
                    "{}: {} matching items, {}",
                    stack.stack_name,
                    matched,
                    if keep { "kept" } else { "dropped" }
                );
                keep.then(|| {
                    stack.annotations.list_item_matches = Some(matched);
                    stack
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfnkit::StackStatus;
    use serde_json::json;

    fn outputs(stack: &Stack) -> Option<Vec<Value>> {
        stack
            .extra
            .get("Outputs")
            .and_then(Value::as_array)
            .cloned()
    }

    fn stack(name: &str, outputs: Option<Value>) -> Stack {
        let mut stack = Stack::new(format!("id-{name}"), name, StackStatus::CreateComplete);
        if let Some(outputs) = outputs {
            stack.extra.insert("Outputs".into(), outputs);
        }
        stack
    }

    fn batch() -> Vec<Stack> {
        vec![
            stack(
                "two",
                Some(json!([
                    {"OutputKey": "Url", "OutputValue": "a"},
                    {"OutputKey": "Url", "OutputValue": "b"}
                ])),
            ),
            stack("one", Some(json!([{"OutputKey": "Url", "OutputValue": "c"}]))),
            stack("empty", Some(json!([]))),
            stack("none", None),
        ]
    }

    fn names(stacks: &[Stack]) -> Vec<&str> {
        stacks.iter().map(|s| s.stack_name.as_str()).collect()
    }

    #[test]
    fn test_any_match_without_count() {
        let filter = ListItemFilter::new(
            Box::new(outputs),
            vec![ValueFilter::equals("OutputKey", "Url").unwrap()],
            None,
            CountOp::Eq,
        );

        let kept = filter.apply(batch());

        assert_eq!(names(&kept), vec!["two", "one"]);
        assert_eq!(kept[0].annotations.list_item_matches, Some(2));
    }

    #[test]
    fn test_count_zero_keeps_empty_and_missing_lists() {
        let filter = ListItemFilter::new(Box::new(outputs), vec![], Some(0), CountOp::Eq);

        let kept = filter.apply(batch());

        assert_eq!(names(&kept), vec!["empty", "none"]);
        assert!(kept.iter().all(|s| s.annotations.list_item_matches == Some(0)));
    }

    #[test]
    fn test_count_operators() {
        let gte = ListItemFilter::new(Box::new(outputs), vec![], Some(1), CountOp::Gte);
        assert_eq!(names(&gte.apply(batch())), vec!["two", "one"]);

        let lt = ListItemFilter::new(Box::new(outputs), vec![], Some(2), CountOp::Lt);
        assert_eq!(names(&lt.apply(batch())), vec!["one", "empty", "none"]);
    }

    #[test]
    fn test_all_attrs_must_match_one_item() {
        let filter = ListItemFilter::new(
            Box::new(outputs),
            vec![
                ValueFilter::equals("OutputKey", "Url").unwrap(),
                ValueFilter::equals("OutputValue", "c").unwrap(),
            ],
            None,
            CountOp::Eq,
        );

        assert_eq!(names(&filter.apply(batch())), vec!["one"]);
    }
}
