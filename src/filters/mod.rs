//! Stack filters
//!
//! A filter takes a batch of stacks and returns the retained subsequence in
//! input order. Filters may annotate the stacks they keep.

pub mod list_item;
pub mod template;
pub mod topic;
pub mod value;

use anyhow::Result;
use cfnkit::{Client, Stack};

pub trait Filter: Send + Sync {
    /// Registry name of this filter
    fn name(&self) -> &'static str;

    fn process(&self, client: &Client, stacks: Vec<Stack>) -> Result<Vec<Stack>>;
}

impl Filter for value::ValueFilter {
    fn name(&self) -> &'static str {
        "value"
    }

    fn process(&self, _client: &Client, stacks: Vec<Stack>) -> Result<Vec<Stack>> {
        let mut kept = Vec::with_capacity(stacks.len());
        for stack in stacks {
            let record = serde_json::to_value(&stack)?;
            if self.matches(&record) {
                kept.push(stack);
            }
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfnkit::backend::memory::MemoryBackend;
    use cfnkit::{RetryConfig, StackStatus};
    use value::ValueFilter;

    #[test]
    fn test_value_filter_on_stacks() {
        let client =
            Client::with_backend(Box::new(MemoryBackend::new()), RetryConfig::no_retry());
        let stacks = vec![
            Stack::new("id-a", "a", StackStatus::RollbackComplete),
            Stack::new("id-b", "b", StackStatus::CreateComplete).with_tag("env", "dev"),
            Stack::new("id-c", "c", StackStatus::RollbackComplete).with_tag("env", "dev"),
        ];

        let failed = ValueFilter::equals("StackStatus", "ROLLBACK_COMPLETE").unwrap();
        let kept = failed.process(&client, stacks.clone()).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].stack_name, "c");

        let dev = ValueFilter::equals("tag:env", "dev").unwrap();
        let kept = dev.process(&client, stacks).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].stack_name, "b");
    }
}
