//! Resource manager for notification topics.
//!
//! Exposes the two resolution primitives the topic filter chooses between:
//! a targeted lookup of explicit ids and a fetch of the whole inventory.

use crate::Client;
use crate::error::{ErrorCategory, Result};
use crate::types::Topic;

/// Schema of a resource type: which field identifies a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceModel {
    /// Field holding the unique id
    pub id: &'static str,
}

/// Topic resource manager bound to a client.
pub struct TopicManager<'a> {
    client: &'a Client,
}

impl<'a> TopicManager<'a> {
    /// Schema of topic records.
    pub const MODEL: ResourceModel = ResourceModel {
        id: "TopicArn",
    };

    /// Create a manager over `client`.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// The schema used to key resolved records.
    pub fn get_model(&self) -> ResourceModel {
        Self::MODEL
    }

    /// Resolve specific topics by id.
    ///
    /// Topics that no longer exist are skipped; other failures propagate.
    pub fn get_resources(&self, ids: &[String]) -> Result<Vec<Topic>> {
        let mut topics = Vec::with_capacity(ids.len());
        for id in ids {
            match self.client.get_topic_attributes(id) {
                Ok(topic) => topics.push(topic),
                Err(e) if e.category() == ErrorCategory::NotFound => {
                    log::debug!("Topic {} not found, skipping", id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(topics)
    }

    /// Fetch every topic in the account and region.
    pub fn resources(&self) -> Result<Vec<Topic>> {
        let arns = self.client.list_topics()?;
        log::debug!("Listed {} topics", arns.len());
        self.get_resources(&arns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{Call, MemoryBackend};
    use crate::types::RetryConfig;
    use std::sync::Arc;

    fn client(backend: &Arc<MemoryBackend>) -> Client {
        Client::with_backend(Box::new(Arc::clone(backend)), RetryConfig::no_retry())
    }

    #[test]
    fn test_get_resources_skips_missing() {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_topic(Topic::new("arn:a").with_attribute("DisplayName", "A"))
                .with_topic(Topic::new("arn:b")),
        );
        let client = client(&backend);
        let manager = TopicManager::new(&client);

        let topics = manager
            .get_resources(&["arn:a".to_string(), "arn:gone".to_string()])
            .unwrap();

        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].field("DisplayName"), Some("A"));
        assert!(!backend.calls().contains(&Call::ListTopics));
    }

    #[test]
    fn test_resources_lists_inventory_once() {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_topic(Topic::new("arn:a"))
                .with_topic(Topic::new("arn:b")),
        );
        let client = client(&backend);

        let topics = TopicManager::new(&client).resources().unwrap();

        assert_eq!(topics.len(), 2);
        let lists = backend
            .calls()
            .iter()
            .filter(|c| **c == Call::ListTopics)
            .count();
        assert_eq!(lists, 1);
    }

    #[test]
    fn test_model_id_field() {
        assert_eq!(TopicManager::MODEL.id, "TopicArn");
    }
}
