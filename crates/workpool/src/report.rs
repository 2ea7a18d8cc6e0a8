//! Batch reports with per-item soft errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recorded per-item failure that did not abort the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftError {
    /// Identifier of the failed item (e.g. a stack name)
    pub item: String,
    /// Error message
    pub message: String,
}

impl SoftError {
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SoftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.message)
    }
}

/// Summary of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Items processed successfully
    pub succeeded: Vec<String>,
    /// Items that failed softly
    pub soft_errors: Vec<SoftError>,
}

impl BatchReport {
    /// Record a successful item
    pub fn add_success(&mut self, item: impl Into<String>) {
        self.succeeded.push(item.into());
    }

    /// Record a soft failure
    pub fn add_soft_error(&mut self, error: SoftError) {
        self.soft_errors.push(error);
    }

    /// Check if every item succeeded
    pub fn is_clean(&self) -> bool {
        self.soft_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = BatchReport::default();
        assert!(report.is_clean());

        report.add_success("web");
        report.add_soft_error(SoftError::new("db", "denied"));

        assert_eq!(report.succeeded, vec!["web"]);
        assert!(!report.is_clean());
        assert_eq!(report.soft_errors[0].to_string(), "db: denied");
    }
}
