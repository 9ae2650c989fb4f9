//! Memory record and query types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Category used for records appended after crew runs
pub const CREW_RESULT_CATEGORY: &str = "crew_result";

/// A record in the bounded history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    /// Coarse grouping, e.g. `crew_result`
    pub category: String,
    /// Entry key within the category, e.g. a crew name
    pub key: String,
    pub content: String,
    #[serde(default)]
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl Memory {
    pub fn new(
        category: impl Into<String>,
        key: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category: category.into(),
            key: key.into(),
            content: content.into(),
            metadata: JsonValue::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Query filter; unset fields match everything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    /// Substring match on content
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MemoryFilter {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_new() {
        let memory = Memory::new("crew_result", "demo", "Test content");
        assert!(!memory.id.is_empty());
        assert_eq!(memory.category, "crew_result");
        assert_eq!(memory.key, "demo");
        assert!(memory.metadata.is_null());
    }

    #[test]
    fn test_filter_builder() {
        let filter = MemoryFilter::default().category("notes").key("k").limit(3);
        assert_eq!(filter.category.as_deref(), Some("notes"));
        assert_eq!(filter.key.as_deref(), Some("k"));
        assert!(filter.text.is_none());
        assert_eq!(filter.limit, Some(3));

        let memory = Memory::new("a", "b", "c").with_metadata(json!({"success": true}));
        assert_eq!(memory.metadata["success"], true);
    }
}
