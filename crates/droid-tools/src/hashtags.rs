//! extract_hashtags tool

use std::collections::HashSet;
use std::sync::LazyLock;

use droid_core::{tool::require_str, FnTool};
use regex::Regex;
use serde_json::json;

pub const HASHTAG_TOOL_NAME: &str = "extract_hashtags";

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid hashtag regex"));

/// Hashtags in order of first appearance, deduplicated case-insensitively
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HASHTAG
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .map(|tag| format!("#{}", tag))
        .collect()
}

pub fn hashtag_tool() -> FnTool {
    FnTool::new(
        HASHTAG_TOOL_NAME,
        "Extract the hashtags used in a piece of text.",
        |args| {
            let text = require_str(args, "text")?;
            let tags = extract_hashtags(text);
            if tags.is_empty() {
                Ok("No hashtags found".to_string())
            } else {
                Ok(tags.join(" "))
            }
        },
    )
    .with_schema(json!({
        "type": "object",
        "properties": {
            "text": {"type": "string", "description": "Text to scan"}
        },
        "required": ["text"]
    }))
}
