//! Tool trait definition
//!
//! Defines the core trait for capabilities an agent may invoke by name.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::error::BoxError;
use crate::Result;

/// Keyword arguments passed to a tool
pub type ToolArgs = serde_json::Map<String, JsonValue>;

/// Tool execution result
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Output string from tool execution
    pub output: String,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }
}

/// A named capability that agents can invoke.
///
/// Implementations are treated as unreliable external calls: a returned
/// error or an error-flagged [`ToolResult`] fails the calling task.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name (unique within a registry)
    fn name(&self) -> &str;

    /// Get the tool description (shown to the model when selecting tools)
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's input parameters
    fn input_schema(&self) -> JsonValue;

    /// Execute the tool with the given keyword arguments
    async fn execute(&self, args: ToolArgs) -> Result<ToolResult>;
}

type Handler = dyn Fn(&ToolArgs) -> std::result::Result<String, BoxError> + Send + Sync;

/// Tool backed by a plain closure
pub struct FnTool {
    name: String,
    description: String,
    schema: JsonValue,
    handler: Box<Handler>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ToolArgs) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema: json!({"type": "object", "properties": {}}),
            handler: Box::new(handler),
        }
    }

    /// Replace the default open object schema
    pub fn with_schema(mut self, schema: JsonValue) -> Self {
        self.schema = schema;
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> JsonValue {
        self.schema.clone()
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult> {
        (self.handler)(&args)
            .map(ToolResult::success)
            .map_err(|e| crate::Error::tool(&self.name, e))
    }
}

/// Read a required string argument
pub fn require_str<'a>(args: &'a ToolArgs, key: &str) -> std::result::Result<&'a str, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing required argument: {}", key))
}
