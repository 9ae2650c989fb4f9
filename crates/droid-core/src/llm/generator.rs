//! Language generation capability consumed by agents and tools

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::tool::ToolArgs;
use crate::Result;

use super::ToolDefinition;

/// Structured choice returned by a generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Invoke the named tool with these arguments
    UseTool { name: String, args: ToolArgs },
    /// Use the text directly as the output
    Respond { text: String },
}

/// Text generation backend.
///
/// `decide` offers the model a set of tools and returns a tagged choice
/// instead of free text to be parsed.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate plain text for `prompt`
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Ask the model to pick one of `tools` or answer directly
    async fn decide(
        &self,
        prompt: &str,
        tools: &[ToolDefinition],
        config: &GenerationConfig,
    ) -> Result<Decision>;
}
