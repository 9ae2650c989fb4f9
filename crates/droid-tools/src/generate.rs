//! generate_text tool: hands a free-form prompt to the configured generator

use std::sync::Arc;

use async_trait::async_trait;
use droid_core::{Error, GenerationConfig, Generator, Result, Tool, ToolArgs, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};

pub const GENERATE_TOOL_NAME: &str = "generate_text";

pub struct GenerateTextTool {
    generator: Arc<dyn Generator>,
    generation: GenerationConfig,
}

impl GenerateTextTool {
    pub fn new(generator: Arc<dyn Generator>, generation: GenerationConfig) -> Self {
        Self {
            generator,
            generation,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateInput {
    prompt: String,
    #[serde(default)]
    max_tokens: Option<u64>,
    #[serde(default)]
    temperature: Option<f32>,
}

#[async_trait]
impl Tool for GenerateTextTool {
    fn name(&self) -> &str {
        GENERATE_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Generate text (posts, captions, drafts) from a prompt using the language model."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "What to write"
                },
                "max_tokens": {
                    "type": "integer",
                    "description": "Upper bound on generated tokens"
                },
                "temperature": {
                    "type": "number",
                    "description": "Sampling temperature"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult> {
        let input: GenerateInput = serde_json::from_value(Value::Object(args))
            .map_err(|e| Error::tool(GENERATE_TOOL_NAME, e))?;

        if input.prompt.trim().is_empty() {
            return Ok(ToolResult::error("Prompt cannot be empty"));
        }

        let mut generation = self.generation.clone();
        if let Some(max_tokens) = input.max_tokens {
            generation.max_tokens = max_tokens;
        }
        if let Some(temperature) = input.temperature {
            generation.temperature = temperature;
        }

        tracing::debug!(max_tokens = generation.max_tokens, "Generating text");

        let text = self
            .generator
            .generate(&input.prompt, &generation)
            .await
            .map_err(|e| Error::tool(GENERATE_TOOL_NAME, e))?;

        Ok(ToolResult::success(text))
    }
}
