//! Scripted generator double for crew tests

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::config::GenerationConfig;
use crate::llm::{Decision, Generator, ToolDefinition};
use crate::{Error, Result};

enum Reply {
    Decide(Decision),
    Fail(String),
}

/// Answers by matching a needle against the task description of the prompt
/// and records every prompt it receives.
pub(crate) struct ScriptedGenerator {
    rules: Vec<(String, Reply)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, needle: &str, text: &str) -> Self {
        self.rules.push((
            needle.to_string(),
            Reply::Decide(Decision::Respond {
                text: text.to_string(),
            }),
        ));
        self
    }

    pub fn use_tool(mut self, needle: &str, tool: &str, args: JsonValue) -> Self {
        self.rules.push((
            needle.to_string(),
            Reply::Decide(Decision::UseTool {
                name: tool.to_string(),
                args: args.as_object().cloned().unwrap_or_default(),
            }),
        ));
        self
    }

    pub fn fail(mut self, needle: &str, message: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail(message.to_string())));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Task descriptions of the recorded prompts, in call order
    pub fn descriptions(&self) -> Vec<String> {
        self.prompts()
            .iter()
            .map(|p| description_of(p).to_string())
            .collect()
    }

    fn reply(&self, prompt: &str) -> Result<Decision> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let description = description_of(prompt);

        for (needle, reply) in &self.rules {
            if description.contains(needle.as_str()) {
                return match reply {
                    Reply::Decide(decision) => Ok(decision.clone()),
                    Reply::Fail(message) => Err(Error::Generation(message.clone())),
                };
            }
        }

        Ok(Decision::Respond {
            text: format!("done: {}", description),
        })
    }
}

pub(crate) fn description_of(prompt: &str) -> &str {
    let start = prompt
        .find("## Task Description:\n")
        .map(|i| i + "## Task Description:\n".len())
        .unwrap_or(0);
    let rest = &prompt[start..];
    let end = rest.find("\n\n").unwrap_or(rest.len());
    &rest[..end]
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String> {
        match self.reply(prompt)? {
            Decision::Respond { text } => Ok(text),
            Decision::UseTool { name, .. } => {
                Err(Error::Generation(format!("no tools offered, got '{}'", name)))
            }
        }
    }

    async fn decide(
        &self,
        prompt: &str,
        _tools: &[ToolDefinition],
        _config: &GenerationConfig,
    ) -> Result<Decision> {
        self.reply(prompt)
    }
}
