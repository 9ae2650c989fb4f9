//! Agent prompt construction

use crate::llm::ToolDefinition;

use super::AgentSpec;

/// Everything an agent sees for one task step
#[derive(Debug, Clone, Default)]
pub struct PromptParts<'a> {
    pub description: &'a str,
    pub expected_output: Option<&'a str>,
    /// Inputs, static context and dependency results, one per line
    pub context: Vec<String>,
    pub memories: &'a [String],
    pub tools: &'a [ToolDefinition],
}

/// Render the decision prompt for `agent`
pub fn build_prompt(agent: &AgentSpec, parts: &PromptParts<'_>) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Agent: {}\n", agent.name));
    prompt.push_str(&format!("## Role: {}\n", agent.role));
    prompt.push_str(&format!("## Goal: {}\n", agent.goal));
    prompt.push_str(&format!("## Backstory: {}\n\n", agent.backstory_text()));

    prompt.push_str("## Task Description:\n");
    prompt.push_str(parts.description);
    prompt.push_str("\n\n");

    if let Some(expected) = parts.expected_output {
        prompt.push_str("## Expected Output:\n");
        prompt.push_str(expected);
        prompt.push_str("\n\n");
    }

    if !parts.context.is_empty() {
        prompt.push_str("## Context:\n");
        for line in &parts.context {
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    if !parts.memories.is_empty() {
        prompt.push_str("## Recent Memories:\n");
        for memory in parts.memories {
            prompt.push_str(&format!("- {}\n", memory));
        }
        prompt.push('\n');
    }

    if !parts.tools.is_empty() {
        prompt.push_str("## Available Tools:\n");
        for tool in parts.tools {
            prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        }
        prompt.push('\n');
    }

    prompt.push_str("Please complete the task based on your role and goal. Be thorough and creative.");
    prompt
}
