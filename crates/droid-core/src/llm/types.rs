//! Wire types for the Claude Messages API and OpenAI-compatible chat completions

use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;

/// Message in conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![MessageContent::Text { text: text.into() }],
        }
    }

    /// Get text content from message
    pub fn text_content(&self) -> String {
        text_of(&self.content)
    }
}

/// Join the text blocks of a content list
pub fn text_of(content: &[MessageContent]) -> String {
    content
        .iter()
        .filter_map(|c| match c {
            MessageContent::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Content block in a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

/// Tool definition offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Messages API request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Not part of the Claude API; forwarded to OpenAI-compatible servers only
    #[serde(skip)]
    pub repetition_penalty: Option<f32>,
}

impl MessagesRequest {
    /// Single-turn request carrying the sampling parameters of `config`
    pub fn single_turn(model: &str, prompt: &str, config: &GenerationConfig) -> Self {
        Self {
            model: model.to_string(),
            max_tokens: config.max_tokens,
            system: None,
            messages: vec![Message::user(prompt)],
            tools: None,
            temperature: Some(config.temperature),
            top_p: Some(config.top_p),
            repetition_penalty: Some(config.repetition_penalty),
        }
    }

    pub fn with_tools(mut self, tools: &[ToolDefinition]) -> Self {
        self.tools = if tools.is_empty() {
            None
        } else {
            Some(tools.to_vec())
        };
        self
    }
}

/// Messages API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: String,
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub model: String,
    pub stop_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

// ============================================================================
// OpenAI-compatible types (llama.cpp server, vLLM, Ollama, ...)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.clone(),
            content: msg.text_content(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&ToolDefinition> for OpenAiTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        }
    }
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiTool>>,
}

impl ChatCompletionRequest {
    /// Convert from Claude-style request
    pub fn from_claude_request(req: &MessagesRequest) -> Self {
        let mut messages = Vec::new();

        if let Some(system) = &req.system {
            messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(req.messages.iter().map(OpenAiMessage::from));

        let tools = req
            .tools
            .as_ref()
            .map(|t| t.iter().map(OpenAiTool::from).collect());

        Self {
            model: req.model.clone(),
            messages,
            max_tokens: Some(req.max_tokens),
            temperature: req.temperature,
            top_p: req.top_p,
            repetition_penalty: req.repetition_penalty,
            tools,
        }
    }
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessageResponse,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallResponse>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub id: String,
    pub function: FunctionCallResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallResponse {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenAiUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl ChatCompletionResponse {
    /// Convert to Claude-style response.
    ///
    /// Tool call arguments that are not valid JSON become `Null`, which the
    /// decision parser rejects.
    pub fn to_claude_response(&self) -> MessagesResponse {
        let choice = self.choices.first();

        let mut content = Vec::new();
        if let Some(c) = choice {
            if let Some(text) = c.message.content.as_ref().filter(|t| !t.is_empty()) {
                content.push(MessageContent::Text { text: text.clone() });
            }

            for tc in c.message.tool_calls.iter().flatten() {
                let input = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::Null);
                content.push(MessageContent::ToolUse {
                    id: tc.id.clone(),
                    name: tc.function.name.clone(),
                    input,
                });
            }
        }

        let stop_reason = match choice.and_then(|c| c.finish_reason.as_deref()) {
            Some("stop") | None => "end_turn".to_string(),
            Some("tool_calls") => "tool_use".to_string(),
            Some("length") => "max_tokens".to_string(),
            Some(other) => other.to_string(),
        };

        MessagesResponse {
            id: self.id.clone(),
            content,
            model: self.model.clone(),
            stop_reason,
            usage: self.usage.as_ref().map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_omits_repetition_penalty_for_claude() {
        let config = GenerationConfig::default();
        let req = MessagesRequest::single_turn("claude", "hi", &config);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["max_tokens"], 2048);
        assert!(json.get("temperature").is_some());
        assert!(json.get("repetition_penalty").is_none());
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_openai_request_carries_sampling_params() {
        let config = GenerationConfig {
            repetition_penalty: 1.3,
            ..GenerationConfig::default()
        };
        let tool = ToolDefinition::new("search_web", "Search", json!({"type": "object"}));
        let req = MessagesRequest::single_turn("llama", "hi", &config).with_tools(&[tool]);

        let openai = ChatCompletionRequest::from_claude_request(&req);
        assert_eq!(openai.repetition_penalty, Some(1.3));
        assert_eq!(openai.messages.len(), 1);
        assert_eq!(openai.messages[0].content, "hi");

        let tools = openai.tools.unwrap();
        assert_eq!(tools[0].tool_type, "function");
        assert_eq!(tools[0].function.name, "search_web");
    }

    #[test]
    fn test_openai_tool_call_conversion() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "cmpl-1",
            "model": "llama",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "search_web", "arguments": "{\"query\":\"rust\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let converted = response.to_claude_response();
        assert_eq!(converted.stop_reason, "tool_use");
        match &converted.content[0] {
            MessageContent::ToolUse { name, input, .. } => {
                assert_eq!(name, "search_web");
                assert_eq!(input["query"], "rust");
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_openai_text_conversion() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "hello"}, "finish_reason": "stop"}]
        }))
        .unwrap();

        let converted = response.to_claude_response();
        assert_eq!(converted.stop_reason, "end_turn");
        assert_eq!(text_of(&converted.content), "hello");
    }
}
