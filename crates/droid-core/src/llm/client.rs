//! LLM API HTTP Client
//!
//! Supports both Claude API and OpenAI-compatible APIs (llama.cpp, vLLM, ...)

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{GenerationConfig, LlmConfig, LlmProvider};
use crate::error::{Error, Result};

use super::generator::{Decision, Generator};
use super::types::*;

/// LLM API client (supports Claude and OpenAI-compatible APIs)
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: LlmProvider,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(Error::Http)?;

        let base_url = match &config.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match config.provider {
                LlmProvider::Claude => "https://api.anthropic.com/v1".to_string(),
                LlmProvider::OpenAi => "https://api.openai.com/v1".to_string(),
            },
        };

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url,
            provider: config.provider.clone(),
        })
    }

    /// Send a message to the LLM API
    pub async fn messages(&self, request: MessagesRequest) -> Result<MessagesResponse> {
        match self.provider {
            LlmProvider::Claude => self.send_claude_request(request).await,
            LlmProvider::OpenAi => self.send_openai_request(request).await,
        }
    }

    async fn send_claude_request(&self, request: MessagesRequest) -> Result<MessagesResponse> {
        let url = format!("{}/messages", self.base_url);

        debug!("Sending request to Claude API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Claude API error: {} - {}", status, body);
            return Err(Error::LlmApi(format!("{}: {}", status, body)));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            Error::LlmApi(format!("Failed to parse response: {} - {}", e, body))
        })?;

        info!(
            "Claude API response: stop_reason={}, tokens={}",
            parsed.stop_reason,
            parsed.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(parsed)
    }

    async fn send_openai_request(&self, request: MessagesRequest) -> Result<MessagesResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!("Sending request to OpenAI-compatible API: {}", url);

        let openai_request = ChatCompletionRequest::from_claude_request(&request);

        let mut builder = self
            .client
            .post(&url)
            .header("content-type", "application/json");
        // Local servers usually run without a key
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.json(&openai_request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(Error::LlmApi(format!("{}: {}", status, body)));
        }

        let openai_response: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::LlmApi(format!("Failed to parse response: {} - {}", e, body))
        })?;

        let parsed = openai_response.to_claude_response();

        info!(
            "OpenAI API response: stop_reason={}, tokens={}",
            parsed.stop_reason,
            parsed.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(parsed)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let request = MessagesRequest::single_turn(&self.model, prompt, config);
        let response = self.messages(request).await.map_err(Error::into_generation)?;

        match parse_decision(&response)? {
            Decision::Respond { text } => Ok(text),
            Decision::UseTool { name, .. } => Err(Error::Generation(format!(
                "Model requested tool '{}' during plain generation",
                name
            ))),
        }
    }

    async fn decide(
        &self,
        prompt: &str,
        tools: &[ToolDefinition],
        config: &GenerationConfig,
    ) -> Result<Decision> {
        let request = MessagesRequest::single_turn(&self.model, prompt, config).with_tools(tools);
        let response = self.messages(request).await.map_err(Error::into_generation)?;
        parse_decision(&response)
    }
}

/// Turn a model response into a structured decision.
///
/// The first tool_use block wins over any accompanying text.
pub fn parse_decision(response: &MessagesResponse) -> Result<Decision> {
    match response.stop_reason.as_str() {
        "end_turn" | "stop_sequence" | "max_tokens" | "tool_use" => {}
        other => {
            warn!("Unknown stop_reason: {}", other);
            return Err(Error::Generation(format!("Unknown stop_reason: {}", other)));
        }
    }

    let tool_use = response.content.iter().find_map(|c| match c {
        MessageContent::ToolUse { name, input, .. } => Some((name, input)),
        _ => None,
    });

    if let Some((name, input)) = tool_use {
        let args = match input {
            serde_json::Value::Object(map) => map.clone(),
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(Error::Generation(format!(
                    "Arguments for tool '{}' are not an object: {}",
                    name, other
                )));
            }
        };
        return Ok(Decision::UseTool {
            name: name.clone(),
            args,
        });
    }

    let text = text_of(&response.content);
    if text.trim().is_empty() {
        return Err(Error::Generation("Empty response from model".to_string()));
    }

    Ok(Decision::Respond { text })
}
