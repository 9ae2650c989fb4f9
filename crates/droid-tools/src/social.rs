//! post_social tool: publishes content through per-platform webhooks
//!
//! With `dry_run` enabled (the default) nothing leaves the process; the post
//! is logged and described in the tool output instead.

use std::collections::HashMap;

use async_trait::async_trait;
use droid_core::{Error, Result, SocialConfig, Tool, ToolArgs, ToolResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const POST_TOOL_NAME: &str = "post_social";

/// Per-platform webhook delivery shared by the social tools
pub(crate) struct Webhooks {
    client: Client,
    dry_run: bool,
    urls: HashMap<String, String>,
}

/// One outgoing webhook call and how to describe it
pub(crate) struct Delivery<'a, T> {
    pub tool: &'static str,
    pub platform: &'a str,
    pub payload: &'a T,
    /// Completes "Would ..." in dry-run output
    pub preview: String,
    /// Output on success
    pub done: String,
}

impl Webhooks {
    pub(crate) fn new(config: &SocialConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            dry_run: config.dry_run,
            urls: config.webhooks.clone(),
        }
    }

    pub(crate) fn platforms(&self) -> Vec<&String> {
        let mut platforms: Vec<&String> = self.urls.keys().collect();
        platforms.sort();
        platforms
    }

    pub(crate) async fn deliver<T: Serialize + Sync>(
        &self,
        delivery: Delivery<'_, T>,
    ) -> Result<ToolResult> {
        let platform = delivery.platform;

        if self.dry_run {
            tracing::info!(tool = delivery.tool, platform = %platform, "Dry run, nothing sent");
            return Ok(ToolResult::success(format!(
                "[dry run] Would {}",
                delivery.preview
            )));
        }

        let Some(url) = self.urls.get(platform) else {
            return Ok(ToolResult::error(format!(
                "Platform {} not configured",
                platform
            )));
        };

        tracing::info!(tool = delivery.tool, platform = %platform, "Calling platform webhook");

        let response = self
            .client
            .post(url)
            .json(delivery.payload)
            .send()
            .await
            .map_err(|e| Error::tool(delivery.tool, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(ToolResult::error(format!(
                "{} on {} failed ({}): {}",
                delivery.tool, platform, status, body
            )));
        }

        Ok(ToolResult::success(delivery.done))
    }
}

pub struct PostSocialTool {
    webhooks: Webhooks,
}

impl PostSocialTool {
    pub fn new(config: &SocialConfig) -> Self {
        Self {
            webhooks: Webhooks::new(config),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct PostInput {
    #[serde(default = "default_platform")]
    platform: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    media_urls: Vec<String>,
}

pub(crate) fn default_platform() -> String {
    "twitter".to_string()
}

#[async_trait]
impl Tool for PostSocialTool {
    fn name(&self) -> &str {
        POST_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Publish a post to a social media platform."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "platform": {
                    "type": "string",
                    "description": format!("Target platform (default: twitter). Configured: {:?}", self.webhooks.platforms())
                },
                "content": {
                    "type": "string",
                    "description": "Text of the post"
                },
                "media_urls": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Media to attach"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult> {
        let input: PostInput = serde_json::from_value(Value::Object(args))
            .map_err(|e| Error::tool(POST_TOOL_NAME, e))?;

        if input.content.trim().is_empty() && input.media_urls.is_empty() {
            return Ok(ToolResult::error("No content or media provided"));
        }

        self.webhooks
            .deliver(Delivery {
                tool: POST_TOOL_NAME,
                platform: &input.platform,
                payload: &input,
                preview: format!("post to {}: {}", input.platform, input.content),
                done: format!("Posted to {}", input.platform),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    fn live(platform: &str, url: String) -> PostSocialTool {
        PostSocialTool::new(&SocialConfig {
            dry_run: false,
            webhooks: HashMap::from([(platform.to_string(), url)]),
        })
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let tool = PostSocialTool::new(&SocialConfig::default());
        let result = tool
            .execute(args(json!({"content": "hello"})))
            .await
            .unwrap();

        assert!(!result.is_error);
        assert_eq!(result.output, "[dry run] Would post to twitter: hello");
    }

    #[tokio::test]
    async fn test_empty_post_rejected() {
        let tool = PostSocialTool::new(&SocialConfig::default());
        let result = tool.execute(args(json!({"content": ""}))).await.unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_webhook_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({"platform": "mastodon", "content": "hi"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let tool = live("mastodon", format!("{}/hook", server.uri()));
        let result = tool
            .execute(args(json!({"platform": "mastodon", "content": "hi"})))
            .await
            .unwrap();

        assert_eq!(result.output, "Posted to mastodon");
    }

    #[tokio::test]
    async fn test_webhook_rejection_is_error_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let tool = live("twitter", server.uri());
        let result = tool
            .execute(args(json!({"content": "hi"})))
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.output.contains("slow down"));
    }

    #[tokio::test]
    async fn test_unconfigured_platform() {
        let tool = live("twitter", "http://127.0.0.1:9".to_string());
        let result = tool
            .execute(args(json!({"platform": "facebook", "content": "hi"})))
            .await
            .unwrap();

        assert!(result.is_error);
        assert_eq!(result.output, "Platform facebook not configured");
    }
}
