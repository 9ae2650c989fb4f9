//! Engagement tools: replying to comments and interacting with influencers
//!
//! Both draft their text with the shared generator when none is given, then
//! go through the same platform webhooks as `post_social`.

use std::sync::Arc;

use async_trait::async_trait;
use droid_core::{
    Error, GenerationConfig, Generator, Result, SocialConfig, Tool, ToolArgs, ToolResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::social::{default_platform, Delivery, Webhooks};

pub const REPLY_TOOL_NAME: &str = "reply_comment";
pub const INFLUENCER_TOOL_NAME: &str = "interact_influencer";

const STYLE_GUIDE: &str = "It should sound natural and conversational, as if written by a real person. \
     Keep it concise (1-2 sentences) and include an appropriate emoji if relevant.";

async fn draft(
    generator: &dyn Generator,
    generation: &GenerationConfig,
    tool: &'static str,
    prompt: &str,
) -> Result<String> {
    let text = generator
        .generate(prompt, generation)
        .await
        .map_err(|e| Error::tool(tool, e))?;
    Ok(text.trim().to_string())
}

// ============================================================================
// reply_comment
// ============================================================================

pub struct ReplyCommentTool {
    generator: Arc<dyn Generator>,
    generation: GenerationConfig,
    webhooks: Webhooks,
}

impl ReplyCommentTool {
    pub fn new(
        generator: Arc<dyn Generator>,
        generation: GenerationConfig,
        social: &SocialConfig,
    ) -> Self {
        Self {
            generator,
            generation,
            webhooks: Webhooks::new(social),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReplyInput {
    #[serde(default = "default_platform")]
    platform: String,
    #[serde(default)]
    comment_id: String,
    #[serde(default)]
    post_id: Option<String>,
    /// Text of the comment being answered
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default = "default_tone")]
    tone: String,
}

fn default_tone() -> String {
    "friendly".to_string()
}

#[derive(Debug, Serialize)]
struct ReplyPayload<'a> {
    action: &'static str,
    platform: &'a str,
    comment_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_id: Option<&'a str>,
    content: &'a str,
}

fn reply_prompt(platform: &str, comment: &str, tone: &str) -> String {
    format!(
        "Generate a {tone} reply to the following comment on {platform}:\n\n\
         Comment: {comment}\n\n\
         The reply should be {tone}, relevant to the comment, and not overly promotional. {STYLE_GUIDE}"
    )
}

#[async_trait]
impl Tool for ReplyCommentTool {
    fn name(&self) -> &str {
        REPLY_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Reply to a comment on a social media platform. The reply is written for you when no content is given."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "platform": {"type": "string", "description": "Platform of the comment (default: twitter)"},
                "comment_id": {"type": "string", "description": "Comment to reply to"},
                "post_id": {"type": "string", "description": "Post containing the comment"},
                "comment": {"type": "string", "description": "Text of the comment"},
                "content": {"type": "string", "description": "Reply text; generated when omitted"},
                "tone": {"type": "string", "description": "Tone of a generated reply (default: friendly)"}
            },
            "required": ["comment_id"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult> {
        let input: ReplyInput = serde_json::from_value(Value::Object(args))
            .map_err(|e| Error::tool(REPLY_TOOL_NAME, e))?;

        if input.comment_id.trim().is_empty() {
            return Ok(ToolResult::error("No comment_id provided"));
        }

        let content = match (&input.content, &input.comment) {
            (Some(content), _) if !content.trim().is_empty() => content.clone(),
            (_, Some(comment)) if !comment.trim().is_empty() => {
                let prompt = reply_prompt(&input.platform, comment, &input.tone);
                draft(
                    self.generator.as_ref(),
                    &self.generation,
                    REPLY_TOOL_NAME,
                    &prompt,
                )
                .await?
            }
            _ => {
                return Ok(ToolResult::error(
                    "Provide either the reply content or the comment text",
                ));
            }
        };

        if content.is_empty() {
            return Ok(ToolResult::error("Generated reply was empty"));
        }

        let payload = ReplyPayload {
            action: "reply",
            platform: &input.platform,
            comment_id: &input.comment_id,
            post_id: input.post_id.as_deref(),
            content: &content,
        };

        self.webhooks
            .deliver(Delivery {
                tool: REPLY_TOOL_NAME,
                platform: &input.platform,
                payload: &payload,
                preview: format!(
                    "reply to comment {} on {}: {}",
                    input.comment_id, input.platform, content
                ),
                done: format!(
                    "Replied to comment {} on {}: {}",
                    input.comment_id, input.platform, content
                ),
            })
            .await
    }
}

// ============================================================================
// interact_influencer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Interaction {
    Comment,
    Like,
    Follow,
}

impl Interaction {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "comment" => Some(Self::Comment),
            "like" => Some(Self::Like),
            "follow" => Some(Self::Follow),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Like => "like",
            Self::Follow => "follow",
        }
    }
}

pub struct InfluencerTool {
    generator: Arc<dyn Generator>,
    generation: GenerationConfig,
    webhooks: Webhooks,
}

impl InfluencerTool {
    pub fn new(
        generator: Arc<dyn Generator>,
        generation: GenerationConfig,
        social: &SocialConfig,
    ) -> Self {
        Self {
            generator,
            generation,
            webhooks: Webhooks::new(social),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InfluencerInput {
    #[serde(default = "default_platform")]
    platform: String,
    #[serde(default)]
    influencer_id: String,
    #[serde(default = "default_interaction")]
    interaction_type: String,
    #[serde(default)]
    post_id: Option<String>,
    /// Text of the influencer's post, used when drafting a comment
    #[serde(default)]
    post_content: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

fn default_interaction() -> String {
    "comment".to_string()
}

#[derive(Debug, Serialize)]
struct InfluencerPayload<'a> {
    action: Interaction,
    platform: &'a str,
    influencer_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

fn influencer_prompt(platform: &str, post_content: Option<&str>) -> String {
    let mut prompt = format!(
        "Generate an engaging and authentic comment for an influencer's post on {platform}.\n\n"
    );
    if let Some(post) = post_content.filter(|p| !p.trim().is_empty()) {
        prompt.push_str(&format!("Post content: {post}\n\n"));
    }
    prompt.push_str(
        "The comment should be friendly, relevant to the post content, and not overly promotional. ",
    );
    prompt.push_str(STYLE_GUIDE);
    prompt
}

#[async_trait]
impl Tool for InfluencerTool {
    fn name(&self) -> &str {
        INFLUENCER_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Comment on, like or follow an influencer on a social media platform."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "platform": {"type": "string", "description": "Platform (default: twitter)"},
                "influencer_id": {"type": "string", "description": "Account to interact with"},
                "interaction_type": {
                    "type": "string",
                    "enum": ["comment", "like", "follow"],
                    "description": "Kind of interaction (default: comment)"
                },
                "post_id": {"type": "string", "description": "Post to comment on or like"},
                "post_content": {"type": "string", "description": "Text of the post, used to write a comment"},
                "content": {"type": "string", "description": "Comment text; generated when omitted"}
            },
            "required": ["influencer_id"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult> {
        let input: InfluencerInput = serde_json::from_value(Value::Object(args))
            .map_err(|e| Error::tool(INFLUENCER_TOOL_NAME, e))?;

        if input.influencer_id.trim().is_empty() {
            return Ok(ToolResult::error("No influencer_id provided"));
        }

        let Some(interaction) = Interaction::parse(&input.interaction_type) else {
            return Ok(ToolResult::error(format!(
                "Unsupported interaction type: {}",
                input.interaction_type
            )));
        };

        if interaction != Interaction::Follow && input.post_id.is_none() {
            return Ok(ToolResult::error(format!(
                "A post_id is required to {} a post",
                interaction.as_str()
            )));
        }

        let content = match interaction {
            Interaction::Comment => match input.content.as_deref() {
                Some(content) if !content.trim().is_empty() => Some(content.to_string()),
                _ => {
                    let prompt =
                        influencer_prompt(&input.platform, input.post_content.as_deref());
                    let text = draft(
                        self.generator.as_ref(),
                        &self.generation,
                        INFLUENCER_TOOL_NAME,
                        &prompt,
                    )
                    .await?;
                    if text.is_empty() {
                        return Ok(ToolResult::error("Generated comment was empty"));
                    }
                    Some(text)
                }
            },
            Interaction::Like | Interaction::Follow => None,
        };

        let payload = InfluencerPayload {
            action: interaction,
            platform: &input.platform,
            influencer_id: &input.influencer_id,
            post_id: input.post_id.as_deref(),
            content: content.as_deref(),
        };

        let mut summary = format!(
            "{} {} on {}",
            interaction.as_str(),
            input.influencer_id,
            input.platform
        );
        if let Some(content) = &content {
            summary.push_str(&format!(": {}", content));
        }

        self.webhooks
            .deliver(Delivery {
                tool: INFLUENCER_TOOL_NAME,
                platform: &input.platform,
                payload: &payload,
                preview: summary.clone(),
                done: format!("Done: {}", summary),
            })
            .await
    }
}
