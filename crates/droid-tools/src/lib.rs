//! droid-tools: Built-in tools for Droid agents
//!
//! Web search, text generation, social posting, engagement (comment replies
//! and influencer interaction) and hashtag extraction, registered into an
//! orchestrator's tool registry.

use std::sync::Arc;

use droid_core::{Config, Orchestrator, Result};

pub mod engage;
pub mod generate;
pub mod hashtags;
pub mod search;
pub mod social;

pub use engage::{InfluencerTool, ReplyCommentTool, INFLUENCER_TOOL_NAME, REPLY_TOOL_NAME};
pub use generate::{GenerateTextTool, GENERATE_TOOL_NAME};
pub use hashtags::{extract_hashtags, hashtag_tool, HASHTAG_TOOL_NAME};
pub use search::{WebSearchTool, SEARCH_TOOL_NAME};
pub use social::{PostSocialTool, POST_TOOL_NAME};

/// Register all default built-in tools with the orchestrator
pub fn register_default_tools(orchestrator: &mut Orchestrator, config: &Config) -> Result<()> {
    let generator = orchestrator.generator();

    orchestrator.register_tool(Arc::new(WebSearchTool::new()))?;
    let generation = &config.llm.generation;

    orchestrator.register_tool(Arc::new(GenerateTextTool::new(
        Arc::clone(&generator),
        generation.clone(),
    )))?;
    orchestrator.register_tool(Arc::new(PostSocialTool::new(&config.social)))?;
    orchestrator.register_tool(Arc::new(ReplyCommentTool::new(
        Arc::clone(&generator),
        generation.clone(),
        &config.social,
    )))?;
    orchestrator.register_tool(Arc::new(InfluencerTool::new(
        generator,
        generation.clone(),
        &config.social,
    )))?;
    orchestrator.register_tool(Arc::new(hashtag_tool()))?;

    tracing::info!(tools = ?orchestrator.list_tools(), "Registered built-in tools");
    Ok(())
}
