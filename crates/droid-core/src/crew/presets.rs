//! Predefined crews
//!
//! Agents get whichever of their preferred built-in tools are registered.

use super::{AgentSpec, CrewSpec, Orchestrator, Process, TaskSpec};
use crate::Result;

pub const SOCIAL_MEDIA_TEAM: &str = "social_media_team";
pub const CONTENT_RESEARCH_TEAM: &str = "content_research_team";

fn registered(orchestrator: &Orchestrator, preferred: &[&str]) -> Vec<String> {
    preferred
        .iter()
        .filter(|t| orchestrator.tools().contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Trend analyst -> content creator -> engagement manager
pub fn social_media_team(orchestrator: &mut Orchestrator) -> Result<String> {
    let analyst_tools = registered(orchestrator, &["search_web", "extract_hashtags"]);
    let creator_tools = registered(orchestrator, &["generate_text", "extract_hashtags"]);
    let manager_tools = registered(
        orchestrator,
        &["post_social", "reply_comment", "interact_influencer"],
    );

    orchestrator.create_agent(
        AgentSpec::new("trend_analyst", "Trend Analyst", "Identify trending topics and hashtags")
            .backstory("You are an expert at spotting trends before they go viral.")
            .tools(analyst_tools),
    )?;
    orchestrator.create_agent(
        AgentSpec::new("content_creator", "Content Creator", "Create engaging social media content")
            .backstory(
                "You are a creative content creator who specializes in creating viral social media posts.",
            )
            .tools(creator_tools),
    )?;
    orchestrator.create_agent(
        AgentSpec::new(
            "engagement_manager",
            "Engagement Manager",
            "Maximize engagement on social media posts",
        )
        .backstory("You know exactly how to get people to like, comment, and share content.")
        .tools(manager_tools),
    )?;

    orchestrator.create_task(
        TaskSpec::new(
            "analyze_trends",
            "Identify the top 3 trending topics in the specified niche",
            "trend_analyst",
        )
        .expected_output("A list of trending topics with hashtags and brief explanations"),
    )?;
    orchestrator.create_task(
        TaskSpec::new(
            "create_content",
            "Create social media content based on the trending topics:\n{analyze_trends}",
            "content_creator",
        )
        .expected_output("Social media post text, image description, and hashtags"),
    )?;
    orchestrator.create_task(
        TaskSpec::new(
            "optimize_engagement",
            "Optimize the content for maximum engagement:\n{create_content}",
            "engagement_manager",
        )
        .expected_output("Optimized social media post with posting schedule recommendations"),
    )?;

    orchestrator.create_crew(
        CrewSpec::new(
            SOCIAL_MEDIA_TEAM,
            ["analyze_trends", "create_content", "optimize_engagement"],
        )
        .process(Process::Sequential),
    )?;

    Ok(SOCIAL_MEDIA_TEAM.to_string())
}

/// Researcher -> writer -> editor
pub fn content_research_team(orchestrator: &mut Orchestrator) -> Result<String> {
    let researcher_tools = registered(orchestrator, &["search_web"]);
    let writer_tools = registered(orchestrator, &["generate_text"]);

    orchestrator.create_agent(
        AgentSpec::new("researcher", "Research Specialist", "Find accurate and relevant information")
            .backstory("You are a meticulous researcher who leaves no stone unturned.")
            .tools(researcher_tools),
    )?;
    orchestrator.create_agent(
        AgentSpec::new("writer", "Content Writer", "Create informative and engaging content")
            .backstory("You can explain complex topics in an accessible and engaging way.")
            .tools(writer_tools),
    )?;
    orchestrator.create_agent(
        AgentSpec::new(
            "editor",
            "Content Editor",
            "Ensure content is accurate, engaging, and well-structured",
        )
        .backstory("You have a keen eye for detail and know how to make content shine."),
    )?;

    orchestrator.create_task(
        TaskSpec::new("research_topic", "Research the specified topic thoroughly", "researcher")
            .expected_output("Comprehensive research notes with sources"),
    )?;
    orchestrator.create_task(
        TaskSpec::new(
            "write_content",
            "Write a comprehensive article based on the research:\n{research_topic}",
            "writer",
        )
        .expected_output("Draft article with headings, paragraphs, and citations"),
    )?;
    orchestrator.create_task(
        TaskSpec::new("edit_content", "Edit and polish the article:\n{write_content}", "editor")
            .expected_output("Final polished article ready for publication"),
    )?;

    orchestrator.create_crew(
        CrewSpec::new(
            CONTENT_RESEARCH_TEAM,
            ["research_topic", "write_content", "edit_content"],
        )
        .process(Process::Sequential),
    )?;

    Ok(CONTENT_RESEARCH_TEAM.to_string())
}
