//! Application bootstrap shared by every command

use std::sync::Arc;

use anyhow::Context;
use droid_core::crew::presets;
use droid_core::{Config, Error, LlmClient, MemoryStore, Orchestrator};
use droid_tools::register_default_tools;
use tracing::{info, warn};

/// Build the orchestrator: LLM client, memory store, built-in tools,
/// configured entities and the preset crews
pub fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let client = LlmClient::new(&config.llm).context("Failed to create LLM client")?;
    info!(provider = ?client.provider(), model = %client.model(), "LLM client ready");

    let memory = MemoryStore::new(&config.memory.db_path, config.memory.max_entries)
        .with_context(|| format!("Failed to open memory store at {}", config.memory.db_path))?;

    let mut orchestrator =
        Orchestrator::from_config(config, Arc::new(client), Some(Arc::new(memory)));

    register_default_tools(&mut orchestrator, config)?;
    orchestrator
        .load_from_config(config)
        .context("Invalid agents, tasks or crews in configuration")?;

    for preset in [presets::social_media_team, presets::content_research_team] {
        match preset(&mut orchestrator) {
            Ok(name) => info!(crew = %name, "Loaded preset crew"),
            Err(Error::DuplicateName(name)) => {
                warn!(name = %name, "Preset skipped, name already defined by configuration")
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(orchestrator)
}
