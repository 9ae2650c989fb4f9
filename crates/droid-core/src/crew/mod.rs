//! Crew orchestration
//!
//! Agents (roles with permitted tools) perform tasks (description templates
//! with dependencies); crews group tasks and run them sequentially or in
//! dependency order. The [`Orchestrator`] owns all definitions and drives
//! runs.

mod agent;
mod definition;
mod engine;
mod orchestrator;
pub mod plan;
pub mod presets;
mod prompt;
mod result;
mod task;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use agent::AgentSpec;
pub use definition::{CrewSpec, Process};
pub use engine::{CrewEngine, CrewInputs};
pub use orchestrator::Orchestrator;
pub use plan::{build_plan, ExecutionPlan};
pub use prompt::{build_prompt, PromptParts};
pub use result::CrewRunResult;
pub use task::TaskSpec;
