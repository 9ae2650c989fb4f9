//! droid-core: Droid agent core library
//!
//! LLM client, tool registry, bounded memory store and the crew
//! orchestration engine (agents, tasks, sequential and hierarchical crews).

pub mod config;
pub mod crew;
pub mod error;
pub mod llm;
pub mod memory;
pub mod tool;

pub use config::{
    ApiConfig, Config, GenerationConfig, LlmConfig, LlmProvider, LoggingConfig, ManagementConfig,
    MemoryConfig, SchedulerConfig, SocialConfig,
};
pub use crew::{AgentSpec, CrewInputs, CrewRunResult, CrewSpec, Orchestrator, Process, TaskSpec};
pub use error::{Error, ErrorKind, Result};
pub use llm::{Decision, Generator, LlmClient, Message, MessageContent, ToolDefinition};
pub use memory::{Memory, MemoryFilter, MemoryStore};
pub use tool::{FnTool, Tool, ToolArgs, ToolRegistry, ToolResult};
