//! Error types for droid-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error used to carry the original failure of a tool handler
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for droid-core
#[derive(Error, Debug)]
pub enum Error {
    /// An unresolvable name reference found while building agents, tasks or crews
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Unknown crew: {0}")]
    UnknownCrew(String),

    /// The dependency graph of a crew has no valid execution order
    #[error("Dependency cycle in crew '{crew}' involving task '{task}'")]
    Cycle { crew: String, task: String },

    #[error("Tool '{tool}' failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: BoxError,
    },

    /// The language model call failed or produced an unusable decision
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a handler failure for the named tool
    pub fn tool(tool: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            source: source.into(),
        }
    }

    /// Reclassify a failure of the generation backend as `Generation`
    pub fn into_generation(self) -> Self {
        match self {
            Self::Generation(_) => self,
            other => Self::Generation(other.to_string()),
        }
    }

    /// Coarse classification reported in crew run results
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Config(_) => ErrorKind::Validation,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::UnknownAgent(_) => ErrorKind::UnknownAgent,
            Self::UnknownTask(_) | Self::UnknownCrew(_) => ErrorKind::UnknownEntity,
            Self::Cycle { .. } => ErrorKind::Cycle,
            Self::ToolExecution { .. } => ErrorKind::ToolExecution,
            Self::Generation(_) | Self::LlmApi(_) | Self::Http(_) => ErrorKind::Generation,
            Self::Json(_) | Self::Database(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Error classification carried in serialised run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    DuplicateName,
    UnknownTool,
    UnknownAgent,
    UnknownEntity,
    Cycle,
    ToolExecution,
    Generation,
    Internal,
}

/// Result type alias for droid-core
pub type Result<T> = std::result::Result<T, Error>;
