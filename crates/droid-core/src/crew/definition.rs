//! Crew descriptors and process modes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Execution ordering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Tasks run strictly in listed order
    #[default]
    Sequential,
    /// Tasks run in dependency order
    Hierarchical,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

impl FromStr for Process {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "hierarchical" => Ok(Self::Hierarchical),
            other => Err(format!("Unknown process '{}'", other)),
        }
    }
}

/// A named group of tasks executed as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewSpec {
    pub name: String,
    /// Task names in listed order
    pub tasks: Vec<String>,
    /// Falls back to the orchestrator's default process
    #[serde(default)]
    pub process: Option<Process>,
    #[serde(default = "default_memory_enabled", alias = "memory")]
    pub memory_enabled: bool,
    /// Task whose output is the crew output in hierarchical mode
    #[serde(default)]
    pub root_task: Option<String>,
}

fn default_memory_enabled() -> bool {
    true
}

impl CrewSpec {
    pub fn new<I, S>(name: impl Into<String>, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            tasks: tasks.into_iter().map(Into::into).collect(),
            process: None,
            memory_enabled: true,
            root_task: None,
        }
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = Some(process);
        self
    }

    pub fn memory_enabled(mut self, enabled: bool) -> Self {
        self.memory_enabled = enabled;
        self
    }

    pub fn root_task(mut self, task: impl Into<String>) -> Self {
        self.root_task = Some(task.into());
        self
    }
}
