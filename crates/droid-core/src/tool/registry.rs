//! Tool registry: registration and invocation by name

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::BoxError;
use crate::llm::ToolDefinition;
use crate::tool::{FnTool, Tool, ToolArgs};
use crate::{Error, Result};

/// Name offered to delegating agents; no registered tool may use it
pub const DELEGATE_TOOL_NAME: &str = "delegate_work";

/// Registry of named tools.
///
/// Written during setup and read afterwards. Registrations are never
/// replaced.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// # Errors
    /// `DuplicateName` if the name is taken, `Validation` for an empty or
    /// reserved name. The existing registration is left unchanged.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();

        if name.trim().is_empty() {
            return Err(Error::Validation("Tool name must not be empty".to_string()));
        }
        if name == DELEGATE_TOOL_NAME {
            return Err(Error::Validation(format!("Tool name '{}' is reserved", name)));
        }
        if self.tools.contains_key(&name) {
            return Err(Error::DuplicateName(format!("tool '{}'", name)));
        }

        info!(tool = %name, "Registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Register a closure as a tool
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(&ToolArgs) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnTool::new(name, description, handler)))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Definitions of every registered tool, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let names = self.names();
        self.definitions_for(&names)
    }

    /// Definitions for the given names, in the given order; unknown names are skipped
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|n| self.tools.get(n))
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect()
    }

    /// Invoke a tool by name.
    ///
    /// # Errors
    /// `UnknownTool` if absent; `ToolExecution` wrapping the handler error or
    /// an error-flagged result. No retry is attempted.
    pub async fn invoke(&self, name: &str, args: ToolArgs) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        debug!(tool = %name, args = ?args, "Invoking tool");
        let started = Instant::now();
        let outcome = tool.execute(args).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) if !result.is_error => {
                info!(tool = %name, elapsed_ms, "Tool finished");
                Ok(result.output)
            }
            Ok(result) => {
                warn!(tool = %name, elapsed_ms, error = %result.output, "Tool reported an error");
                Err(Error::tool(name, result.output))
            }
            Err(err @ Error::ToolExecution { .. }) => {
                warn!(tool = %name, elapsed_ms, error = %err, "Tool failed");
                Err(err)
            }
            Err(err) => {
                warn!(tool = %name, elapsed_ms, error = %err, "Tool failed");
                Err(Error::tool(name, err))
            }
        }
    }
}
