//! Outward-facing result of a crew run

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, ErrorKind};

/// Result of one crew run.
///
/// On failure `task_outputs` holds only the tasks that completed before
/// the failing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewRunResult {
    pub crew: String,
    pub success: bool,
    /// Output of the root task (empty on failure)
    pub output: String,
    pub task_outputs: BTreeMap<String, String>,
    /// Tasks in the order they completed
    pub execution_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl CrewRunResult {
    pub fn success(
        crew: impl Into<String>,
        output: impl Into<String>,
        task_outputs: BTreeMap<String, String>,
        execution_order: Vec<String>,
    ) -> Self {
        Self {
            crew: crew.into(),
            success: true,
            output: output.into(),
            task_outputs,
            execution_order,
            error: None,
            failed_task: None,
            error_kind: None,
        }
    }

    /// Failure before any task ran (validation, cycle, unknown references)
    pub fn rejected(crew: impl Into<String>, error: &Error) -> Self {
        Self::failed(crew, error, None, BTreeMap::new(), Vec::new())
    }

    pub fn failed(
        crew: impl Into<String>,
        error: &Error,
        failed_task: Option<String>,
        task_outputs: BTreeMap<String, String>,
        execution_order: Vec<String>,
    ) -> Self {
        let message = match &failed_task {
            Some(task) => format!("Task '{}' failed: {}", task, error),
            None => error.to_string(),
        };

        Self {
            crew: crew.into(),
            success: false,
            output: String::new(),
            task_outputs,
            execution_order,
            error: Some(message),
            failed_task,
            error_kind: Some(error.kind()),
        }
    }

    /// Text stored as the memory record content
    pub fn summary(&self) -> String {
        match &self.error {
            Some(error) => error.clone(),
            None => self.output.clone(),
        }
    }

    /// Memory record metadata
    pub fn metadata(&self) -> serde_json::Value {
        json!({
            "success": self.success,
            "task_outputs": self.task_outputs,
            "execution_order": self.execution_order,
            "error": self.error,
            "failed_task": self.failed_task,
        })
    }
}
