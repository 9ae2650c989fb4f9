//! Task descriptors

use serde::{Deserialize, Serialize};

/// One unit of work assigned to an agent.
///
/// `description` is a template: `{name}` placeholders are replaced with the
/// outputs of dependencies and with crew inputs at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub description: String,
    /// Name of the assigned agent
    pub agent: String,
    #[serde(default)]
    pub expected_output: Option<String>,
    /// `None` means "unspecified": in sequential crews the task then depends
    /// on the task listed before it
    #[serde(default)]
    pub depends_on: Option<Vec<String>>,
    /// Static context lines included in the prompt
    #[serde(default)]
    pub context: Vec<String>,
}

impl TaskSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent: agent.into(),
            expected_output: None,
            depends_on: None,
            context: Vec::new(),
        }
    }

    pub fn expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn context<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Explicit dependencies, empty when unspecified
    pub fn declared_dependencies(&self) -> &[String] {
        self.depends_on.as_deref().unwrap_or(&[])
    }
}
