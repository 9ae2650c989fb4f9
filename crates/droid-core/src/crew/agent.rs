//! Agent descriptors

use serde::{Deserialize, Serialize};

/// A named role that performs tasks through generation calls.
///
/// Immutable once created by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    pub goal: String,
    #[serde(default)]
    pub backstory: Option<String>,
    /// Names of registered tools this agent may invoke
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub allow_delegation: bool,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, role: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: None,
            tools: Vec::new(),
            allow_delegation: false,
        }
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = Some(backstory.into());
        self
    }

    pub fn tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    /// Backstory used in prompts, with a generated fallback
    pub fn backstory_text(&self) -> String {
        match &self.backstory {
            Some(b) if !b.trim().is_empty() => b.clone(),
            _ => format!(
                "You are an AI agent named {} with the role of {}.",
                self.name, self.role
            ),
        }
    }

    pub fn can_use(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backstory_fallback() {
        let agent = AgentSpec::new("researcher", "Research Specialist", "Find facts");
        assert_eq!(
            agent.backstory_text(),
            "You are an AI agent named researcher with the role of Research Specialist."
        );

        let agent = agent.backstory("Meticulous.");
        assert_eq!(agent.backstory_text(), "Meticulous.");
    }

    #[test]
    fn test_deserialize_defaults() {
        let agent: AgentSpec = toml::from_str(
            r#"
name = "writer"
role = "Content Writer"
goal = "Write"
"#,
        )
        .unwrap();

        assert!(agent.tools.is_empty());
        assert!(!agent.allow_delegation);
        assert!(!agent.can_use("search_web"));
    }
}
