//! Orchestrator: builds agents, tasks and crews and drives crew runs
//!
//! The orchestrator is the explicit context object for a process: it owns
//! the tool registry, the generator, the optional memory store and all
//! entity definitions. References are validated when entities are created,
//! so a crew that was accepted can only fail at run time through its agents
//! and tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::engine::{CrewEngine, CrewInputs};
use super::plan::build_plan;
use super::{AgentSpec, CrewRunResult, CrewSpec, TaskSpec};
use crate::config::{Config, GenerationConfig, ManagementConfig};
use crate::error::BoxError;
use crate::llm::Generator;
use crate::memory::MemoryStore;
use crate::tool::{Tool, ToolArgs, ToolRegistry, DELEGATE_TOOL_NAME};
use crate::{Error, Result};

pub struct Orchestrator {
    tools: ToolRegistry,
    generator: Arc<dyn Generator>,
    memory: Option<Arc<MemoryStore>>,
    management: ManagementConfig,
    generation: GenerationConfig,
    agents: BTreeMap<String, AgentSpec>,
    tasks: BTreeMap<String, TaskSpec>,
    crews: BTreeMap<String, CrewSpec>,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            tools: ToolRegistry::new(),
            generator,
            memory: None,
            management: ManagementConfig::default(),
            generation: GenerationConfig::default(),
            agents: BTreeMap::new(),
            tasks: BTreeMap::new(),
            crews: BTreeMap::new(),
        }
    }

    /// Orchestrator configured from `config` (process, prompt memory, sampling)
    pub fn from_config(
        config: &Config,
        generator: Arc<dyn Generator>,
        memory: Option<Arc<MemoryStore>>,
    ) -> Self {
        let mut orchestrator = Self::new(generator)
            .with_management(config.management.clone())
            .with_generation(config.llm.generation.clone());
        orchestrator.memory = memory;
        orchestrator
    }

    pub fn with_memory(mut self, memory: Arc<MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_management(mut self, management: ManagementConfig) -> Self {
        self.management = management;
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn memory(&self) -> Option<&Arc<MemoryStore>> {
        self.memory.as_ref()
    }

    pub fn generator(&self) -> Arc<dyn Generator> {
        self.generator.clone()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn management(&self) -> &ManagementConfig {
        &self.management
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        self.tools.register(tool)
    }

    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(&ToolArgs) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        self.tools.register_fn(name, description, handler)
    }

    /// Add an agent after checking that every tool it names is registered
    pub fn create_agent(&mut self, agent: AgentSpec) -> Result<()> {
        require_name("Agent", &agent.name)?;
        if self.agents.contains_key(&agent.name) {
            return Err(Error::DuplicateName(format!("agent '{}'", agent.name)));
        }

        for tool in &agent.tools {
            if tool == DELEGATE_TOOL_NAME {
                return Err(Error::Validation(format!(
                    "Agent '{}' lists '{}'; use allow_delegation instead",
                    agent.name, DELEGATE_TOOL_NAME
                )));
            }
            if !self.tools.contains(tool) {
                return Err(Error::Validation(format!(
                    "Agent '{}' references unknown tool '{}'",
                    agent.name, tool
                )));
            }
        }

        info!(agent = %agent.name, role = %agent.role, tools = agent.tools.len(), "Created agent");
        self.agents.insert(agent.name.clone(), agent);
        Ok(())
    }

    /// Add a task after checking its agent exists
    pub fn create_task(&mut self, task: TaskSpec) -> Result<()> {
        require_name("Task", &task.name)?;
        if self.tasks.contains_key(&task.name) {
            return Err(Error::DuplicateName(format!("task '{}'", task.name)));
        }
        if !self.agents.contains_key(&task.agent) {
            return Err(Error::Validation(format!(
                "Task '{}' references unknown agent '{}'",
                task.name, task.agent
            )));
        }
        if task.declared_dependencies().contains(&task.name) {
            return Err(Error::Validation(format!(
                "Task '{}' depends on itself",
                task.name
            )));
        }

        info!(task = %task.name, agent = %task.agent, "Created task");
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    /// Add a crew after checking its tasks, dependencies and ordering
    pub fn create_crew(&mut self, crew: CrewSpec) -> Result<()> {
        require_name("Crew", &crew.name)?;
        if self.crews.contains_key(&crew.name) {
            return Err(Error::DuplicateName(format!("crew '{}'", crew.name)));
        }
        if crew.tasks.is_empty() {
            return Err(Error::Validation(format!("Crew '{}' has no tasks", crew.name)));
        }

        let tasks = crew
            .tasks
            .iter()
            .map(|name| {
                self.tasks.get(name).ok_or_else(|| {
                    Error::Validation(format!(
                        "Crew '{}' references unknown task '{}'",
                        crew.name, name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let process = crew.process.unwrap_or(self.management.process);
        build_plan(&crew.name, process, &tasks)?;

        if let Some(root) = &crew.root_task {
            if !crew.tasks.contains(root) {
                return Err(Error::Validation(format!(
                    "Root task '{}' is not part of crew '{}'",
                    root, crew.name
                )));
            }
        }

        info!(crew = %crew.name, process = %process, tasks = crew.tasks.len(), "Created crew");
        self.crews.insert(crew.name.clone(), crew);
        Ok(())
    }

    /// Build the predefined agents, tasks and crews from configuration
    pub fn load_from_config(&mut self, config: &Config) -> Result<()> {
        for agent in &config.agents {
            self.create_agent(agent.clone())?;
        }
        for task in &config.tasks {
            self.create_task(task.clone())?;
        }
        for crew in &config.crews {
            self.create_crew(crew.clone())?;
        }

        info!(
            agents = config.agents.len(),
            tasks = config.tasks.len(),
            crews = config.crews.len(),
            "Loaded entities from configuration"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Run a crew to completion.
    ///
    /// # Errors
    /// Only `UnknownCrew`; every other failure is reported in the result.
    pub async fn run_crew(&self, name: &str, inputs: &CrewInputs) -> Result<CrewRunResult> {
        let crew = self
            .crews
            .get(name)
            .ok_or_else(|| Error::UnknownCrew(name.to_string()))?;

        let engine = CrewEngine {
            tools: &self.tools,
            generator: self.generator.as_ref(),
            generation: &self.generation,
            agents: &self.agents,
            tasks: &self.tasks,
            memory: self.memory.as_deref(),
            prompt_memory_entries: self.management.prompt_memory_entries,
            default_process: self.management.process,
        };

        let result = engine.run(crew, inputs).await;
        if !result.success {
            warn!(
                crew = %name,
                failed_task = result.failed_task.as_deref().unwrap_or("-"),
                "Crew run failed"
            );
        }
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn get_agent(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.get(name)
    }

    pub fn get_task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn get_crew(&self, name: &str) -> Option<&CrewSpec> {
        self.crews.get(name)
    }

    /// Agent names, sorted
    pub fn list_agents(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn list_tasks(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    pub fn list_crews(&self) -> Vec<String> {
        self.crews.keys().cloned().collect()
    }

    pub fn list_tools(&self) -> Vec<String> {
        self.tools.names()
    }
}

fn require_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(format!("{} name must not be empty", kind)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::presets;
    use crate::crew::testing::ScriptedGenerator;
    use crate::crew::Process;
    use crate::error::ErrorKind;
    use crate::memory::{MemoryFilter, CREW_RESULT_CATEGORY};
    use serde_json::json;

    fn orchestrator(generator: &Arc<ScriptedGenerator>) -> Orchestrator {
        Orchestrator::new(generator.clone())
    }

    /// researcher -> writer demo crew with `t2` templated on `t1`
    fn demo(orch: &mut Orchestrator, process: Process) {
        orch.create_agent(AgentSpec::new("researcher", "Research Specialist", "Find facts"))
            .unwrap();
        orch.create_agent(AgentSpec::new("writer", "Content Writer", "Write summaries"))
            .unwrap();
        orch.create_task(TaskSpec::new("t1", "Research Topic X", "researcher"))
            .unwrap();
        orch.create_task(TaskSpec::new("t2", "Summarize: {t1}", "writer").depends_on(["t1"]))
            .unwrap();
        orch.create_crew(CrewSpec::new("demo", ["t1", "t2"]).process(process))
            .unwrap();
    }

    #[tokio::test]
    async fn test_dependency_output_resolved_into_description() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond("Research Topic X", "Topic X facts")
                .respond("Summarize:", "Short summary"),
        );
        let mut orch = orchestrator(&generator);
        demo(&mut orch, Process::Sequential);

        let result = orch.run_crew("demo", &CrewInputs::new()).await.unwrap();

        assert!(result.success, "{:?}", result.error);
        assert_eq!(
            generator.descriptions(),
            vec!["Research Topic X", "Summarize: Topic X facts"]
        );
        assert!(generator.prompts()[1].contains("Result from t1: Topic X facts"));
        assert_eq!(result.output, "Short summary");
        assert_eq!(result.task_outputs["t1"], "Topic X facts");
        assert_eq!(result.task_outputs["t2"], "Short summary");
    }

    #[tokio::test]
    async fn test_sequential_runs_in_listed_order() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("worker", "Worker", "Work")).unwrap();
        for name in ["c", "a", "b"] {
            orch.create_task(TaskSpec::new(name, format!("step {}", name), "worker"))
                .unwrap();
        }
        orch.create_crew(CrewSpec::new("ordered", ["c", "a", "b"])).unwrap();

        let result = orch.run_crew("ordered", &CrewInputs::new()).await.unwrap();

        assert_eq!(result.execution_order, vec!["c", "a", "b"]);
        assert_eq!(generator.descriptions(), vec!["step c", "step a", "step b"]);
        assert_eq!(result.output, "done: step b");
    }

    #[tokio::test]
    async fn test_sequential_implicit_previous_dependency() {
        let generator = Arc::new(ScriptedGenerator::new().respond("first", "ONE"));
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("worker", "Worker", "Work")).unwrap();
        orch.create_task(TaskSpec::new("a", "first", "worker")).unwrap();
        orch.create_task(TaskSpec::new("b", "second after {a}", "worker")).unwrap();
        orch.create_crew(CrewSpec::new("chain", ["a", "b"])).unwrap();

        let result = orch.run_crew("chain", &CrewInputs::new()).await.unwrap();
        assert_eq!(result.task_outputs["b"], "done: second after ONE");
    }

    #[tokio::test]
    async fn test_hierarchical_runs_after_dependencies() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("worker", "Worker", "Work")).unwrap();
        orch.create_task(TaskSpec::new("publish", "publish", "worker").depends_on(["edit"]))
            .unwrap();
        orch.create_task(TaskSpec::new("edit", "edit", "worker").depends_on(["draft", "facts"]))
            .unwrap();
        orch.create_task(TaskSpec::new("draft", "draft", "worker").depends_on(["facts"]))
            .unwrap();
        orch.create_task(TaskSpec::new("facts", "facts", "worker")).unwrap();
        orch.create_crew(
            CrewSpec::new("graph", ["publish", "edit", "draft", "facts"])
                .process(Process::Hierarchical),
        )
        .unwrap();

        let result = orch.run_crew("graph", &CrewInputs::new()).await.unwrap();

        assert!(result.success);
        let position = |t: &str| result.execution_order.iter().position(|n| n == t).unwrap();
        for (task, deps) in [("publish", vec!["edit"]), ("edit", vec!["draft", "facts"]), ("draft", vec!["facts"])] {
            for dep in deps {
                assert!(position(dep) < position(task), "{} ran before {}", task, dep);
            }
        }
        assert_eq!(result.output, "done: publish");
    }

    #[tokio::test]
    async fn test_hierarchical_root_task_output() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("worker", "Worker", "Work")).unwrap();
        orch.create_task(TaskSpec::new("main", "main work", "worker")).unwrap();
        orch.create_task(TaskSpec::new("side", "side work", "worker")).unwrap();
        orch.create_crew(
            CrewSpec::new("rooted", ["main", "side"])
                .process(Process::Hierarchical)
                .root_task("main"),
        )
        .unwrap();

        let result = orch.run_crew("rooted", &CrewInputs::new()).await.unwrap();
        assert_eq!(result.execution_order, vec!["main", "side"]);
        assert_eq!(result.output, "done: main work");
    }

    #[tokio::test]
    async fn test_cycle_rejected_without_running() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("worker", "Worker", "Work")).unwrap();
        orch.create_task(TaskSpec::new("a", "a", "worker").depends_on(["b"])).unwrap();
        orch.create_task(TaskSpec::new("b", "b", "worker").depends_on(["a"])).unwrap();

        let err = orch
            .create_crew(CrewSpec::new("loop", ["a", "b"]).process(Process::Hierarchical))
            .unwrap_err();

        assert!(matches!(err, Error::Cycle { .. }));
        assert!(orch.get_crew("loop").is_none());
        assert!(generator.prompts().is_empty());
    }

    #[test]
    fn test_sequential_forward_dependency_rejected() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("worker", "Worker", "Work")).unwrap();
        orch.create_task(TaskSpec::new("a", "a", "worker").depends_on(["b"])).unwrap();
        orch.create_task(TaskSpec::new("b", "b", "worker").depends_on(Vec::<String>::new()))
            .unwrap();

        let err = orch.create_crew(CrewSpec::new("bad", ["a", "b"])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_duplicate_tool_keeps_original() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.register_fn("search_web", "original", |_| Ok("a".to_string()))
            .unwrap();

        let err = orch
            .register_fn("search_web", "replacement", |_| Ok("b".to_string()))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DuplicateName);
        assert_eq!(orch.list_tools(), vec!["search_web"]);
        assert_eq!(orch.tools().definitions()[0].description, "original");
    }

    #[test]
    fn test_unknown_references_fail_at_construction() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);

        let err = orch
            .create_agent(AgentSpec::new("poster", "Poster", "Post").tools(["post_social"]))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = orch
            .create_task(TaskSpec::new("t", "do", "ghost"))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("ghost")));
        assert!(orch.get_task("t").is_none());

        let err = orch.create_crew(CrewSpec::new("crew", ["t"])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_duplicate_entity_names() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("worker", "Worker", "Work")).unwrap();

        let err = orch
            .create_agent(AgentSpec::new("worker", "Other", "Other"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
        assert_eq!(orch.get_agent("worker").unwrap().role, "Worker");
    }

    #[tokio::test]
    async fn test_tool_failure_halts_crew() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond("Write the post", "Hello world")
                .use_tool("Publish", "post_social", json!({"text": "Hello world"})),
        );
        let mut orch = orchestrator(&generator);
        orch.register_fn("post_social", "Post to social media", |_| {
            Err("platform rejected the post".into())
        })
        .unwrap();
        orch.create_agent(AgentSpec::new("writer", "Writer", "Write")).unwrap();
        orch.create_agent(AgentSpec::new("poster", "Poster", "Post").tools(["post_social"]))
            .unwrap();
        orch.create_task(TaskSpec::new("draft", "Write the post", "writer")).unwrap();
        orch.create_task(TaskSpec::new("publish", "Publish {draft}", "poster")).unwrap();
        orch.create_task(TaskSpec::new("report", "Report results", "writer")).unwrap();
        orch.create_crew(CrewSpec::new("social", ["draft", "publish", "report"]))
            .unwrap();

        let result = orch.run_crew("social", &CrewInputs::new()).await.unwrap();

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("post_social"));
        assert_eq!(result.failed_task.as_deref(), Some("publish"));
        assert_eq!(result.error_kind, Some(ErrorKind::ToolExecution));
        assert_eq!(result.task_outputs.len(), 1);
        assert_eq!(result.task_outputs["draft"], "Hello world");
        assert_eq!(result.execution_order, vec!["draft"]);
        assert_eq!(generator.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_hierarchical_tool_failure_keeps_only_predecessors() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond("Gather facts", "Facts")
                .respond("Draft from", "Draft")
                .use_tool("Publish", "post_social", json!({"text": "Draft"})),
        );
        let mut orch = orchestrator(&generator);
        orch.register_fn("post_social", "Post to social media", |_| {
            Err("platform rejected the post".into())
        })
        .unwrap();
        orch.create_agent(AgentSpec::new("writer", "Writer", "Write")).unwrap();
        orch.create_agent(AgentSpec::new("poster", "Poster", "Post").tools(["post_social"]))
            .unwrap();
        orch.create_task(TaskSpec::new("gather", "Gather facts", "writer")).unwrap();
        orch.create_task(
            TaskSpec::new("draft", "Draft from {gather}", "writer").depends_on(["gather"]),
        )
        .unwrap();
        orch.create_task(
            TaskSpec::new("publish", "Publish {draft}", "poster").depends_on(["draft"]),
        )
        .unwrap();
        orch.create_task(TaskSpec::new("report", "Report results", "writer").depends_on(["publish"]))
            .unwrap();
        orch.create_crew(
            CrewSpec::new("social", ["report", "publish", "draft", "gather"])
                .process(Process::Hierarchical),
        )
        .unwrap();

        let result = orch.run_crew("social", &CrewInputs::new()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.failed_task.as_deref(), Some("publish"));
        assert_eq!(result.error_kind, Some(ErrorKind::ToolExecution));
        assert_eq!(result.execution_order, vec!["gather", "draft"]);
        assert_eq!(result.task_outputs.len(), 2);
        assert_eq!(result.task_outputs["gather"], "Facts");
        assert_eq!(result.task_outputs["draft"], "Draft");
        assert!(!result.task_outputs.contains_key("report"));
        assert_eq!(
            generator.descriptions(),
            vec!["Gather facts", "Draft from Facts", "Publish Draft"]
        );
    }

    #[tokio::test]
    async fn test_tool_result_becomes_output() {
        let generator = Arc::new(
            ScriptedGenerator::new().use_tool("Look up", "search_web", json!({"query": "rust"})),
        );
        let mut orch = orchestrator(&generator);
        orch.register_fn("search_web", "Search", |args| {
            Ok(format!(
                "results for {}",
                args.get("query").and_then(|v| v.as_str()).unwrap_or_default()
            ))
        })
        .unwrap();
        orch.create_agent(AgentSpec::new("researcher", "Researcher", "Find").tools(["search_web"]))
            .unwrap();
        orch.create_task(TaskSpec::new("lookup", "Look up rust", "researcher")).unwrap();
        orch.create_crew(CrewSpec::new("search", ["lookup"])).unwrap();

        let result = orch.run_crew("search", &CrewInputs::new()).await.unwrap();
        assert_eq!(result.output, "results for rust");
        assert!(generator.prompts()[0].contains("- search_web: Search"));
    }

    #[tokio::test]
    async fn test_unpermitted_tool_is_generation_error() {
        let generator = Arc::new(
            ScriptedGenerator::new().use_tool("Sneak", "post_social", json!({})),
        );
        let mut orch = orchestrator(&generator);
        orch.register_fn("post_social", "Post", |_| Ok("posted".to_string())).unwrap();
        orch.register_fn("search_web", "Search", |_| Ok("found".to_string())).unwrap();
        orch.create_agent(AgentSpec::new("researcher", "Researcher", "Find").tools(["search_web"]))
            .unwrap();
        orch.create_task(TaskSpec::new("sneak", "Sneak a post", "researcher")).unwrap();
        orch.create_crew(CrewSpec::new("sneaky", ["sneak"])).unwrap();

        let result = orch.run_crew("sneaky", &CrewInputs::new()).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Generation));
        assert!(result.task_outputs.is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_reported() {
        let generator = Arc::new(ScriptedGenerator::new().fail("Research", "model offline"));
        let mut orch = orchestrator(&generator);
        demo(&mut orch, Process::Sequential);

        let result = orch.run_crew("demo", &CrewInputs::new()).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.failed_task.as_deref(), Some("t1"));
        assert!(result.error.as_deref().unwrap().contains("model offline"));
        assert_eq!(generator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_inputs_fill_placeholders_and_context() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("writer", "Writer", "Write")).unwrap();
        orch.create_task(
            TaskSpec::new("post", "Write about {topic} for {audience}", "writer")
                .context(["Keep it under 280 characters"]),
        )
        .unwrap();
        orch.create_crew(CrewSpec::new("single", ["post"])).unwrap();

        let inputs = CrewInputs::from([("topic".to_string(), "rust".to_string())]);
        let result = orch.run_crew("single", &inputs).await.unwrap();

        assert_eq!(result.output, "done: Write about rust for {audience}");
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("## Context:\ntopic: rust\nKeep it under 280 characters\n"));
    }

    #[tokio::test]
    async fn test_delegation_to_coworker() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .use_tool(
                    "Plan the launch",
                    DELEGATE_TOOL_NAME,
                    json!({"coworker": "writer", "task": "Draft the launch post"}),
                )
                .respond("Draft the launch post", "Launch post draft"),
        );
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("lead", "Team Lead", "Coordinate").allow_delegation(true))
            .unwrap();
        orch.create_agent(AgentSpec::new("writer", "Content Writer", "Write"))
            .unwrap();
        orch.create_task(TaskSpec::new("plan", "Plan the launch", "lead")).unwrap();
        orch.create_task(TaskSpec::new("polish", "Polish {plan}", "writer")).unwrap();
        orch.create_crew(CrewSpec::new("launch", ["plan", "polish"])).unwrap();

        let result = orch.run_crew("launch", &CrewInputs::new()).await.unwrap();

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.task_outputs["plan"], "Launch post draft");
        let prompts = generator.prompts();
        assert!(prompts[0].contains("- delegate_work: Delegate a task to one of your coworkers: writer (Content Writer)"));
        assert!(prompts[1].starts_with("# Agent: writer"));
        assert!(prompts[1].contains("Delegated by lead (Team Lead)"));
        assert!(!prompts[2].contains("delegate_work"));
    }

    #[tokio::test]
    async fn test_delegation_unknown_coworker_fails() {
        let generator = Arc::new(ScriptedGenerator::new().use_tool(
            "Plan",
            DELEGATE_TOOL_NAME,
            json!({"coworker": "nobody", "task": "x"}),
        ));
        let mut orch = orchestrator(&generator);
        orch.create_agent(AgentSpec::new("lead", "Lead", "Lead").allow_delegation(true))
            .unwrap();
        orch.create_agent(AgentSpec::new("writer", "Writer", "Write")).unwrap();
        orch.create_task(TaskSpec::new("plan", "Plan", "lead")).unwrap();
        orch.create_task(TaskSpec::new("write", "Write", "writer")).unwrap();
        orch.create_crew(CrewSpec::new("team", ["plan", "write"])).unwrap();

        let result = orch.run_crew("team", &CrewInputs::new()).await.unwrap();
        assert_eq!(result.error_kind, Some(ErrorKind::Generation));
        assert!(result.error.as_deref().unwrap().contains("nobody"));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond("Research Topic X", "Topic X facts")
                .respond("Summarize:", "Short summary"),
        );
        let memory = Arc::new(MemoryStore::in_memory(10).unwrap());
        let mut orch = orchestrator(&generator).with_memory(memory);
        demo(&mut orch, Process::Sequential);

        let first = orch.run_crew("demo", &CrewInputs::new()).await.unwrap();
        let second = orch.run_crew("demo", &CrewInputs::new()).await.unwrap();

        assert_eq!(first.task_outputs, second.task_outputs);
        assert_eq!(first.output, second.output);
    }

    #[tokio::test]
    async fn test_results_recorded_and_recalled() {
        let generator = Arc::new(ScriptedGenerator::new().respond("Summarize:", "Short summary"));
        let memory = Arc::new(MemoryStore::in_memory(10).unwrap());
        let mut orch = orchestrator(&generator).with_memory(memory.clone());
        demo(&mut orch, Process::Sequential);

        orch.run_crew("demo", &CrewInputs::new()).await.unwrap();
        let records = memory
            .query(&MemoryFilter::default().category(CREW_RESULT_CATEGORY).key("demo"))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "Short summary");
        assert_eq!(records[0].metadata["success"], true);
        assert_eq!(records[0].metadata["task_outputs"]["t2"], "Short summary");
        assert!(!generator.prompts()[0].contains("## Recent Memories:"));

        orch.run_crew("demo", &CrewInputs::new()).await.unwrap();
        let prompts = generator.prompts();
        assert!(prompts[2].contains("## Recent Memories:\n- Short summary\n"));
        assert_eq!(memory.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_memory_disabled_crew_not_recorded() {
        let generator = Arc::new(ScriptedGenerator::new());
        let memory = Arc::new(MemoryStore::in_memory(10).unwrap());
        let mut orch = orchestrator(&generator).with_memory(memory.clone());
        orch.create_agent(AgentSpec::new("worker", "Worker", "Work")).unwrap();
        orch.create_task(TaskSpec::new("a", "a", "worker")).unwrap();
        orch.create_crew(CrewSpec::new("quiet", ["a"]).memory_enabled(false))
            .unwrap();

        orch.run_crew("quiet", &CrewInputs::new()).await.unwrap();
        assert_eq!(memory.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_crew() {
        let generator = Arc::new(ScriptedGenerator::new());
        let orch = orchestrator(&generator);
        let err = orch.run_crew("missing", &CrewInputs::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownEntity);
    }

    #[test]
    fn test_load_from_config() {
        let config = Config::from_toml_str(
            r#"
[management]
process = "hierarchical"

[[agents]]
name = "researcher"
role = "Research Specialist"
goal = "Find accurate information"

[[tasks]]
name = "summary"
description = "Summarize {facts}"
agent = "researcher"
depends_on = ["facts"]

[[tasks]]
name = "facts"
description = "Collect facts about {topic}"
agent = "researcher"

[[crews]]
name = "research"
tasks = ["summary", "facts"]
"#,
        )
        .unwrap();

        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = Orchestrator::from_config(&config, generator, None);
        orch.load_from_config(&config).unwrap();

        assert_eq!(orch.list_agents(), vec!["researcher"]);
        assert_eq!(orch.list_tasks(), vec!["facts", "summary"]);
        assert_eq!(orch.list_crews(), vec!["research"]);
        assert_eq!(orch.management().process, Process::Hierarchical);
    }

    #[tokio::test]
    async fn test_social_media_preset() {
        let generator = Arc::new(ScriptedGenerator::new());
        let mut orch = orchestrator(&generator);
        orch.register_fn("extract_hashtags", "Extract hashtags", |_| Ok(String::new()))
            .unwrap();

        let name = presets::social_media_team(&mut orch).unwrap();
        assert_eq!(name, presets::SOCIAL_MEDIA_TEAM);
        assert_eq!(
            orch.get_agent("trend_analyst").unwrap().tools,
            vec!["extract_hashtags"]
        );
        assert!(orch.get_agent("engagement_manager").unwrap().tools.is_empty());

        let inputs = CrewInputs::from([("niche".to_string(), "rust".to_string())]);
        let result = orch.run_crew(&name, &inputs).await.unwrap();
        assert_eq!(
            result.execution_order,
            vec!["analyze_trends", "create_content", "optimize_engagement"]
        );
        assert!(generator.prompts()[0].contains("niche: rust"));

        assert!(matches!(
            presets::social_media_team(&mut orch),
            Err(Error::DuplicateName(_))
        ));
    }

    #[tokio::test]
    async fn test_content_research_preset() {
        let generator = Arc::new(ScriptedGenerator::new().respond("Research the", "notes"));
        let mut orch = orchestrator(&generator);

        let name = presets::content_research_team(&mut orch).unwrap();
        let result = orch.run_crew(&name, &CrewInputs::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(
            result.task_outputs["write_content"],
            "done: Write a comprehensive article based on the research:\nnotes"
        );
    }
}
