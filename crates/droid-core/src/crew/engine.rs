//! Crew execution engine
//!
//! Runs the tasks of one crew strictly one at a time in planned order. Each
//! task resolves its description template, asks its agent's generator for a
//! decision, and either uses the text directly or invokes the chosen tool.
//! The first failure halts the run.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use serde_json::json;
use tracing::{debug, error, info, warn};

use super::plan::build_plan;
use super::prompt::{build_prompt, PromptParts};
use super::template::render;
use super::{AgentSpec, CrewRunResult, CrewSpec, Process, TaskSpec};
use crate::config::GenerationConfig;
use crate::llm::{Decision, Generator, ToolDefinition};
use crate::memory::{Memory, MemoryFilter, MemoryStore, CREW_RESULT_CATEGORY};
use crate::tool::{ToolArgs, ToolRegistry, DELEGATE_TOOL_NAME};
use crate::{Error, Result};

/// Named string inputs for a crew run
pub type CrewInputs = BTreeMap<String, String>;

/// Borrowed view of everything a crew run needs
pub struct CrewEngine<'a> {
    pub tools: &'a ToolRegistry,
    pub generator: &'a dyn Generator,
    pub generation: &'a GenerationConfig,
    pub agents: &'a BTreeMap<String, AgentSpec>,
    pub tasks: &'a BTreeMap<String, TaskSpec>,
    pub memory: Option<&'a MemoryStore>,
    pub prompt_memory_entries: usize,
    pub default_process: Process,
}

struct Step<'a> {
    task: &'a TaskSpec,
    agent: &'a AgentSpec,
    dependencies: Vec<String>,
}

struct Prepared<'a> {
    steps: Vec<Step<'a>>,
    /// Distinct agents of the crew, in order of first assignment
    agents: Vec<&'a AgentSpec>,
    root: Option<String>,
}

impl<'a> CrewEngine<'a> {
    /// Run `crew` to completion and record the result in memory.
    ///
    /// Never returns an error: failures are reported in the result.
    pub async fn run(&self, crew: &CrewSpec, inputs: &CrewInputs) -> CrewRunResult {
        let started = Instant::now();
        info!(crew = %crew.name, tasks = crew.tasks.len(), "Starting crew");

        let result = match self.prepare(crew) {
            Ok(prepared) => self.execute(crew, &prepared, inputs).await,
            Err(err) => {
                warn!(crew = %crew.name, error = %err, "Crew rejected before execution");
                CrewRunResult::rejected(&crew.name, &err)
            }
        };

        info!(
            crew = %crew.name,
            success = result.success,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Crew finished"
        );

        self.remember(crew, &result);
        result
    }

    /// Resolve every reference and the execution order before anything runs
    fn prepare(&self, crew: &CrewSpec) -> Result<Prepared<'a>> {
        let process = crew.process.unwrap_or(self.default_process);
        let known_tasks: &'a BTreeMap<String, TaskSpec> = self.tasks;
        let known_agents: &'a BTreeMap<String, AgentSpec> = self.agents;

        let tasks = crew
            .tasks
            .iter()
            .map(|name| {
                known_tasks
                    .get(name)
                    .ok_or_else(|| Error::UnknownTask(name.clone()))
            })
            .collect::<Result<Vec<&'a TaskSpec>>>()?;

        let mut plan = build_plan(&crew.name, process, &tasks)?;

        let by_name: HashMap<&str, &'a TaskSpec> =
            tasks.iter().map(|t| (t.name.as_str(), *t)).collect();

        let mut agents: Vec<&'a AgentSpec> = Vec::new();
        let mut steps = Vec::with_capacity(plan.order.len());
        for name in &plan.order {
            let task = by_name
                .get(name.as_str())
                .copied()
                .ok_or_else(|| Error::UnknownTask(name.clone()))?;
            let agent = known_agents
                .get(&task.agent)
                .ok_or_else(|| Error::UnknownAgent(task.agent.clone()))?;

            if let Some(missing) = agent.tools.iter().find(|t| !self.tools.contains(t)) {
                return Err(Error::UnknownTool(missing.clone()));
            }
            if !agents.iter().any(|a| a.name == agent.name) {
                agents.push(agent);
            }

            steps.push(Step {
                task,
                agent,
                dependencies: plan.dependencies.remove(name).unwrap_or_default(),
            });
        }

        let root = match (process, &crew.root_task) {
            (Process::Hierarchical, Some(root)) => {
                if !by_name.contains_key(root.as_str()) {
                    return Err(Error::Validation(format!(
                        "Root task '{}' is not part of crew '{}'",
                        root, crew.name
                    )));
                }
                Some(root.clone())
            }
            _ => plan.last().map(str::to_string),
        };

        Ok(Prepared {
            steps,
            agents,
            root,
        })
    }

    async fn execute(
        &self,
        crew: &CrewSpec,
        prepared: &Prepared<'a>,
        inputs: &CrewInputs,
    ) -> CrewRunResult {
        let memories = self.recent_memories(crew);
        let mut outputs = BTreeMap::new();
        let mut order = Vec::with_capacity(prepared.steps.len());

        for step in &prepared.steps {
            let task = &step.task.name;
            let started = Instant::now();
            info!(crew = %crew.name, task = %task, agent = %step.agent.name, "Running task");

            match self
                .run_step(step, &prepared.agents, inputs, &outputs, &memories)
                .await
            {
                Ok(output) => {
                    info!(
                        crew = %crew.name,
                        task = %task,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Task completed"
                    );
                    outputs.insert(task.clone(), output);
                    order.push(task.clone());
                }
                Err(err) => {
                    error!(crew = %crew.name, task = %task, error = %err, "Task failed, halting crew");
                    return CrewRunResult::failed(&crew.name, &err, Some(task.clone()), outputs, order);
                }
            }
        }

        let output = prepared
            .root
            .as_ref()
            .and_then(|root| outputs.get(root))
            .cloned()
            .unwrap_or_default();

        CrewRunResult::success(&crew.name, output, outputs, order)
    }

    async fn run_step(
        &self,
        step: &Step<'a>,
        crew_agents: &[&'a AgentSpec],
        inputs: &CrewInputs,
        outputs: &BTreeMap<String, String>,
        memories: &[String],
    ) -> Result<String> {
        let task = step.task;
        let agent = step.agent;

        let mut values: HashMap<&str, &str> = inputs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let mut context: Vec<String> = inputs.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        context.extend(task.context.iter().cloned());

        for dep in &step.dependencies {
            if let Some(output) = outputs.get(dep) {
                values.insert(dep.as_str(), output.as_str());
                context.push(format!("Result from {}: {}", dep, output));
            }
        }

        let description = render(&task.description, &values);
        debug!(task = %task.name, description = %description, "Resolved task description");

        let coworkers: Vec<&AgentSpec> = if agent.allow_delegation {
            crew_agents
                .iter()
                .filter(|a| a.name != agent.name)
                .copied()
                .collect()
        } else {
            Vec::new()
        };

        let mut offered = self.tools.definitions_for(&agent.tools);
        if !coworkers.is_empty() {
            offered.push(delegation_definition(&coworkers));
        }

        let parts = PromptParts {
            description: &description,
            expected_output: task.expected_output.as_deref(),
            context,
            memories,
            tools: &offered,
        };
        let prompt = build_prompt(agent, &parts);

        match self.decide(&prompt, &offered).await? {
            Decision::UseTool { name, args } if name == DELEGATE_TOOL_NAME && !coworkers.is_empty() => {
                self.delegate(agent, &coworkers, &args, &parts).await
            }
            decision => self.act(agent, decision).await,
        }
    }

    async fn decide(&self, prompt: &str, tools: &[ToolDefinition]) -> Result<Decision> {
        if tools.is_empty() {
            let text = self
                .generator
                .generate(prompt, self.generation)
                .await
                .map_err(Error::into_generation)?;
            return Ok(Decision::Respond { text });
        }

        self.generator
            .decide(prompt, tools, self.generation)
            .await
            .map_err(Error::into_generation)
    }

    /// Apply a decision for `agent`: text is the output, a tool call must be permitted
    async fn act(&self, agent: &AgentSpec, decision: Decision) -> Result<String> {
        match decision {
            Decision::Respond { text } => Ok(text),
            Decision::UseTool { name, args } => {
                if !agent.can_use(&name) {
                    return Err(Error::Generation(format!(
                        "Agent '{}' chose tool '{}', which it is not permitted to use",
                        agent.name, name
                    )));
                }
                info!(agent = %agent.name, tool = %name, "Agent invoking tool");
                self.tools.invoke(&name, args).await
            }
        }
    }

    /// Hand the task to a coworker, who may not delegate further
    async fn delegate(
        &self,
        agent: &AgentSpec,
        coworkers: &[&AgentSpec],
        args: &ToolArgs,
        parts: &PromptParts<'_>,
    ) -> Result<String> {
        let requested = args
            .get("coworker")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Generation("delegate_work requires a 'coworker'".to_string()))?;
        let work = args
            .get("task")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Generation("delegate_work requires a 'task'".to_string()))?;

        let coworker = coworkers
            .iter()
            .find(|a| a.name == requested || a.role == requested)
            .ok_or_else(|| Error::Generation(format!("Unknown coworker '{}'", requested)))?;

        info!(agent = %agent.name, coworker = %coworker.name, "Delegating work");

        let tools = self.tools.definitions_for(&coworker.tools);
        let mut context = parts.context.clone();
        context.push(format!("Delegated by {} ({})", agent.name, agent.role));

        let prompt = build_prompt(
            coworker,
            &PromptParts {
                description: work,
                expected_output: parts.expected_output,
                context,
                memories: parts.memories,
                tools: &tools,
            },
        );

        let decision = self.decide(&prompt, &tools).await?;
        self.act(coworker, decision).await
    }

    fn recent_memories(&self, crew: &CrewSpec) -> Vec<String> {
        let Some(store) = self.memory else {
            return Vec::new();
        };
        if !crew.memory_enabled || self.prompt_memory_entries == 0 {
            return Vec::new();
        }

        let filter = MemoryFilter::default()
            .category(CREW_RESULT_CATEGORY)
            .key(crew.name.as_str())
            .limit(self.prompt_memory_entries);

        match store.query(&filter) {
            Ok(records) => records.into_iter().map(|m| m.content).collect(),
            Err(err) => {
                warn!(crew = %crew.name, error = %err, "Failed to read memories");
                Vec::new()
            }
        }
    }

    fn remember(&self, crew: &CrewSpec, result: &CrewRunResult) {
        let Some(store) = self.memory else {
            return;
        };
        if !crew.memory_enabled {
            return;
        }

        let record = Memory::new(CREW_RESULT_CATEGORY, crew.name.as_str(), result.summary())
            .with_metadata(result.metadata());

        match store.append(&record) {
            Ok(()) => debug!(crew = %crew.name, id = %record.id, "Recorded crew result"),
            Err(err) => warn!(crew = %crew.name, error = %err, "Failed to record crew result"),
        }
    }
}

fn delegation_definition(coworkers: &[&AgentSpec]) -> ToolDefinition {
    let names: Vec<&str> = coworkers.iter().map(|a| a.name.as_str()).collect();
    let listing = coworkers
        .iter()
        .map(|a| format!("{} ({})", a.name, a.role))
        .collect::<Vec<_>>()
        .join(", ");

    ToolDefinition::new(
        DELEGATE_TOOL_NAME,
        format!("Delegate a task to one of your coworkers: {}", listing),
        json!({
            "type": "object",
            "properties": {
                "coworker": {"type": "string", "enum": names},
                "task": {"type": "string", "description": "What the coworker should do"}
            },
            "required": ["coworker", "task"]
        }),
    )
}
