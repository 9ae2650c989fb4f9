//! Configuration management
//!
//! Settings are resolved in this order (later wins):
//! 1. Default values
//! 2. `droid.toml` configuration file
//! 3. Environment variables
//!
//! `${VAR_NAME}` inside the configuration file is replaced with the value of
//! the environment variable before the file is parsed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::crew::{AgentSpec, CrewSpec, Process, TaskSpec};
use crate::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "droid.toml";

/// LLM Provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API
    #[default]
    Claude,
    /// OpenAI-compatible API (llama.cpp server, vLLM, Ollama, ...)
    OpenAi,
}

impl LlmProvider {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "openai" | "llama" | "ollama" | "vllm" | "local" => Self::OpenAi,
            _ => Self::Claude,
        }
    }
}

/// Sampling parameters sent with every generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
        }
    }
}

fn default_max_tokens() -> u64 {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_repetition_penalty() -> f32 {
    1.1
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key (may be empty for local endpoints)
    #[serde(default)]
    pub api_key: String,

    /// Default model name
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL (optional, for custom or local endpoints)
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::Claude,
            base_url: None,
            generation: GenerationConfig::default(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

/// Crew orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementConfig {
    /// Process used by crews that do not choose one
    #[serde(default)]
    pub process: Process,

    /// Number of recent memory entries included in agent prompts
    #[serde(default = "default_prompt_memory_entries")]
    pub prompt_memory_entries: usize,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            process: Process::default(),
            prompt_memory_entries: default_prompt_memory_entries(),
        }
    }
}

fn default_prompt_memory_entries() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Maximum number of retained records; oldest are evicted first
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_db_path() -> String {
    "data/droid.db".to_string()
}

fn default_max_entries() -> usize {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bearer token required by the HTTP API when set
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            port: default_api_port(),
        }
    }
}

fn default_api_port() -> u16 {
    5000
}

/// Scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the schedule file
    #[serde(default)]
    pub config_path: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            config_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Social posting settings used by the posting tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Log posts instead of sending them
    #[serde(default = "default_true")]
    pub dry_run: bool,

    /// Platform name -> webhook URL
    #[serde(default)]
    pub webhooks: HashMap<String, String>,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            webhooks: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Main configuration for droid
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub management: ManagementConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub social: SocialConfig,

    /// Predefined agents
    #[serde(default)]
    pub agents: Vec<AgentSpec>,

    /// Predefined tasks
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,

    /// Predefined crews
    #[serde(default)]
    pub crews: Vec<CrewSpec>,
}

impl Config {
    /// Replace `${VAR_NAME}` with the environment variable value.
    ///
    /// Unset variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Parse a TOML document (after environment expansion)
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded = Self::expand_env_vars(content);
        let cfg: Self = toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.memory.max_entries == 0 {
            return Err(Error::Config(
                "memory.max_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        let mut cfg = Self::from_toml_str(&content)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load configuration from `path` if given, else `DROID_CONFIG`, else
    /// `./droid.toml`. Falls back to defaults plus environment when the file
    /// does not exist.
    pub fn load(path: Option<&str>) -> crate::Result<Self> {
        let path = path
            .map(str::to_string)
            .or_else(|| std::env::var("DROID_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if Path::new(&path).exists() {
            return Self::from_toml_file(&path);
        }

        tracing::warn!("Configuration file not found: {}, using defaults", path);
        Ok(Self::from_env())
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    /// Overwrite settings from environment variables
    fn apply_env_overrides(&mut self) {
        if let Some(api_key) = non_empty_env("LLM_API_KEY") {
            self.llm.api_key = api_key;
        }
        if let Some(model) = non_empty_env("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(provider) = non_empty_env("LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider);
        }
        if let Some(base_url) = non_empty_env("LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }

        if let Some(process) = non_empty_env("DROID_PROCESS") {
            match process.parse() {
                Ok(p) => self.management.process = p,
                Err(e) => tracing::warn!("Ignoring DROID_PROCESS: {}", e),
            }
        }

        if let Some(path) = non_empty_env("DB_PATH") {
            self.memory.db_path = path;
        }
        if let Some(max) = non_empty_env("MEMORY_MAX_ENTRIES").and_then(|v| v.parse::<usize>().ok()) {
            if max == 0 {
                tracing::warn!("Ignoring MEMORY_MAX_ENTRIES=0, the cap must be at least 1");
            } else {
                self.memory.max_entries = max;
            }
        }

        if let Some(port) = non_empty_env("API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }
        if let Some(key) = non_empty_env("API_KEY") {
            self.api.key = Some(key);
        }

        if let Some(enabled) = non_empty_env("SCHEDULE_ENABLED") {
            self.scheduler.enabled = enabled.to_lowercase() != "false";
        }
        if let Some(path) = non_empty_env("SCHEDULE_CONFIG_PATH") {
            self.scheduler.config_path = Some(path);
        }

        if let Some(level) = non_empty_env("LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
