//! Configuration loading, validation, and management for GoClaw.
//!
//! Loads configuration from a YAML file (`--config`, `~/.goclaw.yaml` or
//! `./.goclaw.yaml`) with environment variable overrides. Validates all
//! settings at startup. The result is an immutable snapshot that callers
//! pass around explicitly.

use goclaw_core::context::{expand_tilde, home_dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the config file looked up in the home and current directories.
pub const CONFIG_FILE_NAME: &str = ".goclaw.yaml";

/// The root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote model endpoint
    #[serde(default)]
    pub zhipu: ZhipuConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Conversation database and workspace locations
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Settings for the Zhipu (OpenAI-compatible) chat endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ZhipuConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://open.bigmodel.cn/api/paas/v4".into()
}
fn default_model() -> String {
    "glm-4-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for ZhipuConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ZhipuConfig {
    /// The API key as shown to users: first and last four characters only.
    pub fn masked_api_key(&self) -> String {
        mask_secret(&self.api_key)
    }
}

impl std::fmt::Debug for ZhipuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZhipuConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Agent loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// How many persisted messages are replayed to the model each turn
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Upper bound on tool-call rounds within a single turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Replaces the built-in base system prompt when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_history() -> usize {
    50
}
fn default_max_tool_rounds() -> usize {
    16
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            max_tool_rounds: default_max_tool_rounds(),
            system_prompt: None,
        }
    }
}

/// Memory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// SQLite database holding the conversation log
    #[serde(default = "default_file_path")]
    pub file_path: String,

    /// Directory with IDENTITY.md, SOUL.md and memory/
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
}

fn default_file_path() -> String {
    "./goclaw.db".into()
}
fn default_workspace() -> PathBuf {
    PathBuf::from("~/.goclaw/workspace")
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            file_path: default_file_path(),
            workspace: default_workspace(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &str) -> &'static str {
    if s.is_empty() { "<unset>" } else { "[REDACTED]" }
}

/// Show the first and last four characters of a secret, or `***` when it is
/// too short for that to hide anything.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "***".into();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

impl AppConfig {
    /// Load configuration using the process environment.
    ///
    /// `explicit` is the `--config` path; it must exist when given. Otherwise
    /// `~/.goclaw.yaml` then `./.goclaw.yaml` are tried, falling back to
    /// built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with_env<F>(explicit: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover() {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::info!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides(&env)?;
        config.memory.workspace = expand_tilde(&config.memory.workspace);
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without applying overrides or validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// The first config file that exists in the default search locations.
    pub fn discover() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.is_file())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = home_dir() {
            paths.push(home.join(CONFIG_FILE_NAME));
        }
        paths.push(PathBuf::from(".").join(CONFIG_FILE_NAME));
        paths
    }

    /// Apply `GOCLAW_*` variables (and the bare `ZHIPU_*` aliases) on top of
    /// the file values. Empty variables are ignored.
    pub fn apply_env_overrides<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(env, &["GOCLAW_ZHIPU_API_KEY", "ZHIPU_API_KEY"]) {
            self.zhipu.api_key = v;
        }
        if let Some(v) = lookup(env, &["GOCLAW_ZHIPU_BASE_URL"]) {
            self.zhipu.base_url = v;
        }
        if let Some(v) = lookup(env, &["GOCLAW_ZHIPU_MODEL", "ZHIPU_MODEL"]) {
            self.zhipu.model = v;
        }
        if let Some(v) = parse_override(env, &["GOCLAW_ZHIPU_TEMPERATURE", "ZHIPU_TEMPERATURE"])? {
            self.zhipu.temperature = v;
        }
        if let Some(v) = parse_override(env, &["GOCLAW_ZHIPU_MAX_TOKENS", "ZHIPU_MAX_TOKENS"])? {
            self.zhipu.max_tokens = v;
        }
        if let Some(v) = parse_override(env, &["GOCLAW_AGENT_MAX_HISTORY"])? {
            self.agent.max_history = v;
        }
        if let Some(v) = parse_override(env, &["GOCLAW_AGENT_MAX_TOOL_ROUNDS"])? {
            self.agent.max_tool_rounds = v;
        }
        if let Some(v) = lookup(env, &["GOCLAW_MEMORY_FILE_PATH"]) {
            self.memory.file_path = v;
        }
        if let Some(v) = lookup(env, &["GOCLAW_MEMORY_WORKSPACE"]) {
            self.memory.workspace = PathBuf::from(v);
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zhipu.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "zhipu api_key is required (set ZHIPU_API_KEY environment variable)".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.zhipu.temperature) {
            return Err(ConfigError::ValidationError(
                "zhipu.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.zhipu.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "zhipu.max_tokens must be greater than 0".into(),
            ));
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

fn lookup<F>(env: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|k| env(*k))
        .find(|v| !v.trim().is_empty())
}

fn parse_override<T, F>(env: &F, keys: &[&str]) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(raw) = env(key).filter(|v| !v.trim().is_empty()) {
            return raw.trim().parse().map(Some).map_err(|_| {
                ConfigError::ValidationError(format!("{key} has an invalid value: '{raw}'"))
            });
        }
    }
    Ok(None)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
