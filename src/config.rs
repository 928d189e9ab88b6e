use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::RunnerError;

const CONFIG_FILE: &str = "agentbox.toml";

/// Environment variable carrying the sandbox provider API key.
pub const ENV_API_KEY: &str = "E2B_API_KEY";
/// Environment variable carrying the agent OAuth token.
pub const ENV_OAUTH_TOKEN: &str = "CLAUDE_CODE_OAUTH_TOKEN";
/// Environment variable overriding the sandbox template id.
pub const ENV_TEMPLATE_ID: &str = "E2B_TEMPLATE_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

/// Agent configuration - what runs inside the sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model identifier passed to the agent SDK.
    #[serde(default = "default_model")]
    pub model: String,

    /// Tools the agent is allowed to use inside the sandbox.
    #[serde(default = "default_allowed_tools")]
    pub allowed_tools: Vec<String>,

    /// Maximum agent turns before the SDK stops the conversation.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            allowed_tools: default_allowed_tools(),
            max_turns: default_max_turns(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_allowed_tools() -> Vec<String> {
    ["Read", "Write", "Edit", "Glob", "Grep", "Bash"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_max_turns() -> u32 {
    20
}

/// Sandbox provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Template id to provision sandboxes from. Overridden by
    /// `E2B_TEMPLATE_ID` when set.
    #[serde(default)]
    pub template: Option<String>,

    /// Timeout in seconds, bounding both provisioning and execution.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base URL of the provider control plane.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            template: None,
            timeout_secs: default_timeout_secs(),
            api_base: default_api_base(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_api_base() -> String {
    "https://api.e2b.app".to_string()
}

impl Config {
    /// Load configuration from file, using defaults if not found.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(config)
    }

    /// The sandbox timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.sandbox.timeout_secs)
    }
}

/// Secrets for the two external services, read from the process
/// environment exactly once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// API key for the sandbox provisioning service.
    pub api_key: Option<String>,
    /// OAuth token injected into the sandbox for the agent CLI/SDK.
    pub oauth_token: Option<String>,
    /// Template id override from the environment.
    pub template_id: Option<String>,
}

impl Credentials {
    /// Read credentials from the environment, exactly once. Missing
    /// values stay `None` so validation can report everything that is
    /// absent.
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }

        Self {
            api_key: var(ENV_API_KEY),
            oauth_token: var(ENV_OAUTH_TOKEN),
            template_id: var(ENV_TEMPLATE_ID),
        }
    }

    /// Names of missing credential variables, in a stable order.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_none() {
            missing.push(ENV_API_KEY);
        }
        if self.oauth_token.is_none() {
            missing.push(ENV_OAUTH_TOKEN);
        }
        missing
    }
}

/// Everything a task run needs, validated once before any remote call.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub template_id: String,
    pub api_base: String,
    pub api_key: String,
    pub oauth_token: String,
    pub timeout: Duration,
}

impl RunnerConfig {
    /// Combine file/env configuration and credentials, reporting every
    /// missing value in a single `Configuration` error.
    pub fn resolve(config: &Config, credentials: &Credentials) -> Result<Self, RunnerError> {
        let mut missing = credentials.missing();

        // Env override wins over the config file.
        let template_id = credentials
            .template_id
            .clone()
            .or_else(|| config.sandbox.template.clone());
        if template_id.is_none() {
            missing.push(ENV_TEMPLATE_ID);
        }

        if !missing.is_empty() {
            return Err(RunnerError::configuration(format!(
                "missing required settings: {} (set them in the environment or agentbox.toml)",
                missing.join(", ")
            )));
        }

        Ok(Self {
            template_id: template_id.unwrap_or_default(),
            api_base: config.sandbox.api_base.clone(),
            api_key: credentials.api_key.clone().unwrap_or_default(),
            oauth_token: credentials.oauth_token.clone().unwrap_or_default(),
            timeout: config.timeout(),
        })
    }
}
