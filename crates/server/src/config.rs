use anyhow::{Context, Result};
use finbridge_mcp::{SessionConfig, ToolHost};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub tool_host: ToolHostConfig,
}

/// Launch parameters for the tool host subprocess
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHostConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_command() -> String {
    "finbridge-mcp".to_string()
}

fn default_call_timeout_secs() -> u64 {
    30
}

impl Default for ToolHostConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            command: default_command(),
            args: Vec::new(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            dir: self.tool_host.dir.clone(),
            command: self.tool_host.command.clone(),
            args: self.tool_host.args.clone(),
            call_timeout: Duration::from_secs(self.tool_host.call_timeout_secs),
        }
    }
}

/// Application state shared across handlers. The session is injected
/// behind the ToolHost trait so tests can substitute a fake.
#[derive(Clone)]
pub struct AppState {
    pub host: Arc<dyn ToolHost>,
}

impl AppState {
    pub fn new(host: Arc<dyn ToolHost>) -> Self {
        Self { host }
    }
}
