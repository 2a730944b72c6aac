//! TOML configuration: `[gateway]`, `[session]`, `[moderation]`.
//!
//! Every field has a serde default so a partial (or absent) config file is
//! always valid. `Config::load_or_init` materializes a default `config.toml`
//! on first run.

use crate::error::ConfigError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[moderation] token`.
pub const MODERATION_TOKEN_ENV: &str = "COMPLIA_MODERATION_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub moderation: ModerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Gateway port (default: 3000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

/// Which durable backend holds session snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackend {
    #[default]
    Sqlite,
    /// Process-local, lost on exit. Useful for tests and throwaway runs.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum transcript length per session (default: 10)
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default)]
    pub backend: SnapshotBackend,
    /// Logical name the gateway routes inbound traffic to.
    #[serde(default = "default_session_name")]
    pub default_session: String,
    /// Workspace directory for the snapshot database.
    /// Defaults to the platform data dir.
    #[serde(default)]
    pub workspace: Option<PathBuf>,
}

fn default_max_history() -> usize {
    10
}

fn default_session_name() -> String {
    "default".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            backend: SnapshotBackend::default(),
            default_session: default_session_name(),
            workspace: None,
        }
    }
}

impl SessionConfig {
    pub fn workspace_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(workspace) = &self.workspace {
            return Ok(workspace.clone());
        }
        let dirs = ProjectDirs::from("", "", "complia")
            .ok_or_else(|| ConfigError::Load("cannot determine data directory".into()))?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Base URL of the classification endpoint.
    #[serde(default = "default_moderation_base_url")]
    pub base_url: String,
    /// Model identifier appended to the run path.
    #[serde(default = "default_moderation_model")]
    pub model: String,
    /// Bearer token. `COMPLIA_MODERATION_TOKEN` takes priority.
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_moderation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_moderation_base_url() -> String {
    "http://127.0.0.1:8788".into()
}

fn default_moderation_model() -> String {
    "llama-3-8b-instruct".into()
}

fn default_moderation_timeout_secs() -> u64 {
    60
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_moderation_base_url(),
            model: default_moderation_model(),
            token: None,
            timeout_secs: default_moderation_timeout_secs(),
        }
    }
}

impl ModerationConfig {
    /// Resolve the bearer token: environment variable first, config second.
    pub fn resolve_token(&self) -> Option<String> {
        token_priority(std::env::var(MODERATION_TOKEN_ENV).ok(), self.token.as_deref())
    }
}

fn token_priority(env: Option<String>, config: Option<&str>) -> Option<String> {
    env.map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .or_else(|| config.map(str::to_owned))
}

impl Config {
    /// Load `config.toml`, writing a default one first if it does not exist.
    pub fn load_or_init(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let rendered = toml::to_string_pretty(&Self::default())
                .map_err(|e| ConfigError::Load(e.to_string()))?;
            fs::write(&path, rendered)?;
            tracing::info!("wrote default config to {}", path.display());
        }

        let raw = fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", "complia")
            .ok_or_else(|| ConfigError::Load("cannot determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
