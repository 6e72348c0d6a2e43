use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ChatConfig / RepoConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,
    /// Bearer token; falls back to `PROVOST_CHAT_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_chat_base_url() -> String {
    "https://chat.example.com/api/v1".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            token: None,
        }
    }
}

impl ChatConfig {
    pub fn token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("PROVOST_CHAT_TOKEN").ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(default = "default_repo_base_url")]
    pub base_url: String,
    /// Organisation that owns every provisioned repository.
    #[serde(default)]
    pub org: Option<String>,
    /// Bearer token; falls back to `PROVOST_REPOS_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_repo_base_url() -> String {
    "https://repos.example.com/api/v3".to_string()
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            base_url: default_repo_base_url(),
            org: None,
            token: None,
        }
    }
}

impl RepoConfig {
    pub fn token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("PROVOST_REPOS_TOKEN").ok())
    }
}

// ---------------------------------------------------------------------------
// QueueConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Total attempts per admitted job before it is exhausted.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay; attempt n waits `backoff_secs * 2^(n-1)`.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Running jobs older than this are requeued at worker startup.
    #[serde(default = "default_recover_after_secs")]
    pub recover_after_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_secs() -> u64 {
    5
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_recover_after_secs() -> u64 {
    300
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            recover_after_secs: default_recover_after_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProvostConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvostConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_queue_path")]
    pub queue_path: PathBuf,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub repos: RepoConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_version() -> u32 {
    1
}

fn default_database_path() -> PathBuf {
    PathBuf::from("provost.db")
}

fn default_queue_path() -> PathBuf {
    PathBuf::from("provost-queue.redb")
}

fn default_port() -> u16 {
    3100
}

impl Default for ProvostConfig {
    fn default() -> Self {
        Self {
            version: 1,
            database_path: default_database_path(),
            queue_path: default_queue_path(),
            chat: ChatConfig::default(),
            repos: RepoConfig::default(),
            queue: QueueConfig::default(),
            port: default_port(),
        }
    }
}

impl ProvostConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: ProvostConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load the config at `path`, or defaults when the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_yaml::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.chat.token().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "chat.token is not set (and PROVOST_CHAT_TOKEN is unset); \
                          provisioning will fail at the first chat call"
                    .to_string(),
            });
        }
        if self.repos.token().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "repos.token is not set (and PROVOST_REPOS_TOKEN is unset); \
                          provisioning will fail at the first repository call"
                    .to_string(),
            });
        }
        if self.repos.org.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "repos.org is required to create repositories".to_string(),
            });
        }
        if self.queue.max_attempts == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "queue.max_attempts must be at least 1".to_string(),
            });
        }
        if self.queue.max_attempts > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "queue.max_attempts={} (>10 is unusual)",
                    self.queue.max_attempts
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
