//! `streamline.toml` configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pairing::DEFAULT_PAIRING_WINDOW;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "streamline.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StreamlineConfig {
    pub diff: DiffConfig,
    pub lanes: LaneConfig,
    pub history: HistoryConfig,
    pub backend: BackendConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Lookahead for equivalent-content pairing.
    pub pairing_window: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            pairing_window: DEFAULT_PAIRING_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    /// Authors given their own lane in virtual mode; the rest share one
    /// overflow lane.
    pub max_author_lanes: usize,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self { max_author_lanes: 4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub focus_commit_limit: usize,
    pub related_branch_limit: usize,
    pub related_commit_limit: usize,
    /// Related-branch fetches allowed in flight at once.
    pub max_in_flight: usize,
    pub result_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            focus_commit_limit: 100,
            related_branch_limit: 3,
            related_commit_limit: 20,
            max_in_flight: 3,
            result_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    P4,
    Fixture,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Path or name of the `p4` executable.
    pub p4_bin: String,
    pub port: Option<String>,
    pub user: Option<String>,
    pub client: Option<String>,
    pub timeout_secs: u64,
    /// JSON fixture served by the fixture backend.
    pub fixture: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::P4,
            p4_bin: "p4".to_string(),
            port: None,
            user: None,
            client: None,
            timeout_secs: 30,
            fixture: None,
        }
    }
}

impl BackendConfig {
    /// Let `P4PORT`, `P4USER` and `P4CLIENT` override the file values.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("P4PORT") {
            self.port = Some(port);
        }
        if let Some(user) = lookup("P4USER") {
            self.user = Some(user);
        }
        if let Some(client) = lookup("P4CLIENT") {
            self.client = Some(client);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7890,
        }
    }
}

impl StreamlineConfig {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(path, &text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path`, or `streamline.toml` under `root` if it exists, or the
    /// defaults. Environment overrides are applied last.
    pub fn discover(path: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let candidate = root.join(CONFIG_FILE);
                if candidate.exists() {
                    Self::load(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        config.backend.apply_env();
        Ok(config)
    }
}
