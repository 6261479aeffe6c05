//! Tracefold Config
//!
//! Configuration for the tracefold CLI, read from `config.json` in the data
//! directory (`~/.tracefold` unless overridden):
//!
//! ```json
//! {
//!   "base_url": "https://workflows.example.com/console/api",
//!   "api_key": "app-...",
//!   "timeout_ms": 30000,
//!   "citation_title": "Web Search"
//! }
//! ```
//!
//! Every field is optional. A missing file is the same as an empty one.
//! Command-line flags take precedence over file values.

mod error;

pub use error::ConfigError;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracefoldConfig {
  /// Workflow service API root.
  pub base_url: Option<String>,
  pub api_key: Option<String>,
  /// Request timeout for fetching node executions.
  pub timeout_ms: u64,
  /// Title of the node whose `outputs.json` holds citation sources.
  pub citation_title: Option<String>,
}

impl Default for TracefoldConfig {
  fn default() -> Self {
    Self {
      base_url: None,
      api_key: None,
      timeout_ms: DEFAULT_TIMEOUT_MS,
      citation_title: None,
    }
  }
}

impl TracefoldConfig {
  /// Path of the configuration file for a data directory.
  pub fn path_in(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
  }

  /// Load the configuration from a data directory.
  pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
    Self::load_file(&Self::path_in(data_dir))
  }

  /// Load the configuration from a file, falling back to defaults if it does not exist.
  pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => {
        return Err(ConfigError::Io {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    if content.trim().is_empty() {
      return Ok(Self::default());
    }

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Overlay values given on the command line.
  pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
    if overrides.base_url.is_some() {
      self.base_url = overrides.base_url;
    }
    if overrides.api_key.is_some() {
      self.api_key = overrides.api_key;
    }
    if let Some(timeout_ms) = overrides.timeout_ms {
      self.timeout_ms = timeout_ms;
    }
    if overrides.citation_title.is_some() {
      self.citation_title = overrides.citation_title;
    }
    self
  }

  /// The service base URL, required for fetching.
  pub fn require_base_url(&self) -> Result<&str, ConfigError> {
    self
      .base_url
      .as_deref()
      .filter(|url| !url.trim().is_empty())
      .ok_or(ConfigError::Missing { field: "base_url" })
  }
}

/// Values supplied on the command line. `None` keeps the file value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
  pub base_url: Option<String>,
  pub api_key: Option<String>,
  pub timeout_ms: Option<u64>,
  pub citation_title: Option<String>,
}
