//! Configuration loading, validation, and management for StateBench.
//!
//! Loads configuration from `~/.statebench/config.toml` with environment
//! variable overrides. Validates all settings before a run starts.

use serde::{Deserialize, Serialize};
use statebench_core::memory::TRANSCRIPT_RESERVE_TOKENS;
use statebench_core::timeline::Track;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.statebench/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Which memory strategy to replay timelines through
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Replay settings
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_strategy")]
    pub name: String,

    /// Token budget for strategies that truncate (transcript replay)
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Capacity of the state-based working set
    #[serde(default = "default_working_set_size")]
    pub working_set_size: usize,
}

fn default_strategy() -> String {
    "state_based".into()
}
fn default_token_budget() -> usize {
    8000
}
fn default_working_set_size() -> usize {
    10
}
fn default_true() -> bool {
    true
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: default_strategy(),
            token_budget: default_token_budget(),
            working_set_size: default_working_set_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Default JSONL timeline file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,

    /// Only replay these tracks (empty = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<String>,

    /// Print the strategy's system prompt alongside each query prompt
    #[serde(default = "default_true")]
    pub include_system_prompt: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data: None,
            tracks: vec![],
            include_system_prompt: true,
        }
    }
}

impl BenchConfig {
    /// Load configuration from the default path (~/.statebench/config.toml).
    ///
    /// Environment variables override file values:
    /// - `STATEBENCH_STRATEGY`
    /// - `STATEBENCH_TOKEN_BUDGET`
    /// - `STATEBENCH_WORKING_SET_SIZE`
    /// - `STATEBENCH_DATA`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(name) = std::env::var("STATEBENCH_STRATEGY") {
            self.strategy.name = name;
        }
        if let Ok(raw) = std::env::var("STATEBENCH_TOKEN_BUDGET") {
            self.strategy.token_budget = parse_env_usize("STATEBENCH_TOKEN_BUDGET", &raw)?;
        }
        if let Ok(raw) = std::env::var("STATEBENCH_WORKING_SET_SIZE") {
            self.strategy.working_set_size =
                parse_env_usize("STATEBENCH_WORKING_SET_SIZE", &raw)?;
        }
        if let Ok(data) = std::env::var("STATEBENCH_DATA") {
            self.run.data = Some(PathBuf::from(data));
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".statebench")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "strategy.name must not be empty".into(),
            ));
        }

        if self.strategy.working_set_size == 0 {
            return Err(ConfigError::ValidationError(
                "strategy.working_set_size must be at least 1".into(),
            ));
        }

        if self.strategy.token_budget <= TRANSCRIPT_RESERVE_TOKENS {
            return Err(ConfigError::ValidationError(format!(
                "strategy.token_budget must exceed {TRANSCRIPT_RESERVE_TOKENS}"
            )));
        }

        for track in &self.run.tracks {
            track
                .parse::<Track>()
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }

        Ok(())
    }

    /// Parsed track filter. Empty means every track.
    pub fn track_filter(&self) -> Result<Vec<Track>, ConfigError> {
        self.run
            .tracks
            .iter()
            .map(|t| {
                t.parse::<Track>()
                    .map_err(|e| ConfigError::ValidationError(e.to_string()))
            })
            .collect()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            run: RunConfig::default(),
        }
    }
}

fn parse_env_usize(var: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{var} must be a positive integer, got '{raw}'"))
    })
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
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

impl From<ConfigError> for statebench_core::Error {
    fn from(e: ConfigError) -> Self {
        statebench_core::Error::Config {
            message: e.to_string(),
        }
    }
}
