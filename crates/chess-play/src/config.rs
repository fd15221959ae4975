//! Configuration file loading.
//!
//! Settings come from `chess.toml` in the current directory; every field
//! is optional and a missing file means all defaults.

use crate::difficulty::Difficulty;
use crate::rating::Ratings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Session settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PlayConfig {
    /// Command line that starts the UCI engine.
    /// Defaults to "stockfish" (assumes it's in PATH).
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Seconds on each side's clock. 0 disables the clock.
    #[serde(default = "default_clock_seconds")]
    pub clock_seconds: u64,
    /// Pause before each engine move when two engines play.
    #[serde(default = "default_ai_move_delay_ms")]
    pub ai_move_delay_ms: u64,
    /// How long to wait for any single engine answer.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
    /// Engine level when none is given on the command line.
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    /// Ratings the session starts from.
    #[serde(default)]
    pub ratings: Ratings,
}

fn default_engine() -> String {
    "stockfish".to_string()
}

fn default_clock_seconds() -> u64 {
    600
}

fn default_ai_move_delay_ms() -> u64 {
    1500
}

fn default_response_timeout_secs() -> u64 {
    30
}

fn default_difficulty() -> Difficulty {
    Difficulty::Easy
}

impl Default for PlayConfig {
    fn default() -> Self {
        PlayConfig {
            engine: default_engine(),
            clock_seconds: default_clock_seconds(),
            ai_move_delay_ms: default_ai_move_delay_ms(),
            response_timeout_secs: default_response_timeout_secs(),
            difficulty: default_difficulty(),
            ratings: Ratings::default(),
        }
    }
}

impl PlayConfig {
    /// Loads `chess.toml`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads a specific file, or the defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from("chess.toml")
    }

    pub fn ai_move_delay(&self) -> Duration {
        Duration::from_millis(self.ai_move_delay_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }
}
