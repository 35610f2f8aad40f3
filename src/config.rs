use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::opponent::OpponentKind;
use crate::types::Color;

/// Environment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Side whose perspective the terminal reward is given from.
    pub agent_color: Color,
    pub opponent: OpponentKind,
    /// Reward for a well-formed but illegal action.
    pub illegal_move_penalty: f32,
    /// Log the board after every accepted move.
    pub show_steps: bool,
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            agent_color: Color::Black,
            opponent: OpponentKind::Greedy,
            illegal_move_penalty: -10.0,
            show_steps: false,
            seed: None,
        }
    }
}

/// Episode runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_moves: usize,
    pub max_rejections: usize,
    pub show_hints: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_moves: 100,
            max_rejections: 64,
            show_hints: true,
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub env: EnvConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let penalty = self.env.illegal_move_penalty;
        if !penalty.is_finite() || penalty >= 0.0 {
            return Err(ConfigError::Validation(
                "env.illegal_move_penalty must be finite and < 0".into(),
            ));
        }
        if self.session.max_moves == 0 {
            return Err(ConfigError::Validation(
                "session.max_moves must be > 0".into(),
            ));
        }
        if self.session.max_rejections == 0 {
            return Err(ConfigError::Validation(
                "session.max_rejections must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Generate a TOML string with all default values.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).unwrap_or_default()
    }
}
