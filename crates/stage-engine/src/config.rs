//! Configuration loading and typed config structures for playback.
//!
//! The configuration lives in `stage-config.yaml`. Every section and field
//! is optional; anything left out falls back to the defaults below, so an
//! empty file (or no file at all) yields a working engine.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level stage configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StageConfig {
    /// Timing, collision and expansion settings.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StageConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `STAGE_LOG_LEVEL` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as unit, not an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.logging.apply_env_overrides();
        Ok(config)
    }
}

/// How a repeat block with no children is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Only nested children are repeated; an empty repeat contributes nothing.
    #[default]
    Nested,
    /// Compatibility with older scripts: an empty repeat repeats the single
    /// primitive block right before it in the root list.
    RepeatPreceding,
}

/// Playback settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaybackConfig {
    /// Pause after every move, turn and goto step, in milliseconds.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Two running sprites closer than this distance collide.
    #[serde(default = "default_collision_threshold")]
    pub collision_threshold: f64,

    /// Whether a collision swap also swaps the sprites' saved scripts.
    #[serde(default = "default_true")]
    pub propagate_to_scripts: bool,

    /// Interpretation of childless repeat blocks.
    #[serde(default)]
    pub repeat_mode: RepeatMode,

    /// Capacity of the playback event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            collision_threshold: default_collision_threshold(),
            propagate_to_scripts: true,
            repeat_mode: RepeatMode::Nested,
            event_capacity: default_event_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Override the level from `STAGE_LOG_LEVEL` when it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STAGE_LOG_LEVEL") {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_step_delay_ms() -> u64 {
    100
}

const fn default_collision_threshold() -> f64 {
    80.0
}

const fn default_event_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StageConfig::default();
        assert_eq!(config.playback.step_delay_ms, 100);
        assert!((config.playback.collision_threshold - 80.0).abs() < f64::EPSILON);
        assert!(config.playback.propagate_to_scripts);
        assert_eq!(config.playback.repeat_mode, RepeatMode::Nested);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
playback:
  step_delay_ms: 20
  collision_threshold: 50
  propagate_to_scripts: false
  repeat_mode: repeat_preceding
  event_capacity: 32

logging:
  level: "debug"
"#;

        let config = StageConfig::parse(yaml).unwrap();
        assert_eq!(config.playback.step_delay_ms, 20);
        assert!((config.playback.collision_threshold - 50.0).abs() < f64::EPSILON);
        assert!(!config.playback.propagate_to_scripts);
        assert_eq!(config.playback.repeat_mode, RepeatMode::RepeatPreceding);
        assert_eq!(config.playback.event_capacity, 32);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = StageConfig::parse("playback:\n  step_delay_ms: 5\n").unwrap();

        // Delay is overridden
        assert_eq!(config.playback.step_delay_ms, 5);
        // Everything else uses defaults
        assert!((config.playback.collision_threshold - 80.0).abs() < f64::EPSILON);
        assert_eq!(config.playback.repeat_mode, RepeatMode::Nested);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = StageConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn rejects_unknown_repeat_mode() {
        let config = StageConfig::parse("playback:\n  repeat_mode: sideways\n");
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }
}
