//! # Configuration
//!
//! Optional `tilebattle.toml` overriding the built-in defaults. Every key is
//! optional; a missing section or field keeps its default.
//!
//! ```toml
//! [network]
//! port = 8027
//! connect_timeout_ms = 200
//!
//! [player]
//! username = "Player"
//!
//! [game]
//! move_queue_capacity = 100
//! status_clear_ms = 2000
//! connect_fail_clear_ms = 1000
//! waiting_dots_interval_ms = 1000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    APP_PORT, CONNECT_FAIL_CLEAR, CONNECT_TIMEOUT, DEFAULT_USERNAME, MOVE_QUEUE_CAPACITY,
    STATUS_CLEAR, WAITING_DOTS_INTERVAL,
};

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {reason}")]
    Io {
        /// File that failed.
        path: String,
        /// OS error text.
        reason: String,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// `[network]` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Port the host listens on and the guest dials.
    pub port: u16,
    /// Guest connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: APP_PORT,
            connect_timeout_ms: duration_ms(CONNECT_TIMEOUT),
        }
    }
}

/// `[player]` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Name shown to the opponent.
    pub username: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
        }
    }
}

/// `[game]` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Capacity of the local move queue.
    pub move_queue_capacity: usize,
    /// How long "Lost connection" style messages stay up.
    pub status_clear_ms: u64,
    /// How long "Failed to connect" stays up.
    pub connect_fail_clear_ms: u64,
    /// Waiting-line animation step.
    pub waiting_dots_interval_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_queue_capacity: MOVE_QUEUE_CAPACITY,
            status_clear_ms: duration_ms(STATUS_CLEAR),
            connect_fail_clear_ms: duration_ms(CONNECT_FAIL_CLEAR),
            waiting_dots_interval_ms: duration_ms(WAITING_DOTS_INTERVAL),
        }
    }
}

/// Complete configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileBattleConfig {
    /// Connection settings.
    pub network: NetworkConfig,
    /// Local player settings.
    pub player: PlayerConfig,
    /// Front-end tuning.
    pub game: GameConfig,
}

impl TileBattleConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`] for a file that exists.
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.network.port == 0 {
            return Err(ConfigError::Invalid("network.port must be non-zero".into()));
        }
        if self.network.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "network.connect_timeout_ms must be non-zero".into(),
            ));
        }
        if self.game.move_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "game.move_queue_capacity must be non-zero".into(),
            ));
        }
        if self.game.waiting_dots_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "game.waiting_dots_interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Guest connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.connect_timeout_ms)
    }

    /// Display time for lost-connection messages.
    #[must_use]
    pub const fn status_clear(&self) -> Duration {
        Duration::from_millis(self.game.status_clear_ms)
    }

    /// Display time for the connect failure message.
    #[must_use]
    pub const fn connect_fail_clear(&self) -> Duration {
        Duration::from_millis(self.game.connect_fail_clear_ms)
    }

    /// Waiting-line animation step.
    #[must_use]
    pub const fn waiting_dots_interval(&self) -> Duration {
        Duration::from_millis(self.game.waiting_dots_interval_ms)
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = TileBattleConfig::from_toml_str("").unwrap();
        assert_eq!(config, TileBattleConfig::default());
        assert_eq!(config.network.port, APP_PORT);
        assert_eq!(config.connect_timeout(), CONNECT_TIMEOUT);
        assert_eq!(config.game.move_queue_capacity, MOVE_QUEUE_CAPACITY);
    }

    #[test]
    fn test_partial_override() {
        let config = TileBattleConfig::from_toml_str(
            r#"
            [player]
            username = "alice"

            [game]
            move_queue_capacity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.player.username, "alice");
        assert_eq!(config.game.move_queue_capacity, 8);
        assert_eq!(config.status_clear(), STATUS_CLEAR);
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = TileBattleConfig::from_toml_str("[game]\nmove_queue_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = TileBattleConfig::from_toml_str("[network]\nport = \"eighty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = TileBattleConfig::default();
        config.player.username = "bob".into();
        let text = config.to_toml_string().unwrap();
        assert_eq!(TileBattleConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("tilebattle_config_does_not_exist.toml");
        assert!(matches!(
            TileBattleConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(
            TileBattleConfig::load_or_default(&path).unwrap(),
            TileBattleConfig::default()
        );
    }
}
