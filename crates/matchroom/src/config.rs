//! Application configuration, loaded from TOML.
//!
//! Every key is optional:
//!
//! ```toml
//! log_filter = "matchroom=debug,info"
//! require_approval = true
//! prompts = ["What are you reading?", "Best meal you ever had?"]
//!
//! [room]
//! candidates_per_room = 3
//! prompt_limit = 8
//! seed = 42
//! ```

use std::path::{Path, PathBuf};

use matchroom_room::{PromptBook, RoomConfig};
use serde::{Deserialize, Serialize};

/// Default capacity of the server's command channel.
pub const DEFAULT_COMMAND_CHANNEL_SIZE: usize = 256;

const DEFAULT_WELCOME: &str = "Welcome to Matchroom! Register with /register <a|b> [name], \
then wait for the next round. /lobby shows who is waiting.";

/// Error loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level settings for a Matchroom server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub room: RoomConfig,

    /// Prompt texts. Empty means the built-in set.
    pub prompts: Vec<String>,

    /// `tracing-subscriber` filter used when `RUST_LOG` isn't set.
    pub log_filter: String,

    /// Keep new registrations out of the pool until an administrator
    /// approves them.
    pub require_approval: bool,

    /// Reply to `/start` for registered users.
    pub welcome: String,

    pub command_channel_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room: RoomConfig::default(),
            prompts: Vec::new(),
            log_filter: "info".to_string(),
            require_approval: false,
            welcome: DEFAULT_WELCOME.to_string(),
            command_channel_size: DEFAULT_COMMAND_CHANNEL_SIZE,
        }
    }
}

impl AppConfig {
    /// Reads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.room.candidates_per_room == 0 {
            return Err(ConfigError::Invalid(
                "room.candidates_per_room must be at least 1".into(),
            ));
        }
        if self.command_channel_size == 0 {
            return Err(ConfigError::Invalid(
                "command_channel_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The configured prompts, or the built-in set if none survive
    /// trimming.
    pub fn prompt_book(&self) -> PromptBook {
        let book = PromptBook::new(&self.prompts);
        if book.is_empty() {
            PromptBook::default()
        } else {
            book
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.room.prompt_limit, 8);
    }

    #[test]
    fn test_partial_room_table() {
        let config = AppConfig::from_toml_str(
            r#"
            require_approval = true
            prompts = ["one", " two ", ""]

            [room]
            prompt_limit = 4
            seed = 9
            "#,
        )
        .unwrap();
        assert!(config.require_approval);
        assert_eq!(config.room.candidates_per_room, 3);
        assert_eq!(config.room.prompt_limit, 4);
        assert_eq!(config.room.seed, Some(9));
        assert_eq!(config.prompt_book().len(), 2);
    }

    #[test]
    fn test_blank_prompts_fall_back_to_builtin() {
        let config = AppConfig::from_toml_str(r#"prompts = ["  "]"#).unwrap();
        assert_eq!(config.prompt_book(), PromptBook::default());
    }

    #[test]
    fn test_zero_candidates_is_rejected() {
        let err = AppConfig::from_toml_str("[room]\ncandidates_per_room = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            AppConfig::from_toml_str("room = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
