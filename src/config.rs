//! Configuration file parser for the `feedloom` command line tool.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::state::{ExportOption, ExportOptions};
use crate::xml::ParserOptions;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Encoding label for the second parse attempt when a document does not
    /// decode with its declared encoding.
    pub fallback_encoding: String,

    pub export_labels: bool,
    pub export_filters: bool,
    pub export_preferences: bool,

    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_encoding: "windows-1252".to_string(),
            export_labels: true,
            export_filters: true,
            export_preferences: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "fallback_encoding",
        "export_labels",
        "export_filters",
        "export_preferences",
        "log_level",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check the size before reading so a huge file is never loaded.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parser options; an unknown encoding label falls back to the default.
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions::with_fallback_label(&self.fallback_encoding).unwrap_or_else(|| {
            tracing::warn!(
                encoding = %self.fallback_encoding,
                "Unknown fallback encoding, using default"
            );
            ParserOptions::default()
        })
    }

    pub fn export_options(&self) -> ExportOptions {
        let mut options = ExportOptions::none();
        if self.export_labels {
            options = options.with(ExportOption::Labels);
        }
        if self.export_filters {
            options = options.with(ExportOption::Filters);
        }
        if self.export_preferences {
            options = options.with(ExportOption::Preferences);
        }
        options
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("feedloom_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fallback_encoding, "windows-1252");
        assert!(config.export_labels && config.export_filters && config.export_preferences);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.export_options(), ExportOptions::all());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedloom_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.fallback_encoding, "windows-1252");
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "export_filters = false\n");
        let config = Config::load(&path).unwrap();

        let options = config.export_options();
        assert!(options.contains(ExportOption::Labels));
        assert!(!options.contains(ExportOption::Filters));
        assert!(options.contains(ExportOption::Preferences));
        cleanup(&path);
    }

    #[test]
    fn test_fallback_encoding_label() {
        let path = write_config("encoding", "fallback_encoding = \"ISO-8859-2\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.parser_options().fallback_encoding, encoding_rs::ISO_8859_2);
        cleanup(&path);

        let config = Config {
            fallback_encoding: "no-such-encoding".to_string(),
            ..Config::default()
        };
        assert_eq!(config.parser_options().fallback_encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "log_level = \"debug\"\ntheme = \"dark\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "export_labels = \"yes\"\n");
        assert!(Config::load(&path).is_err());
        cleanup(&path);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }
}
