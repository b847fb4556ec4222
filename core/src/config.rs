//! Configuration management

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Help plugin settings
    pub help: HelpConfig,
    /// Bot (host) settings
    pub bot: BotConfig,
    /// Localization settings
    pub locale: LocaleConfig,
}

/// Settings recognized by the help plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpConfig {
    /// Register a fuzzy shortcut for the help command
    pub shortcut: bool,
    /// Add a `-h, --help` option to every command
    pub options: bool,
    /// Banner image shown above the global listing
    pub custom_image: Option<String>,
    /// Text appended after the global listing
    pub image_suffix: Option<String>,
    /// Invite link for the feedback group
    pub invite_group: Option<String>,
    /// Append the feedback prompt to the global listing
    pub feedback: bool,
    /// Pagination settings
    pub pagination: PaginationConfig,
    /// Track and display usage statistics
    pub statistics: bool,
    /// Minimum similarity for a shortcut to be offered as a candidate
    pub shortcut_threshold: f64,
    /// Per-section output templates
    pub formatters: FormatterConfig,
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub enabled: bool,
    pub page_size: usize,
}

/// Output templates. Each may contain `{content}` and `{time}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub aliases: Option<String>,
    pub usage: Option<String>,
    pub options: Option<String>,
    pub examples: Option<String>,
    pub subcommands: Option<String>,
    pub footer: Option<String>,
}

/// Host bot settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Command prefixes; the first one is shown in listings
    pub prefix: Vec<String>,
}

/// Localization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Locale used when the session does not name one
    pub default: String,
    /// Directory of `<locale>.toml` files merged over the built-in catalogs
    pub directory: Option<PathBuf>,
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            shortcut: true,
            options: true,
            custom_image: None,
            image_suffix: None,
            invite_group: None,
            feedback: false,
            pagination: PaginationConfig::default(),
            statistics: false,
            shortcut_threshold: 0.5,
            formatters: FormatterConfig::default(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_size: 10,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: vec!["/".to_string()],
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default: "en-US".to_string(),
            directory: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        // Relative locale directories are resolved against the config file
        if let Some(dir) = &config.locale.directory {
            if dir.is_relative() {
                if let Some(parent) = config_path.parent() {
                    config.locale.directory = Some(parent.join(dir));
                }
            }
        }

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.help.pagination.page_size == 0 {
            return Err(Error::Config("Pagination page size must be greater than 0".to_string()));
        }

        let threshold = self.help.shortcut_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "Shortcut threshold {} must be between 0 and 1",
                threshold
            )));
        }

        if self.locale.default.trim().is_empty() {
            return Err(Error::Config("Default locale cannot be empty".to_string()));
        }

        if let Some(dir) = &self.locale.directory {
            if !dir.is_dir() {
                return Err(Error::Config(format!("Locale directory {:?} does not exist", dir)));
            }
        }

        Ok(())
    }

    /// First configured prefix, or an empty string
    pub fn display_prefix(&self) -> &str {
        self.bot.prefix.first().map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.help.shortcut);
        assert!(config.help.options);
        assert!(!config.help.feedback);
        assert!(!config.help.statistics);
        assert!(config.help.pagination.enabled);
        assert_eq!(config.help.pagination.page_size, 10);
        assert_eq!(config.display_prefix(), "/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [help]
            statistics = true
            [help.pagination]
            page_size = 5
            [help.formatters]
            title = "== {content} =="
            "#,
        )
        .unwrap();

        assert!(config.help.statistics);
        assert!(config.help.shortcut);
        assert!(config.help.pagination.enabled);
        assert_eq!(config.help.pagination.page_size, 5);
        assert_eq!(config.help.formatters.title.as_deref(), Some("== {content} =="));
        assert!(config.help.formatters.footer.is_none());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.help.pagination.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.help.shortcut_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.locale.default = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foxhelp.toml");

        let mut config = Config::default();
        config.help.invite_group = Some("https://example.com/join".to_string());
        config.bot.prefix = vec!["!".to_string(), "/".to_string()];
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.help.invite_group.as_deref(), Some("https://example.com/join"));
        assert_eq!(loaded.display_prefix(), "!");
    }
}
