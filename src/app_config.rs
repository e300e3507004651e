use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::surface::selector::Selector;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO) or `auto`
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Where captions live on the player surface
    #[serde(default)]
    pub captions: CaptionConfig,

    /// Dictionary storage
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Service endpoint URL
    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether successful lookups are cached for the session
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translate_endpoint(),
            timeout_secs: default_timeout_secs(),
            cache_enabled: true,
        }
    }
}

/// Caption surface configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CaptionConfig {
    /// Selectors tried for caption text nodes, in order
    #[serde(default = "default_caption_selectors")]
    pub selectors: Vec<String>,

    /// Selector list for the player element that may host a shadow root
    #[serde(default = "default_player_selectors")]
    pub player_selectors: String,

    /// Element whose subtree is observed for caption changes
    #[serde(default = "default_observe_root")]
    pub observe_root: String,

    /// How long to wait for the observe root to be mounted
    #[serde(default = "default_mount_timeout_ms")]
    pub mount_timeout_ms: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            selectors: default_caption_selectors(),
            player_selectors: default_player_selectors(),
            observe_root: default_observe_root(),
            mount_timeout_ms: default_mount_timeout_ms(),
        }
    }
}

/// Dictionary storage configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DictionaryConfig {
    /// Database file; `None` uses the user's data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_translate_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_caption_selectors() -> Vec<String> {
    [
        ".ytp-caption-segment",
        ".caption-window > span",
        ".captions-text > span",
        r#"span[class*="caption"]"#,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_player_selectors() -> String {
    "#movie_player, #player-container".to_string()
}

fn default_observe_root() -> String {
    "body".to_string()
}

fn default_mount_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.source_language.eq_ignore_ascii_case("auto") {
            crate::language_utils::get_language_name(&self.source_language)?;
        }
        crate::language_utils::get_language_name(&self.target_language)?;

        if self.translation.endpoint.trim().is_empty() {
            return Err(anyhow!("Translation endpoint must not be empty"));
        }
        if self.translation.timeout_secs == 0 {
            return Err(anyhow!("Translation timeout must be at least one second"));
        }

        if self.captions.selectors.is_empty() {
            return Err(anyhow!("At least one caption selector is required"));
        }
        for selector in self
            .captions
            .selectors
            .iter()
            .chain([&self.captions.player_selectors, &self.captions.observe_root])
        {
            Selector::parse(selector).with_context(|| format!("Invalid selector in config: {}", selector))?;
        }

        Ok(())
    }

    /// Load the configuration at `path`, writing a default one if missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            captions: CaptionConfig::default(),
            dictionary: DictionaryConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
