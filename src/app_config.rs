use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::language_utils;

/// Application configuration module
/// This module handles loading, validating and saving the JSON settings
/// file. Every field has a serde default so partial files are accepted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language subtitles are translated into (ISO 639-1 or 639-2)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Source languages in order of preference
    #[serde(default = "default_source_priority")]
    pub source_priority: Vec<String>,

    /// Catalog service connection
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Path mapping and library roots
    #[serde(default)]
    pub paths: PathConfig,

    /// Translation backends and request pacing
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Orchestration settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Catalog (Bazarr) connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CatalogConfig {
    // @field: Base URL of the catalog service
    #[serde(default = "default_catalog_url")]
    pub url: String,

    // @field: API key sent as X-API-KEY
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Path resolution settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathConfig {
    // @field: Catalog-side prefix to local prefix
    #[serde(default)]
    pub mappings: BTreeMap<String, PathBuf>,

    // @field: Library roots scanned for movie directories
    #[serde(default)]
    pub movie_roots: Vec<PathBuf>,

    // @field: Library roots scanned for series directories
    #[serde(default)]
    pub series_roots: Vec<PathBuf>,

    // @field: Minimum title similarity for a directory match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f32,

    // @field: Require the SxxEyy marker when picking an episode file
    #[serde(default = "default_true")]
    pub exact_episode_match: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            mappings: BTreeMap::new(),
            movie_roots: Vec::new(),
            series_roots: Vec::new(),
            fuzzy_threshold: default_fuzzy_threshold(),
            exact_episode_match: true,
        }
    }
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // @backend: LibreTranslate server
    LibreTranslate,
    // @backend: MyMemory public API
    MyMemory,
    // @backend: Google Cloud Translation v2
    Google,
    // @backend: Local Ollama model
    Ollama,
}

impl BackendKind {
    // @returns: Human readable backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::LibreTranslate => "LibreTranslate",
            Self::MyMemory => "MyMemory",
            Self::Google => "Google Translate",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Identifier used in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LibreTranslate => "libretranslate",
            Self::MyMemory => "mymemory",
            Self::Google => "google",
            Self::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "libretranslate" | "libre" => Ok(Self::LibreTranslate),
            "mymemory" => Ok(Self::MyMemory),
            "google" => Ok(Self::Google),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// One entry of the fallback chain
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    // @field: Backend type identifier
    #[serde(rename = "type")]
    pub kind: BackendKind,

    // @field: Disabled entries are kept in the file but never called
    #[serde(default = "default_true")]
    pub enabled: bool,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Model name (Ollama)
    #[serde(default = "String::new")]
    pub model: String,

    // @field: Contact address (MyMemory raises its quota with one)
    #[serde(default = "String::new")]
    pub email: String,

    // @field: Max chars per batch
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,

    // @field: Max entries per batch
    #[serde(default = "default_max_entries_per_request")]
    pub max_entries_per_request: usize,
}

impl BackendConfig {
    // @param kind: Backend enum
    // @returns: Backend config with defaults
    pub fn new(kind: BackendKind) -> Self {
        let base = Self {
            kind,
            enabled: true,
            endpoint: String::new(),
            api_key: String::new(),
            model: String::new(),
            email: String::new(),
            max_chars_per_request: default_max_chars_per_request(),
            max_entries_per_request: default_max_entries_per_request(),
        };

        match kind {
            BackendKind::LibreTranslate => Self {
                endpoint: "https://libretranslate.de".to_string(),
                ..base
            },
            BackendKind::MyMemory => Self {
                endpoint: "https://api.mymemory.translated.net".to_string(),
                max_chars_per_request: 1000,
                max_entries_per_request: 20,
                ..base
            },
            BackendKind::Google => Self {
                endpoint: "https://translation.googleapis.com/language/translate/v2".to_string(),
                enabled: false,
                max_chars_per_request: 5000,
                max_entries_per_request: 100,
                ..base
            },
            BackendKind::Ollama => Self {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
                enabled: false,
                max_chars_per_request: 1500,
                max_entries_per_request: 30,
                ..base
            },
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Translation pacing and backend chain
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    // @field: Per-request timeout; elapsing moves on to the next backend
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    // @field: Pause between consecutive batches of one file
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    // @field: Backends in fallback order
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout_secs(),
            batch_delay_ms: default_batch_delay_ms(),
            backends: default_backends(),
        }
    }
}

impl TranslationConfig {
    /// Enabled backends in fallback order
    pub fn enabled_backends(&self) -> impl Iterator<Item = &BackendConfig> {
        self.backends.iter().filter(|b| b.enabled)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Orchestration settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    // @field: Items processed at the same time
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    // @field: SQLite file; platform data dir when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    // @field: Skip items the catalog marks unmonitored
    #[serde(default)]
    pub skip_unmonitored: bool,

    // @field: Delete subtitle streams extracted from containers once done
    #[serde(default = "default_true")]
    pub cleanup_extracted: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            database_path: None,
            skip_unmonitored: false,
            cleanup_extracted: true,
        }
    }
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
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

fn default_target_language() -> String {
    "nl".to_string()
}

fn default_source_priority() -> Vec<String> {
    ["en", "es", "fr", "de", "it"].iter().map(|s| s.to_string()).collect()
}

fn default_catalog_url() -> String {
    "http://localhost:6767".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_fuzzy_threshold() -> f32 {
    crate::resolver::fuzzy::DEFAULT_THRESHOLD
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_max_chars_per_request() -> usize {
    2000
}

fn default_max_entries_per_request() -> usize {
    50
}

fn default_max_workers() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig::new(BackendKind::LibreTranslate),
        BackendConfig::new(BackendKind::MyMemory),
        BackendConfig::new(BackendKind::Google),
        BackendConfig::new(BackendKind::Ollama),
    ]
}

fn validate_http_url(value: &str, what: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("Invalid {} URL: {}", what, value))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(anyhow!("Unsupported {} URL scheme '{}': {}", what, other, value)),
    }
}

impl Config {
    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Read a configuration file, writing the defaults first if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.target_language)
            .context("Invalid target_language")?;

        if self.source_priority.is_empty() {
            return Err(anyhow!("source_priority must list at least one language"));
        }
        for code in &self.source_priority {
            language_utils::validate_language_code(code).context("Invalid source_priority entry")?;
        }

        validate_http_url(&self.catalog.url, "catalog")?;

        if !(0.0..=1.0).contains(&self.paths.fuzzy_threshold) || self.paths.fuzzy_threshold == 0.0 {
            return Err(anyhow!(
                "paths.fuzzy_threshold must be in (0, 1], got {}",
                self.paths.fuzzy_threshold
            ));
        }

        if self.sync.max_workers == 0 {
            return Err(anyhow!("sync.max_workers must be at least 1"));
        }

        if self.translation.request_timeout_secs == 0 {
            return Err(anyhow!("translation.request_timeout_secs must be at least 1"));
        }

        let mut enabled = 0;
        for backend in self.translation.enabled_backends() {
            enabled += 1;
            validate_http_url(&backend.endpoint, backend.kind.display_name())?;
            if backend.max_chars_per_request == 0 || backend.max_entries_per_request == 0 {
                return Err(anyhow!("{} batch limits must be positive", backend.kind.display_name()));
            }
            match backend.kind {
                BackendKind::Google if backend.api_key.is_empty() => {
                    return Err(anyhow!("API key is required for the Google backend"));
                }
                BackendKind::Ollama if backend.model.is_empty() => {
                    return Err(anyhow!("A model is required for the Ollama backend"));
                }
                _ => {}
            }
        }
        if enabled == 0 {
            return Err(anyhow!("At least one translation backend must be enabled"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            source_priority: default_source_priority(),
            catalog: CatalogConfig::default(),
            paths: PathConfig::default(),
            translation: TranslationConfig::default(),
            sync: SyncConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
