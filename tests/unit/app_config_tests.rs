/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

use subsync::app_config::{BackendConfig, BackendKind, Config, LogLevel};
use crate::common;

/// Test default configuration values
#[test]
fn test_defaultConfig_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.target_language, "nl");
    assert_eq!(config.catalog.url, "http://localhost:6767");
    assert_eq!(config.catalog.timeout(), Duration::from_secs(30));
    assert_eq!(config.paths.fuzzy_threshold, 0.85);
    assert!(config.paths.exact_episode_match);
    assert_eq!(config.translation.batch_delay(), Duration::from_millis(1000));
    assert_eq!(config.sync.max_workers, 2);
    assert!(config.sync.database_path.is_none());
    assert!(!config.sync.skip_unmonitored);
    assert_eq!(config.log_level, LogLevel::Info);

    let chain: Vec<BackendKind> = config.translation.enabled_backends().map(|b| b.kind).collect();
    assert_eq!(chain, vec![BackendKind::LibreTranslate, BackendKind::MyMemory]);
}

/// Saved files must use the documented key names
#[test]
fn test_save_withBackends_shouldWriteTypeKey() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("subsync.json");

    let mut config = Config::default();
    config
        .paths
        .mappings
        .insert("/data/movies".to_string(), PathBuf::from("/mnt/nas/movies"));
    config.save(&path)?;

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(raw["translation"]["backends"][0]["type"], "libretranslate");
    assert_eq!(raw["paths"]["mappings"]["/data/movies"], "/mnt/nas/movies");
    assert_eq!(raw["log_level"], "info");

    let reloaded = Config::from_file(&path)?;
    assert_eq!(reloaded.paths.mappings, config.paths.mappings);
    Ok(())
}

#[test]
fn test_fromFile_withInvalidJson_shouldFailWithPath() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    let err = Config::from_file(&path).unwrap_err();

    assert!(format!("{:#}", err).contains("broken.json"));
    Ok(())
}

#[test]
fn test_validate_withThresholdOutOfRange_shouldFail() {
    let mut config = Config::default();
    config.paths.fuzzy_threshold = 1.5;
    assert!(config.validate().is_err());

    config.paths.fuzzy_threshold = 0.0;
    assert!(config.validate().is_err());

    config.paths.fuzzy_threshold = 1.0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withThreeLetterCodes_shouldAccept() {
    let mut config = Config::default();
    config.target_language = "nld".to_string();
    config.source_priority = vec!["eng".to_string(), "fr".to_string()];

    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withOllamaWithoutModel_shouldFail() {
    let mut config = Config::default();
    let mut ollama = BackendConfig::new(BackendKind::Ollama).enabled(true);
    ollama.model.clear();
    config.translation.backends = vec![ollama];

    assert!(config.validate().is_err());
}

#[test]
fn test_logLevel_shouldConvertToLevelFilter() {
    assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::Warn);
    assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::Trace);
}
