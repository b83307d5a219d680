/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::path::PathBuf;

use chapterguard::app_config::{Config, LogLevel, default_max_chunk_chars};
use chapterguard::orchestration::{RetryConfig, Stage};
use chapterguard::validation::ValidationConfig;

use crate::common::{create_temp_dir, create_test_file};

/// Test default configuration values
#[test]
fn test_defaultConfig_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.segmentation.max_chunk_chars, default_max_chunk_chars());
    assert_eq!(config.validation.critical_length_ratio, 0.6);
    assert_eq!(config.validation.critical_paragraph_ratio, 0.6);
    assert_eq!(config.alignment.coverage_floor, 0.95);
    assert_eq!(config.alignment.quality_floor, 0.7);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.worker.concurrent_chapters, 4);
    assert!(config.database_path.is_none());
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_validate_withInconsistentValues_shouldFail() {
    let config = Config::default().with_languages("xyz", "fr");
    assert!(config.validate().is_err());

    let config = Config::default().with_validation(ValidationConfig {
        critical_length_ratio: 0.8,
        warning_length_ratio: 0.7,
        ..Default::default()
    });
    assert!(config.validate().is_err());

    let config = Config::default().with_retry(RetryConfig {
        max_attempts: 0,
        ..Default::default()
    });
    assert!(config.validate().is_err());

    let config = Config::default().with_retry(RetryConfig {
        chunk_shrink_factor: 1.5,
        ..Default::default()
    });
    assert!(config.validate().is_err());

    let config = Config::default().with_concurrent_chapters(0);
    assert!(config.validate().is_err());
}

/// Test saving and loading a configuration file
#[test]
fn test_saveToFile_thenFromFile_shouldRestoreConfig() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    let config = Config::default()
        .with_languages("ja", "en")
        .with_max_chunk_chars(1200)
        .with_database_path("/tmp/chapters.db")
        .with_log_level(LogLevel::Debug);

    config.save_to_file(&path)?;
    let loaded = Config::from_file(&path)?;

    assert_eq!(loaded, config);
    assert_eq!(loaded.database_path, Some(PathBuf::from("/tmp/chapters.db")));
    Ok(())
}

/// Test that missing fields fall back to their defaults
#[test]
fn test_fromFile_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let path = create_test_file(
        temp_dir.path(),
        "partial.json",
        r#"{
            "source_language": "de",
            "retry": { "max_attempts": 5 },
            "log_level": "warn"
        }"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.source_language, "de");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.min_chunk_chars, RetryConfig::default().min_chunk_chars);
    assert_eq!(config.log_level, LogLevel::Warn);
    assert_eq!(config.validation, ValidationConfig::default());
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_fromFile_withMissingFile_shouldFail() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let error = Config::from_file(temp_dir.path().join("nope.json")).unwrap_err();

    assert!(error.to_string().contains("Failed to open config file"));
    Ok(())
}

#[test]
fn test_fromFile_withMalformedJson_shouldFail() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let path = create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    let error = Config::from_file(&path).unwrap_err();

    assert!(error.to_string().contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_retryPolicy_shouldFollowConfiguredChunkSize() {
    let config = Config::default().with_max_chunk_chars(2000);
    let policy = config.retry_policy();

    assert_eq!(policy.max_attempts(), 3);
    assert_eq!(policy.params_for(Stage::Translate, 1).max_chunk_chars, 2000);
    assert_eq!(policy.params_for(Stage::Translate, 2).max_chunk_chars, 1200);
    assert!(policy.params_for(Stage::Align, 2).regenerate_alignment);
}

#[test]
fn test_logLevel_shouldMapToLevelFilter() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    assert_eq!(serde_json::to_string(&LogLevel::Debug).unwrap(), "\"debug\"");
}
