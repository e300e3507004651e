/*!
 * Tests for configuration loading and validation
 */

use captionlex::app_config::{Config, LogLevel};

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();
    assert_eq!(config, Config::default());
    assert!(path.exists());

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["target_language"], "es");
    assert_eq!(written["captions"]["observe_root"], "body");
    assert_eq!(written["log_level"], "info");
}

#[test]
fn test_loadOrCreate_withExistingFile_shouldReadIt() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{
            "source_language": "en",
            "target_language": "de",
            "translation": { "timeout_secs": 3, "cache_enabled": false },
            "captions": { "selectors": [".subs > span"] },
            "dictionary": { "path": "/tmp/words.db" },
            "log_level": "debug"
        }"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();
    assert_eq!(config.source_language, "en");
    assert_eq!(config.translation.timeout_secs, 3);
    assert!(!config.translation.cache_enabled);
    assert_eq!(config.captions.selectors, vec![".subs > span".to_string()]);
    assert_eq!(config.captions.player_selectors, "#movie_player, #player-container");
    assert_eq!(config.dictionary.path.as_deref(), Some(std::path::Path::new("/tmp/words.db")));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_withMalformedFile_shouldFail() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_validate_withAutoSource_shouldPass() {
    let mut config = Config::default();
    config.source_language = "AUTO".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withZeroTimeout_shouldFail() {
    let mut config = Config::default();
    config.translation.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withEmptySelectorList_shouldFail() {
    let mut config = Config::default();
    config.captions.selectors.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withBadObserveRoot_shouldFail() {
    let mut config = Config::default();
    config.captions.observe_root = "body >".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withCommaInsideAttributeValue_shouldPass() {
    let mut config = Config::default();
    config.captions.selectors.push(r#"span[class*="caption,segment"]"#.to_string());
    config.captions.player_selectors = r#"div[data-layout="a,b"], #movie_player"#.to_string();
    assert!(config.validate().is_ok());
}
