//! Integration tests for partita-config.

use partita_config::{ConfigError, EngineConfig};
use tempfile::TempDir;

#[test]
fn save_creates_parent_dirs_and_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("engine.toml");

    let mut config = EngineConfig::default();
    config.engine.threads = 6;
    config.driver.update_interval_ms = 10;
    config.output.device = Some("Built-in".to_string());
    config.save(&path).unwrap();

    assert!(path.exists());
    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn load_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn load_validates_file_contents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "[output]\nsample_rate = 0\n").unwrap();

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "output.sample_rate",
            ..
        }
    ));
}

#[test]
fn hand_written_file_with_unknown_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(
        &path,
        r#"
[output]
channels = 1
buffer_size = 256

[driver]
latency_samples = 1024
max_block = 2048
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.engine.threads, 1);
    assert_eq!(config.driver.latency_samples, 1024);
    assert_eq!(config.driver.max_block, 2048);
    assert_eq!(config.driver.update_interval_ms, 15);
    assert_eq!(config.output.channels, 1);
    assert_eq!(config.output.buffer_size, 256);
}
