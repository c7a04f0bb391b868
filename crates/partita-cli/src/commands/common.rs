//! Shared CLI helpers used across multiple commands.

use partita_config::EngineConfig;
use partita_io::{BackendStreamConfig, DriverConfig};
use std::path::Path;

/// Load the engine configuration from `path`, or the user's file (or defaults).
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_or_default()?,
    };
    Ok(config)
}

/// Driver timing from the `[driver]` section.
pub fn driver_config(config: &EngineConfig) -> DriverConfig {
    DriverConfig {
        update_interval: config.driver.update_interval(),
        latency_samples: config.driver.latency_samples,
        min_block: config.driver.min_block,
        max_block: config.driver.max_block,
    }
}

/// Device stream settings from the `[output]` section.
pub fn stream_config(config: &EngineConfig) -> BackendStreamConfig {
    BackendStreamConfig {
        sample_rate: config.output.sample_rate,
        buffer_size: config.output.buffer_size,
        channels: config.output.channels,
        device_name: config.output.device.clone(),
    }
}

/// Parse a positive, finite frequency for clap's `value_parser`.
pub fn parse_frequency(s: &str) -> Result<f32, String> {
    let hz: f32 = s
        .parse()
        .map_err(|_| format!("invalid frequency '{s}' (expected Hz)"))?;
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(format!("frequency must be positive, got {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_frequency() {
        assert_eq!(parse_frequency("540"), Ok(540.0));
        assert!(parse_frequency("0").is_err());
        assert!(parse_frequency("-3").is_err());
        assert!(parse_frequency("abc").is_err());
        assert!(parse_frequency("inf").is_err());
    }

    #[test]
    fn test_conversions_follow_config() {
        let mut config = EngineConfig::default();
        config.driver.update_interval_ms = 20;
        config.driver.max_block = 1024;
        config.output.device = Some("USB".to_string());
        config.output.channels = 1;

        let driver = driver_config(&config);
        assert_eq!(driver.update_interval, Duration::from_millis(20));
        assert_eq!(driver.latency_samples, 512);
        assert_eq!(driver.max_block, 1024);

        let stream = stream_config(&config);
        assert_eq!(stream.device_name.as_deref(), Some("USB"));
        assert_eq!(stream.channels, 1);
        assert_eq!(stream.sample_rate, 48000);
    }

    #[test]
    fn test_default_conversions_match_io_defaults() {
        let config = EngineConfig::default();
        assert_eq!(driver_config(&config), DriverConfig::default());
        assert_eq!(stream_config(&config), BackendStreamConfig::default());
    }
}
