//! Engine configuration file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::paths;

/// Engine configuration: worker threads, driver timing and device output.
///
/// Every section and field is optional in the file; missing values take the
/// defaults shown below.
///
/// # TOML Format
///
/// ```toml
/// [engine]
/// threads = 4
///
/// [driver]
/// update_interval_ms = 15
/// latency_samples = 512
/// min_block = 0
/// max_block = 8192
///
/// [output]
/// device = "USB Audio"
/// sample_rate = 48000
/// buffer_size = 512
/// channels = 2
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Worker pool settings.
    #[serde(default)]
    pub engine: EngineSection,

    /// Block driver timing.
    #[serde(default)]
    pub driver: DriverSection,

    /// Device output settings.
    #[serde(default)]
    pub output: OutputSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineSection {
    /// Number of worker threads that run module tasks.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

/// `[driver]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverSection {
    /// Milliseconds between driver ticks.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Samples kept queued beyond one tick's worth.
    #[serde(default = "default_latency_samples")]
    pub latency_samples: usize,

    /// Smallest block the driver will render.
    #[serde(default)]
    pub min_block: usize,

    /// Largest block the driver will render in one tick.
    #[serde(default = "default_max_block")]
    pub max_block: usize,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputSection {
    /// Device index or name query. Unset selects the system default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Requested sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Device buffer size in frames.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,

    /// Device channel count. The mono graph output is copied to each.
    #[serde(default = "default_channels")]
    pub channels: u16,
}

fn default_threads() -> usize {
    1
}

fn default_update_interval_ms() -> u64 {
    15
}

fn default_latency_samples() -> usize {
    512
}

fn default_max_block() -> usize {
    8192
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_buffer_size() -> u32 {
    512
}

fn default_channels() -> u16 {
    2
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

impl Default for DriverSection {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            latency_samples: default_latency_samples(),
            min_block: 0,
            max_block: default_max_block(),
        }
    }
}

impl DriverSection {
    /// Returns the tick interval as a [`Duration`].
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            channels: default_channels(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&contents)
    }

    /// Load the user's configuration file, or the defaults if it does not exist.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = paths::default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.threads == 0 {
            return Err(ConfigError::invalid("engine.threads", "must be at least 1"));
        }

        let driver = &self.driver;
        if driver.update_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "driver.update_interval_ms",
                "must be greater than 0",
            ));
        }
        if driver.max_block == 0 {
            return Err(ConfigError::invalid(
                "driver.max_block",
                "must be greater than 0",
            ));
        }
        if driver.max_block < driver.min_block {
            return Err(ConfigError::invalid(
                "driver.max_block",
                format!(
                    "({}) must not be below driver.min_block ({})",
                    driver.max_block, driver.min_block
                ),
            ));
        }

        let output = &self.output;
        if output.sample_rate == 0 {
            return Err(ConfigError::invalid(
                "output.sample_rate",
                "must be greater than 0",
            ));
        }
        if output.buffer_size == 0 {
            return Err(ConfigError::invalid(
                "output.buffer_size",
                "must be greater than 0",
            ));
        }
        if output.channels == 0 {
            return Err(ConfigError::invalid("output.channels", "must be at least 1"));
        }

        Ok(())
    }
}
