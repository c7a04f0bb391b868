//! Engine configuration for Partita.
//!
//! [`EngineConfig`] is read from and written to a TOML file, by default
//! `engine.toml` in the platform's user configuration directory:
//!
//! - Linux: `~/.config/partita/engine.toml`
//! - macOS: `~/Library/Application Support/partita/engine.toml`
//! - Windows: `%APPDATA%\partita\engine.toml`
//!
//! ```rust,no_run
//! use partita_config::EngineConfig;
//!
//! let mut config = EngineConfig::load_or_default()?;
//! config.engine.threads = 4;
//! config.save(partita_config::default_config_path())?;
//! # Ok::<(), partita_config::ConfigError>(())
//! ```

mod engine;
mod error;
mod paths;

pub use engine::{DriverSection, EngineConfig, EngineSection, OutputSection};
pub use error::ConfigError;
pub use paths::{CONFIG_FILE_NAME, default_config_path, ensure_user_config_dir, user_config_dir};
