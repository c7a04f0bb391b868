//! Engine configuration command.

use super::common::load_config;
use clap::{Args, Subcommand};
use partita_config::{EngineConfig, default_config_path, ensure_user_config_dir};
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show {
        /// Configuration file to read instead of the user config
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Write the default configuration to disk
    Init {
        /// Destination file (defaults to the user config path)
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the user config file path
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(ConfigCommand::Show { config: None }) {
        ConfigCommand::Show { config } => {
            let source = config.clone().unwrap_or_else(default_config_path);
            let effective = load_config(config.as_deref())?;
            println!("# {}", source.display());
            print!("{}", effective.to_toml()?);
        }

        ConfigCommand::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => {
                    ensure_user_config_dir()?;
                    default_config_path()
                }
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            EngineConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }

        ConfigCommand::Path => {
            println!("{}", default_config_path().display());
        }
    }

    Ok(())
}
