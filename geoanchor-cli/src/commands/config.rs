//! Configuration management CLI commands.
//!
//! Provides `config show`, `config path` and `config init`.

use std::path::PathBuf;

use clap::Subcommand;
use geoanchor::config::config_file_path;
use geoanchor::ArConfig;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as INI
    Show {
        /// Read this file instead of ~/.geoanchor/config.ini
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show the configuration file path
    Path,

    /// Write a default configuration file if none exists
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show { file } => run_show(file),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Init => run_init(),
    }
}

fn run_show(file: Option<PathBuf>) -> Result<(), CliError> {
    let path = file.unwrap_or_else(config_file_path);
    let config = ArConfig::load_from(&path)?;
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    let path = config_file_path();
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist, defaults are in effect)");
    }
    Ok(())
}

fn run_init() -> Result<(), CliError> {
    let existed = config_file_path().exists();
    let path = ArConfig::ensure_exists()?;
    if existed {
        println!("Configuration already exists: {}", path.display());
    } else {
        println!("Wrote default configuration: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_reads_given_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[tracking]\naccuracy_threshold = 5\n").unwrap();

        assert!(run_show(Some(path)).is_ok());
    }

    #[test]
    fn test_show_rejects_invalid_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[camera]\nfacing = front\n").unwrap();

        match run_show(Some(path)) {
            Err(CliError::Config(msg)) => assert!(msg.contains("camera.facing")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
