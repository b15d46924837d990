//! Configuration file handling for ~/.geoanchor/config.ini.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::ArConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ArConfig {
    /// Load from the default path (~/.geoanchor/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save to a specific path, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }
        std::fs::write(path, self.to_ini_string())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Render as a commented INI document.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Write the default config file if none exists. Returns its path.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// Get the path to the config directory (~/.geoanchor).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geoanchor")
}

/// Get the path to the config file (~/.geoanchor/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
