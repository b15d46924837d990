//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use geoanchor::config::ConfigFileError;
use geoanchor::ViewError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
    /// The simulated view reported an error
    View(ViewError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::View(ViewError::VpsTimeout { guidance, .. }) => {
                eprintln!();
                eprintln!("{}", guidance);
                eprintln!("Try a later --converge-at or a larger init_timeout_ticks.");
            }
            CliError::View(ViewError::NotReady(_)) => {
                eprintln!();
                eprintln!("Placement needs VPS accuracy under the configured threshold.");
                eprintln!("Lower --h-acc/--v-acc or raise tracking.accuracy_threshold.");
            }
            CliError::View(ViewError::NetworkUnavailable) => {
                eprintln!();
                eprintln!("VPS downloads mapping data; connect to the internet and retry.");
            }
            CliError::View(ViewError::LocationDisabled) => {
                eprintln!();
                eprintln!("Switch on GPS or network location and retry.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the file with: geoanchor config path");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::View(e) => write!(f, "[{}] {}", e.code(), e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } => Some(error),
            CliError::View(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ViewError> for CliError {
    fn from(e: ViewError) -> Self {
        CliError::View(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_error_shows_code() {
        let err = CliError::from(ViewError::NotFound("model-3".to_string()));
        assert_eq!(err.to_string(), "[NOT_FOUND] model 'model-3' not found");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = CliError::FileRead {
            path: "models.json".to_string(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(CliError::Config("bad".to_string()).source().is_none());
    }
}
