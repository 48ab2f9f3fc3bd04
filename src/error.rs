//! Error types for the fragment generator.
//!
//! This module defines the top-level errors with actionable messages and
//! recovery suggestions for the command line.

use crate::bundler::Error as BundlerError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fragment generation
pub type Result<T> = std::result::Result<T, WixError>;

/// Main error type for all fragment generation operations
#[derive(Error, Debug)]
pub enum WixError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Fragment generation errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] BundlerError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing Cargo.toml file
    #[error("Missing Cargo.toml file at {path}")]
    MissingCargoToml {
        /// Path where Cargo.toml was expected
        path: PathBuf,
    },

    /// Manifest lacks a required field
    #[error("Missing '{field}' in [package] of {path}")]
    MissingField {
        /// Field name
        field: &'static str,
        /// Manifest path
        path: PathBuf,
    },

    /// Application image directory does not exist
    #[error("Application image not found at {path}")]
    MissingAppImage {
        /// Expected image directory
        path: PathBuf,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

impl WixError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            WixError::Config(ConfigError::MissingCargoToml { path }) => vec![
                format!("Check that {} exists", path.display()),
                "Pass --manifest-path to point at the package manifest".to_string(),
            ],
            WixError::Config(ConfigError::MissingAppImage { path }) => vec![
                format!("Build the application image into {}", path.display()),
            ],
            WixError::Bundler(BundlerError::UnsupportedToolset { .. }) => vec![
                "Set [wix] toolset_version to a 3.x, 4.x, 5.x or 6.x release".to_string(),
                "Override it with --wix-version".to_string(),
            ],
            WixError::Bundler(BundlerError::NoShortcutFolder { .. }) => vec![
                "Enable start_menu_shortcuts or desktop_shortcuts in [wix]".to_string(),
            ],
            WixError::Bundler(BundlerError::InvalidPath { .. }) => vec![
                "Check [wix] install_dir and the launcher names in the configuration".to_string(),
            ],
            WixError::Toml(_) => {
                vec!["Fix the syntax of the configuration file".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
