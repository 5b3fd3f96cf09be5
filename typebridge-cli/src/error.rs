//! Error types for the CLI.
//!
//! This module defines all error types used throughout the CLI,
//! providing detailed error messages with context for debugging.

use std::path::PathBuf;
use thiserror::Error;

use typebridge::{AttributeError, PlanError};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error loading the universe manifest.
    #[error("Failed to load manifest: {0}")]
    Manifest(#[from] ManifestError),

    /// A setup pass rejected the inputs.
    #[error("Failed to build generation plan: {0}")]
    Plan(#[from] PlanError),

    /// One or more types could not be resolved.
    #[error("Failed to resolve {failed} type(s)")]
    Resolution { failed: usize },

    /// Validation failed (`check` found problems).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Error rendering JSON output.
    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid TOML syntax or schema.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error loading the universe manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Manifest file not found.
    #[error("Manifest not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid JSON syntax or schema.
    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },

    /// A type or shape refers to a data type the manifest does not define.
    #[error("'{owner}' refers to undefined data type '{data_type}'")]
    UnknownDataType { owner: String, data_type: String },

    /// A data type is defined twice.
    #[error("Data type '{name}' is defined more than once")]
    DuplicateDataType { name: String },

    /// A type declares an artifact attribute with an invalid field combination.
    #[error("Invalid artifact for '{owner}': {source}")]
    InvalidArtifact {
        owner: String,
        #[source]
        source: AttributeError,
    },

    /// IO error reading the manifest.
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Multiple manifest errors collected.
    #[error("Multiple manifest errors:\n{}", format_errors(.0))]
    Multiple(Vec<ManifestError>),
}

/// Format multiple errors for display.
fn format_errors(errors: &[ManifestError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ConfigError {
    /// Create a not found error.
    pub fn not_found(path: PathBuf) -> Self {
        Self::NotFound { path }
    }

    /// Create an invalid TOML error.
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }
}

impl ManifestError {
    /// Create an invalid JSON error.
    pub fn invalid_json(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidJson {
            path,
            message: message.into(),
        }
    }

    /// Create an unknown data type error.
    pub fn unknown_data_type(owner: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self::UnknownDataType {
            owner: owner.into(),
            data_type: data_type.into(),
        }
    }

    /// Collapse a list of errors into one.
    pub fn from_errors(mut errors: Vec<ManifestError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Multiple(errors)
        }
    }
}
