//! Error types for patch loading and validation.

use std::path::PathBuf;

use tablefm_core::TableError;
use thiserror::Error;

/// Errors that can occur while loading, validating or applying a patch.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A value is outside the range the engine accepts
    #[error("invalid parameter '{param}' in {section}: {reason}")]
    InvalidParameter {
        /// Where the value was found, e.g. `engine` or `slot 2 envelope`.
        section: String,
        /// Name of the offending key.
        param: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A generated waveform did not fit the engine's tables
    #[error("waveform rejected: {0}")]
    Table(#[from] TableError),

    /// No factory patch with this name
    #[error("patch not found: {0}")]
    PatchNotFound(String),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a directory creation error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_param(
        section: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidParameter {
            section: section.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Create a patch not found error.
    pub fn patch_not_found(name: impl Into<String>) -> Self {
        ConfigError::PatchNotFound(name.into())
    }
}
