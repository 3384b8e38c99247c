//! Core error types for breathwork-core.
//!
//! Three families matter to the timing engine:
//! - [`ConfigError`]: bad catalog data or an unknown id. Returned synchronously
//!   from selection operations; the session keeps its prior state.
//! - [`CollaboratorError`]: a persistence or export side effect failed. Never
//!   propagated into the timing loop, only reported.
//! - Invariant violations are `debug_assert!`s at the point of use.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breathwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Catalog or settings errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Side-effect failures surfaced through a fallible API
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// SQLite errors from the daily log
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration errors: invalid techniques, presets, or settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("technique '{technique}' has no steps")]
    EmptySteps { technique: String },

    #[error("technique '{technique}' step {index} has a zero duration")]
    ZeroDuration { technique: String, index: usize },

    #[error("technique '{technique}' step {index} has a non-positive scale")]
    NonPositiveScale { technique: String, index: usize },

    #[error("technique '{technique}' step {index} has an invalid vibration pattern")]
    InvalidVibration { technique: String, index: usize },

    #[error("preset '{preset}' has no segments")]
    EmptySegments { preset: String },

    #[error("preset '{preset}' segment {index} has a zero duration")]
    ZeroSegmentDuration { preset: String, index: usize },

    #[error("unknown technique: {0}")]
    UnknownTechnique(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("duplicate catalog id: {0}")]
    DuplicateId(String),

    #[error("catalog contains no techniques")]
    EmptyCatalog,

    /// A phase clock was asked to time a zero-length step.
    #[error("phase duration must be greater than zero")]
    ZeroPhaseDuration,

    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures reported by side-effect collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Local persistence write failed
    #[error("storage write failed: {0}")]
    Storage(String),

    /// Health-platform export failed
    #[error("session export failed: {0}")]
    Export(String),

    /// Collaborator is not reachable right now
    #[error("{service} unavailable")]
    Unavailable { service: String },
}

impl From<rusqlite::Error> for CollaboratorError {
    fn from(err: rusqlite::Error) -> Self {
        CollaboratorError::Storage(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
