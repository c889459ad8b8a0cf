//! Error types for the battle simulation.
//!
//! Errors only surface while building a world (configuration, grid
//! dimensions, assets) or while (de)serializing snapshots. Nothing inside a
//! frame returns an error: impossible operations degrade to a no-op.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for the simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Grid dimensions or cell size cannot describe a usable grid.
    #[error("Invalid spatial grid: {0}")]
    InvalidGrid(String),

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The asset loader could not provide a texture.
    #[error("Failed to load texture '{path}': {message}")]
    Asset {
        /// Path that was requested.
        path: String,
        /// Loader-provided message.
        message: String,
    },
}
