//! # Error Types
//!
//! Configuration and statistics errors surface to the host; harvest errors
//! never leave the per-block loop.

use std::path::PathBuf;
use thiserror::Error;
use veinminer_core::{BlockKind, Coordinate};
use veinminer_stats::StatsError;

/// Errors surfaced to the host by the lifecycle calls.
#[derive(Error, Debug)]
pub enum VeinMinerError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Statistics could not be started or saved.
    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Result type for lifecycle calls.
pub type VeinMinerResult<T> = Result<T, VeinMinerError>;

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("config file {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config is not valid TOML or has the wrong shape.
    #[error("config is malformed: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure to break one block of a vein.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarvestError {
    /// The host could not compute the block's drops.
    #[error("drops unavailable at {at}: {reason}")]
    Drops {
        /// The block.
        at: Coordinate,
        /// Host description.
        reason: String,
    },

    /// The host refused to clear the cell.
    #[error("failed to clear {at}: {reason}")]
    ClearFailed {
        /// The block.
        at: Coordinate,
        /// Host description.
        reason: String,
    },

    /// The cell could not be read.
    #[error("block at {at} unreadable: {reason}")]
    Unreadable {
        /// The block.
        at: Coordinate,
        /// Host description.
        reason: String,
    },

    /// The cell no longer holds the vein's kind.
    #[error("block at {at} changed to {found}")]
    KindChanged {
        /// The block.
        at: Coordinate,
        /// What is there now.
        found: BlockKind,
    },
}

/// Result type for one block of a harvest.
pub type BlockResult<T> = Result<T, HarvestError>;
