//! # Statistics Error Types
//!
//! All errors that can occur while loading or saving statistics.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the statistics subsystem.
#[derive(Error, Debug)]
pub enum StatsError {
    /// Reading or writing the stats document failed.
    #[error("stats file {path}: {source}")]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The stats document as a whole could not be parsed.
    #[error("stats document is malformed: {0}")]
    Parse(String),

    /// A snapshot could not be encoded.
    #[error("failed to encode stats document: {0}")]
    Serialize(String),

    /// A document key was not a valid player identity.
    #[error("invalid player id: {0}")]
    InvalidPlayerId(String),

    /// The background writer is no longer running.
    #[error("stats writer thread has stopped")]
    WorkerStopped,

    /// The background writer could not be started.
    #[error("failed to start stats writer thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Failure injected by a repository (tests, remote stores).
    #[error("stats backend unavailable: {0}")]
    Backend(String),
}

/// Result type for statistics operations.
pub type StatsResult<T> = Result<T, StatsError>;
