//! # World Error Types
//!
//! Failures a host can report when asked about a cell.

use crate::coords::Coordinate;
use thiserror::Error;

/// Errors a world query can produce.
///
/// None of these are fatal: the search treats every one of them as
/// "this cell does not match".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The chunk holding the cell is not loaded.
    #[error("cell {0} is in an unloaded region")]
    Unloaded(Coordinate),

    /// The coordinate lies outside the world's build limits.
    #[error("cell {0} is out of bounds")]
    OutOfBounds(Coordinate),

    /// Any other failure reported by the host.
    #[error("host world error: {0}")]
    Host(String),
}

/// Result type for world queries.
pub type WorldResult<T> = Result<T, WorldError>;
