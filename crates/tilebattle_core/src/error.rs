//! Errors for data entering a session from outside.
//!
//! Gameplay itself cannot fail. Only snapshots read back from disk or
//! received from a peer are checked, before they become a live [`Game`].
//!
//! [`Game`]: crate::Game

use std::time::Duration;

use thiserror::Error;

/// Why a snapshot was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// A tile holds a value no sequence of moves can produce.
    #[error("invalid tile value {value} at row {row}, column {col}")]
    InvalidTile {
        /// Row of the tile.
        row: usize,
        /// Column of the tile.
        col: usize,
        /// Offending value.
        value: u32,
    },

    /// The timer reading is beyond any real session.
    #[error("elapsed time {0:?} out of range")]
    ElapsedOutOfRange(Duration),
}

/// Result type for snapshot checks.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
