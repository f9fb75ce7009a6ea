//! Error type for the block primitive.

use thiserror::Error;

/// Result alias used throughout `aes-core`.
pub type Result<T> = core::result::Result<T, Error>;

/// Failures raised by the key schedule.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A round key index outside `0..=10` was requested.
    #[error("round key index {round} is out of range (0..=10)")]
    RoundOutOfRange {
        /// The rejected index.
        round: usize,
    },
}
