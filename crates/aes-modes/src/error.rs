//! Error type for the mode layer and the buffer/file pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::mode::Mode;

/// Result alias used throughout `aes-modes`.
pub type Result<T> = core::result::Result<T, Error>;

/// Failures surfaced by stream, buffer, file and job operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Zero-length input.
    #[error("{}: input is empty", .mode.label())]
    EmptyInput {
        /// Mode of the rejecting cipher.
        mode: Mode,
    },

    /// A block-aligned mode was handed a length that is not a multiple of 16.
    #[error("{}: length {len} is not a multiple of 16", .mode.label())]
    UnalignedLength {
        /// Mode of the rejecting cipher.
        mode: Mode,
        /// Offending length in bytes.
        len: u64,
    },

    /// Ciphertext is too short to hold the embedded IV.
    #[error("ciphertext of {len} bytes is shorter than the 16-byte IV header")]
    MissingIvHeader {
        /// Length of the rejected input.
        len: u64,
    },

    /// The final block does not carry valid PKCS#7 padding.
    #[error("invalid padding (last byte {value:#04x})")]
    BadPadding {
        /// Value of the final byte.
        value: u8,
    },

    /// Chunk limit was zero or not a multiple of 16.
    #[error("buffer limit {limit} must be a non-zero multiple of 16")]
    InvalidBufferLimit {
        /// The rejected limit.
        limit: usize,
    },

    /// Mode selector did not name a supported mode.
    #[error("unknown mode `{0}` (expected ecb, cbc, cfb or ofb)")]
    UnknownMode(String),

    /// Text sources are encrypt-only.
    #[error("cannot decrypt text from the command line")]
    TextDecryptUnsupported,

    /// No source path or text was supplied.
    #[error("no source was given")]
    MissingSource,

    /// The job needs a destination path but none was supplied.
    #[error("no destination was given")]
    MissingDestination,

    /// Input and output name the same file.
    #[error("input and output are the same file: {}", .path.display())]
    SameInputOutput {
        /// The shared path.
        path: PathBuf,
    },

    /// Underlying I/O failure.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// The originating error.
        #[source]
        source: io::Error,
    },
}

/// Attaches a description to `std::io` results.
pub(crate) trait IoContext<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> IoContext<T> for core::result::Result<T, io::Error> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|source| Error::Io {
            context: f(),
            source,
        })
    }
}
