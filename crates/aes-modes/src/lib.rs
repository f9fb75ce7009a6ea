//! Modes of operation and a bounded-memory file pipeline on top of `aes-core`.
//!
//! A [`Cipher`] binds one key schedule to one [`Mode`] and exposes three
//! layers:
//! - in-place stream transforms ([`Cipher::encrypt_stream`],
//!   [`Cipher::decrypt_stream`]) that keep their chaining block between calls;
//! - whole-buffer encryption with PKCS#7 padding for ECB/CBC and an optional
//!   16-byte IV header;
//! - chunked file encryption bounded by [`Cipher::buffer_limit`].
//!
//! [`Job`] is the configuration record a front end fills in to run one
//! operation end to end.
//!
//! No authentication is performed; ciphertext integrity is not protected.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod buffer;
mod error;
mod file;
mod job;
mod mode;
pub mod padding;
mod stream;

pub use crate::error::{Error, Result};
pub use crate::file::FileReport;
pub use crate::job::{Job, Outcome, Source};
pub use crate::mode::{Direction, Mode};
pub use crate::stream::{Cipher, DEFAULT_BUFFER_LIMIT};
pub use aes_core::{Block, KeySchedule, BLOCK_LEN};
