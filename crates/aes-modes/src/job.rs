//! The configuration record handed over by a front end, and its execution.

use std::fs;
use std::path::PathBuf;

use aes_core::Block;
use log::{info, warn};

use crate::error::{Error, IoContext, Result};
use crate::mode::{Direction, Mode};
use crate::stream::Cipher;

/// Where the input comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// A file on disk.
    File(PathBuf),
    /// Literal text, encrypt only.
    Text(String),
}

/// One encrypt or decrypt request.
///
/// Destination naming is the caller's job; `destination` must be set unless
/// the ciphertext is only printed.
#[derive(Clone, Debug)]
pub struct Job {
    /// Encrypt or decrypt.
    pub direction: Direction,
    /// Mode of operation.
    pub mode: Mode,
    /// Input file or text.
    pub source: Source,
    /// Output file.
    pub destination: Option<PathBuf>,
    /// Raw key bytes; at most 16 are used, shorter keys are zero padded.
    pub key: Vec<u8>,
    /// IV used when decrypting without an embedded header.
    pub iv: Option<Block>,
    /// Write/read the IV as a 16-byte header.
    pub embed_iv: bool,
    /// Return the ciphertext of a text source instead of writing it.
    pub print_ciphertext: bool,
    /// Chunk limit for file processing.
    pub buffer_limit: Option<usize>,
    /// Seed for reproducible IVs.
    pub seed: Option<u64>,
}

/// Result of a finished job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Output went to a file.
    Written {
        /// Destination path.
        path: PathBuf,
        /// Bytes written, header included.
        bytes: u64,
        /// IV used by the operation.
        iv: Block,
    },
    /// Ciphertext returned to the caller for display.
    Printed {
        /// Encrypted bytes, header included.
        ciphertext: Vec<u8>,
        /// IV used by the operation.
        iv: Block,
    },
}

impl Job {
    /// Creates a job with an empty key, embedded IV and default chunk size.
    pub fn new(direction: Direction, mode: Mode, source: Source) -> Self {
        Self {
            direction,
            mode,
            source,
            destination: None,
            key: Vec::new(),
            iv: None,
            embed_iv: true,
            print_ciphertext: false,
            buffer_limit: None,
            seed: None,
        }
    }

    /// Checks the record for configuration errors before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        match &self.source {
            Source::File(path) if path.as_os_str().is_empty() => return Err(Error::MissingSource),
            Source::Text(_) if self.direction == Direction::Decrypt => {
                return Err(Error::TextDecryptUnsupported)
            }
            _ => {}
        }
        let printing = self.print_ciphertext && matches!(self.source, Source::Text(_));
        if self.destination.is_none() && !printing {
            return Err(Error::MissingDestination);
        }
        if let Some(limit) = self.buffer_limit {
            if limit == 0 || limit % aes_core::BLOCK_LEN != 0 {
                return Err(Error::InvalidBufferLimit { limit });
            }
        }
        Ok(())
    }

    /// Builds the cipher described by this job.
    pub fn cipher(&self) -> Result<Cipher> {
        let mut cipher = match self.seed {
            Some(seed) => Cipher::with_seed(self.mode, &self.key, seed),
            None => Cipher::new(self.mode, &self.key),
        };
        cipher.set_embed_iv(self.embed_iv);
        cipher.set_iv(self.iv.as_ref());
        if let Some(limit) = self.buffer_limit {
            cipher.set_buffer_limit(limit)?;
        }
        Ok(cipher)
    }

    /// Whether the IV travels outside the output and has to be passed on
    /// separately. Always false for ECB, which has no IV.
    pub fn detaches_iv(&self) -> bool {
        self.mode.uses_iv() && !self.embed_iv
    }

    /// Validates and executes the job.
    pub fn run(&self) -> Result<Outcome> {
        self.validate()?;
        if self.key.is_empty() {
            warn!("no key set, result will be insecure");
        }
        if self.direction == Direction::Decrypt && self.detaches_iv() && self.iv.is_none() {
            warn!("{}: decrypting with the all-zero IV", self.mode.label());
        }
        let mut cipher = self.cipher()?;

        match (&self.source, self.direction) {
            (Source::Text(_), Direction::Decrypt) => Err(Error::TextDecryptUnsupported),
            (Source::Text(text), Direction::Encrypt) => {
                let ciphertext = cipher.encrypt_buffer(text.as_bytes())?;
                let iv = *cipher.iv();
                match (&self.destination, self.print_ciphertext) {
                    (_, true) => Ok(Outcome::Printed { ciphertext, iv }),
                    (Some(path), false) => {
                        fs::write(path, &ciphertext)
                            .io_context(|| format!("write {}", path.display()))?;
                        info!("{}: wrote {}", self.mode.label(), path.display());
                        Ok(Outcome::Written {
                            path: path.clone(),
                            bytes: ciphertext.len() as u64,
                            iv,
                        })
                    }
                    (None, false) => Err(Error::MissingDestination),
                }
            }
            (Source::File(input), direction) => {
                let output = self.destination.as_ref().ok_or(Error::MissingDestination)?;
                let report = match direction {
                    Direction::Encrypt => cipher.encrypt_file(input, output)?,
                    Direction::Decrypt => cipher.decrypt_file(input, output)?,
                };
                Ok(Outcome::Written {
                    path: output.clone(),
                    bytes: report.bytes_written,
                    iv: report.iv,
                })
            }
        }
    }
}
