//! Chunked file encryption.
//!
//! Files are processed `buffer_limit` bytes at a time so memory use stays
//! bounded. Only the final chunk is padded (or unpadded); the chaining block
//! carries across chunk boundaries.
//!
//! The input length is taken once, when the file is opened. Bytes appended
//! to the input while an operation runs are not processed.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use aes_core::{Block, BLOCK_LEN};
use log::{debug, info, warn};

use crate::error::{Error, IoContext, Result};
use crate::mode::Direction;
use crate::padding;
use crate::stream::Cipher;

/// Summary of a completed file operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileReport {
    /// Bytes read from the input file, header included.
    pub bytes_read: u64,
    /// Bytes written to the output file, header included.
    pub bytes_written: u64,
    /// Number of chunks the payload was split into.
    pub chunks: u64,
    /// IV the operation ran with.
    pub iv: Block,
}

impl Cipher {
    /// Encrypts `input` into `output` as `[IV][ciphertext]`.
    ///
    /// Draws a fresh IV. A partially written output file is left in place
    /// when an I/O error interrupts the operation.
    pub fn encrypt_file(&mut self, input: &Path, output: &Path) -> Result<FileReport> {
        self.encrypt_file_inner(input, output)
            .map_err(|err| self.fail("encrypt file", err))
    }

    fn encrypt_file_inner(&mut self, input: &Path, output: &Path) -> Result<FileReport> {
        let mut reader =
            File::open(input).io_context(|| format!("open {}", input.display()))?;
        let total = input_len(&reader, input)?;
        if total == 0 {
            return Err(Error::EmptyInput { mode: self.mode() });
        }
        reject_same_file(input, output)?;

        self.fresh_iv();
        let mut writer = BufWriter::new(
            File::create(output).io_context(|| format!("create {}", output.display()))?,
        );
        let write_ctx = || format!("write {}", output.display());
        let read_ctx = || format!("read {}", input.display());

        let mut written = 0u64;
        if self.embed_iv() {
            writer.write_all(self.iv()).io_context(write_ctx)?;
            written += BLOCK_LEN as u64;
        }

        let limit = self.buffer_limit() as u64;
        let mut buf = Vec::with_capacity(total.min(limit) as usize + BLOCK_LEN);
        let mut remaining = total;
        let mut chunks = 0u64;

        while remaining > limit {
            buf.resize(limit as usize, 0);
            reader.read_exact(&mut buf).io_context(read_ctx)?;
            self.apply(Direction::Encrypt, &mut buf)?;
            writer.write_all(&buf).io_context(write_ctx)?;
            written += limit;
            remaining -= limit;
            chunks += 1;
        }

        let last = remaining as usize;
        buf.resize(last, 0);
        reader.read_exact(&mut buf).io_context(read_ctx)?;
        if self.mode().is_padded() {
            padding::append(&mut buf, last);
        }
        self.apply(Direction::Encrypt, &mut buf)?;
        writer.write_all(&buf).io_context(write_ctx)?;
        writer.flush().io_context(write_ctx)?;
        written += buf.len() as u64;
        chunks += 1;

        info!(
            "{}: encrypted {} -> {} ({} bytes, {} chunks)",
            self.mode().label(),
            input.display(),
            output.display(),
            written,
            chunks
        );
        Ok(FileReport {
            bytes_read: total,
            bytes_written: written,
            chunks,
            iv: *self.iv(),
        })
    }

    /// Decrypts a file written by [`Cipher::encrypt_file`].
    ///
    /// With IV embedding enabled the header replaces the stored IV. Length
    /// problems are detected before `output` is created; a padding failure on
    /// the final chunk removes the output again.
    pub fn decrypt_file(&mut self, input: &Path, output: &Path) -> Result<FileReport> {
        self.decrypt_file_inner(input, output)
            .map_err(|err| self.fail("decrypt file", err))
    }

    fn decrypt_file_inner(&mut self, input: &Path, output: &Path) -> Result<FileReport> {
        let mut reader =
            File::open(input).io_context(|| format!("open {}", input.display()))?;
        let read_ctx = || format!("read {}", input.display());
        let total = input_len(&reader, input)?;
        if total == 0 {
            return Err(Error::EmptyInput { mode: self.mode() });
        }
        reject_same_file(input, output)?;

        let mut remaining = total;
        if self.embed_iv() {
            if total < BLOCK_LEN as u64 {
                return Err(Error::MissingIvHeader { len: total });
            }
            let mut iv = [0u8; BLOCK_LEN];
            reader.read_exact(&mut iv).io_context(read_ctx)?;
            self.set_iv(Some(&iv));
            remaining -= BLOCK_LEN as u64;
        } else {
            self.reset_chain();
        }

        if remaining == 0 {
            return Err(Error::EmptyInput { mode: self.mode() });
        }
        if self.mode().is_padded() && remaining % BLOCK_LEN as u64 != 0 {
            return Err(Error::UnalignedLength {
                mode: self.mode(),
                len: remaining,
            });
        }

        let mut writer = BufWriter::new(
            File::create(output).io_context(|| format!("create {}", output.display()))?,
        );
        let write_ctx = || format!("write {}", output.display());

        let limit = self.buffer_limit() as u64;
        let mut buf = Vec::with_capacity(remaining.min(limit) as usize);
        let mut written = 0u64;
        let mut chunks = 0u64;

        while remaining > limit {
            buf.resize(limit as usize, 0);
            reader.read_exact(&mut buf).io_context(read_ctx)?;
            self.apply(Direction::Decrypt, &mut buf)?;
            writer.write_all(&buf).io_context(write_ctx)?;
            written += limit;
            remaining -= limit;
            chunks += 1;
        }

        buf.resize(remaining as usize, 0);
        reader.read_exact(&mut buf).io_context(read_ctx)?;
        self.apply(Direction::Decrypt, &mut buf)?;
        let keep = if self.mode().is_padded() {
            match padding::unpadded_len(&buf) {
                Ok(len) => len,
                Err(err) => {
                    drop(writer);
                    discard(output);
                    return Err(err);
                }
            }
        } else {
            buf.len()
        };
        writer.write_all(&buf[..keep]).io_context(write_ctx)?;
        writer.flush().io_context(write_ctx)?;
        written += keep as u64;
        chunks += 1;

        info!(
            "{}: decrypted {} -> {} ({} bytes, {} chunks)",
            self.mode().label(),
            input.display(),
            output.display(),
            written,
            chunks
        );
        Ok(FileReport {
            bytes_read: total,
            bytes_written: written,
            chunks,
            iv: *self.iv(),
        })
    }
}

fn input_len(file: &File, path: &Path) -> Result<u64> {
    let meta = file
        .metadata()
        .io_context(|| format!("stat {}", path.display()))?;
    debug!("{}: {} bytes", path.display(), meta.len());
    Ok(meta.len())
}

/// Fails when `output` resolves to the already-open `input`, which
/// `File::create` would truncate before it is read.
fn reject_same_file(input: &Path, output: &Path) -> Result<()> {
    let Ok(out) = fs::canonicalize(output) else {
        return Ok(());
    };
    let inp: PathBuf =
        fs::canonicalize(input).io_context(|| format!("resolve {}", input.display()))?;
    if inp == out {
        return Err(Error::SameInputOutput { path: inp });
    }
    Ok(())
}

fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!("could not remove {}: {err}", path.display());
    }
}
