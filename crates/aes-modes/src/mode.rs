//! Mode and direction selectors.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// Block cipher mode of operation, fixed for the lifetime of a [`Cipher`](crate::Cipher).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Electronic codebook: every block is transformed independently.
    Ecb,
    /// Cipher block chaining.
    Cbc,
    /// Full-block cipher feedback.
    Cfb,
    /// Output feedback.
    Ofb,
}

impl Mode {
    /// Every supported mode.
    pub const ALL: [Mode; 4] = [Mode::Ecb, Mode::Cbc, Mode::Cfb, Mode::Ofb];

    /// Tag used in log and error messages, e.g. `AES CBC`.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Ecb => "AES ECB",
            Mode::Cbc => "AES CBC",
            Mode::Cfb => "AES CFB",
            Mode::Ofb => "AES OFB",
        }
    }

    /// Block-aligned modes need PKCS#7 padding and reject partial blocks.
    pub fn is_padded(self) -> bool {
        matches!(self, Mode::Ecb | Mode::Cbc)
    }

    /// Whether the mode consumes an initialization vector.
    pub fn uses_iv(self) -> bool {
        !matches!(self, Mode::Ecb)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Ecb => "ecb",
            Mode::Cbc => "cbc",
            Mode::Cfb => "cfb",
            Mode::Ofb => "ofb",
        };
        f.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ecb" => Ok(Mode::Ecb),
            "cbc" => Ok(Mode::Cbc),
            "cfb" => Ok(Mode::Cfb),
            "ofb" => Ok(Mode::Ofb),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

/// Whether a transform encrypts or decrypts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Plaintext to ciphertext.
    Encrypt,
    /// Ciphertext to plaintext.
    Decrypt,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Encrypt => "encrypt",
            Direction::Decrypt => "decrypt",
        })
    }
}
