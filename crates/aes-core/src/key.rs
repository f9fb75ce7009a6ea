//! Key types for AES-128.

use crate::block::{Block, BLOCK_LEN};

/// Number of round keys produced by the AES-128 schedule.
pub const ROUND_KEY_COUNT: usize = 11;

/// AES-128 key wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Aes128Key(pub [u8; 16]);

impl Aes128Key {
    /// The all-zero key used after an erase.
    pub const ZERO: Self = Self([0u8; 16]);

    /// Builds a key from up to 16 raw bytes.
    ///
    /// Shorter input is zero padded; bytes past the sixteenth are ignored.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut key = [0u8; BLOCK_LEN];
        let take = bytes.len().min(BLOCK_LEN);
        key[..take].copy_from_slice(&bytes[..take]);
        Self(key)
    }
}

impl From<[u8; 16]> for Aes128Key {
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Aes128Key {
    fn from(value: &[u8]) -> Self {
        Self::from_slice(value)
    }
}

/// Expanded round keys for AES-128.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundKeys(pub [Block; ROUND_KEY_COUNT]);

impl RoundKeys {
    /// Returns the round key at the requested index (0..=10).
    #[inline]
    pub fn get(&self, round: usize) -> &Block {
        &self.0[round]
    }

    /// Returns the round key at `round`, or `None` past the last round.
    #[inline]
    pub fn try_get(&self, round: usize) -> Option<&Block> {
        self.0.get(round)
    }
}
