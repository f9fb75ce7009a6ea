//! Key schedule state owned by a cipher instance: the expanded round keys,
//! the current initialization vector and the IV-embedding flag.

use rand::RngCore;

use crate::block::{xor_in_place, Block};
use crate::cipher::expand_key;
use crate::error::{Error, Result};
use crate::key::{Aes128Key, RoundKeys};
use crate::round;

/// Round keys plus IV state for one cipher instance.
///
/// Replacing the IV never touches the round keys; replacing the key never
/// touches the IV.
#[derive(Clone, Debug)]
pub struct KeySchedule {
    round_keys: RoundKeys,
    iv: Block,
    embed_iv: bool,
}

impl KeySchedule {
    /// Derives the schedule from up to 16 raw key bytes (zero padded).
    ///
    /// The IV starts out all zero and IV embedding is enabled.
    pub fn derive(key: &[u8]) -> Self {
        Self {
            round_keys: expand_key(&Aes128Key::from_slice(key)),
            iv: [0u8; 16],
            embed_iv: true,
        }
    }

    /// Re-derives every round key from a new secret.
    pub fn replace_key(&mut self, key: &[u8]) {
        self.round_keys = expand_key(&Aes128Key::from_slice(key));
    }

    /// Re-derives the round keys from the all-zero key.
    pub fn erase_key(&mut self) {
        self.round_keys = expand_key(&Aes128Key::ZERO);
    }

    /// Expanded round keys, indices 0..=10.
    pub fn round_keys(&self) -> &RoundKeys {
        &self.round_keys
    }

    /// Current initialization vector.
    pub fn iv(&self) -> &Block {
        &self.iv
    }

    /// Copies `iv` into the schedule. `None` leaves the stored IV untouched.
    pub fn set_iv(&mut self, iv: Option<&Block>) {
        if let Some(iv) = iv {
            self.iv = *iv;
        }
    }

    /// Replaces the IV with 16 bytes drawn from `rng`.
    pub fn randomize_iv<R: RngCore + ?Sized>(&mut self, rng: &mut R) {
        rng.fill_bytes(&mut self.iv);
    }

    /// Whether the IV is written to and read from the encrypted stream.
    pub fn embed_iv(&self) -> bool {
        self.embed_iv
    }

    /// Enables or disables IV embedding.
    pub fn set_embed_iv(&mut self, embed: bool) {
        self.embed_iv = embed;
    }

    /// XORs round key `round` into `block`.
    pub fn add_round_key(&self, block: &mut Block, round: usize) -> Result<()> {
        let key = self
            .round_keys
            .try_get(round)
            .ok_or(Error::RoundOutOfRange { round })?;
        round::add_round_key(block, key);
        Ok(())
    }

    /// XORs `other` into `block`, falling back to the stored IV when `other`
    /// is `None`.
    pub fn xor_iv(&self, block: &mut Block, other: Option<&Block>) {
        xor_in_place(block, other.unwrap_or(&self.iv));
    }
}

impl Default for KeySchedule {
    fn default() -> Self {
        Self::derive(&[])
    }
}
