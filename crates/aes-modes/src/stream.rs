//! The cipher instance and the in-place stream transform of each mode.
//!
//! A [`Cipher`] owns one [`KeySchedule`], is fixed to one [`Mode`], and keeps
//! a 16-byte chaining block between calls so a stream can be fed through in
//! several block-aligned pieces. The chaining block is reloaded from the IV
//! whenever the IV changes or [`Cipher::reset_chain`] is called.

use aes_core::{
    decrypt_in_place, encrypt_in_place, xor_in_place, xor_prefix, Block, KeySchedule, BLOCK_LEN,
};
use log::{error, trace};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{Error, Result};
use crate::mode::{Direction, Mode};

/// Default cap on the bytes held in memory per file chunk.
pub const DEFAULT_BUFFER_LIMIT: usize = 128_000_000;

/// AES-128 cipher bound to one mode of operation.
pub struct Cipher {
    mode: Mode,
    schedule: KeySchedule,
    chain: Block,
    buffer_limit: usize,
    rng: ChaCha20Rng,
}

impl Cipher {
    /// Creates a cipher whose IVs are drawn from an OS-seeded generator.
    pub fn new(mode: Mode, key: &[u8]) -> Self {
        Self::with_rng(mode, key, seeded_rng(None))
    }

    /// Creates a cipher with a reproducible IV sequence.
    pub fn with_seed(mode: Mode, key: &[u8], seed: u64) -> Self {
        Self::with_rng(mode, key, seeded_rng(Some(seed)))
    }

    fn with_rng(mode: Mode, key: &[u8], rng: ChaCha20Rng) -> Self {
        let mut schedule = KeySchedule::derive(key);
        if !mode.uses_iv() {
            schedule.set_embed_iv(false);
        }
        let chain = *schedule.iv();
        Self {
            mode,
            schedule,
            chain,
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            rng,
        }
    }

    /// Mode this cipher was built for.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Key schedule backing this cipher.
    pub fn schedule(&self) -> &KeySchedule {
        &self.schedule
    }

    /// Re-derives the round keys from a new secret.
    pub fn replace_key(&mut self, key: &[u8]) {
        self.schedule.replace_key(key);
    }

    /// Re-derives the round keys from the all-zero key.
    pub fn erase_key(&mut self) {
        self.schedule.erase_key();
    }

    /// Current IV.
    pub fn iv(&self) -> &Block {
        self.schedule.iv()
    }

    /// Replaces the IV (`None` keeps the current one) and restarts chaining.
    pub fn set_iv(&mut self, iv: Option<&Block>) {
        self.schedule.set_iv(iv);
        self.reset_chain();
    }

    /// Whether encrypted output carries the IV as a 16-byte header.
    pub fn embed_iv(&self) -> bool {
        self.schedule.embed_iv()
    }

    /// Enables or disables the IV header. ECB never embeds an IV.
    pub fn set_embed_iv(&mut self, embed: bool) {
        if embed && !self.mode.uses_iv() {
            trace!("{}: ignoring IV embedding request", self.mode.label());
            return;
        }
        self.schedule.set_embed_iv(embed);
    }

    /// Maximum number of bytes processed per file chunk.
    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// Sets the file chunk limit. Must be a non-zero multiple of 16; on error
    /// the previous limit stays in place.
    pub fn set_buffer_limit(&mut self, limit: usize) -> Result<()> {
        if limit == 0 || limit % BLOCK_LEN != 0 {
            return Err(self.fail("set buffer limit", Error::InvalidBufferLimit { limit }));
        }
        self.buffer_limit = limit;
        Ok(())
    }

    /// Reloads the chaining block from the IV, starting a new logical stream.
    pub fn reset_chain(&mut self) {
        self.chain = *self.schedule.iv();
    }

    /// Draws a fresh IV for a new encryption and restarts chaining.
    pub(crate) fn fresh_iv(&mut self) {
        self.schedule.randomize_iv(&mut self.rng);
        self.reset_chain();
    }

    /// Encrypts `buf` in place, continuing from the current chaining block.
    pub fn encrypt_stream(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream_transform(Direction::Encrypt, buf)
    }

    /// Decrypts `buf` in place, continuing from the current chaining block.
    pub fn decrypt_stream(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream_transform(Direction::Decrypt, buf)
    }

    /// Runs the mode's transform over `buf` in place.
    ///
    /// ECB and CBC need a non-empty, block-aligned buffer. CFB and OFB accept
    /// a trailing partial block, which must be the last piece of the stream.
    pub fn stream_transform(&mut self, direction: Direction, buf: &mut [u8]) -> Result<()> {
        self.apply(direction, buf).map_err(|err| {
            let op = format!("{direction} stream");
            self.fail(&op, err)
        })
    }

    pub(crate) fn apply(&mut self, direction: Direction, buf: &mut [u8]) -> Result<()> {
        self.check_length(buf.len())?;
        trace!("{}: {} {} bytes", self.mode.label(), direction, buf.len());

        let schedule = &self.schedule;
        let keys = schedule.round_keys();
        let chain = &mut self.chain;

        match (self.mode, direction) {
            (Mode::Ecb, Direction::Encrypt) => {
                for_each_block(buf, |block| encrypt_in_place(block, keys));
            }
            (Mode::Ecb, Direction::Decrypt) => {
                for_each_block(buf, |block| decrypt_in_place(block, keys));
            }
            (Mode::Cbc, Direction::Encrypt) => {
                for_each_block(buf, |block| {
                    schedule.xor_iv(block, Some(&*chain));
                    encrypt_in_place(block, keys);
                    *chain = *block;
                });
            }
            (Mode::Cbc, Direction::Decrypt) => {
                for_each_block(buf, |block| {
                    let ciphertext = *block;
                    decrypt_in_place(block, keys);
                    schedule.xor_iv(block, Some(&*chain));
                    *chain = ciphertext;
                });
            }
            (Mode::Cfb, Direction::Encrypt) => {
                let tail = for_each_block(buf, |block| {
                    encrypt_in_place(chain, keys);
                    xor_in_place(block, chain);
                    *chain = *block;
                });
                keystream_tail(tail, chain, keys);
            }
            (Mode::Cfb, Direction::Decrypt) => {
                let tail = for_each_block(buf, |block| {
                    let ciphertext = *block;
                    encrypt_in_place(chain, keys);
                    xor_in_place(block, chain);
                    *chain = ciphertext;
                });
                keystream_tail(tail, chain, keys);
            }
            (Mode::Ofb, _) => {
                let tail = for_each_block(buf, |block| {
                    encrypt_in_place(chain, keys);
                    xor_in_place(block, chain);
                });
                keystream_tail(tail, chain, keys);
            }
        }
        Ok(())
    }

    fn check_length(&self, len: usize) -> Result<()> {
        if len == 0 {
            return Err(Error::EmptyInput { mode: self.mode });
        }
        if self.mode.is_padded() && len % BLOCK_LEN != 0 {
            return Err(Error::UnalignedLength {
                mode: self.mode,
                len: len as u64,
            });
        }
        Ok(())
    }

    /// Logs `err` tagged with the mode and `op`, then hands it back.
    pub(crate) fn fail(&self, op: &str, err: Error) -> Error {
        error!("{} {op}: {err}", self.mode.label());
        err
    }
}

impl core::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cipher")
            .field("mode", &self.mode)
            .field("embed_iv", &self.schedule.embed_iv())
            .field("buffer_limit", &self.buffer_limit)
            .finish_non_exhaustive()
    }
}

/// Applies `f` to every full block of `buf` and returns the trailing bytes.
fn for_each_block(buf: &mut [u8], mut f: impl FnMut(&mut Block)) -> &mut [u8] {
    let mut chunks = buf.chunks_exact_mut(BLOCK_LEN);
    for chunk in &mut chunks {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(chunk);
        f(&mut block);
        chunk.copy_from_slice(&block);
    }
    chunks.into_remainder()
}

/// XORs one more keystream block into a 1..=15 byte tail.
fn keystream_tail(tail: &mut [u8], chain: &mut Block, keys: &aes_core::RoundKeys) {
    if tail.is_empty() {
        return;
    }
    encrypt_in_place(chain, keys);
    xor_prefix(tail, chain);
}

fn seeded_rng(seed: Option<u64>) -> ChaCha20Rng {
    let mut seed_bytes = [0u8; 32];
    match seed {
        Some(value) => seed_bytes[..8].copy_from_slice(&value.to_le_bytes()),
        None => rand::rngs::OsRng.fill_bytes(&mut seed_bytes),
    }
    ChaCha20Rng::from_seed(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // SP 800-38A, appendix F.
    const KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const IV: &str = "000102030405060708090a0b0c0d0e0f";
    const PLAIN: &str = "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51";

    fn vector_cipher(mode: Mode) -> Cipher {
        let mut cipher = Cipher::with_seed(mode, &hex::decode(KEY).unwrap(), 1);
        let iv: Block = hex::decode(IV).unwrap().try_into().unwrap();
        cipher.set_iv(Some(&iv));
        cipher
    }

    fn check_vector(mode: Mode, expected: &str) {
        let mut buf = hex::decode(PLAIN).unwrap();
        let mut cipher = vector_cipher(mode);
        cipher.encrypt_stream(&mut buf).unwrap();
        assert_eq!(hex::encode(&buf), expected, "{mode} encrypt");

        let mut cipher = vector_cipher(mode);
        cipher.decrypt_stream(&mut buf).unwrap();
        assert_eq!(hex::encode(&buf), PLAIN, "{mode} decrypt");
    }

    #[test]
    fn ecb_matches_sp800_38a() {
        let mut buf = hex::decode(&PLAIN[..32]).unwrap();
        vector_cipher(Mode::Ecb).encrypt_stream(&mut buf).unwrap();
        assert_eq!(hex::encode(buf), "3ad77bb40d7a3660a89ecaf32466ef97");
    }

    #[test]
    fn ecb_matches_fips_197() {
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let mut buf = hex::decode("00112233445566778899aabbccddeeff").unwrap();
        Cipher::new(Mode::Ecb, &key).encrypt_stream(&mut buf).unwrap();
        assert_eq!(hex::encode(buf), "69c4e0d86a7b0430d8cdb78070b4c55a");
    }

    #[test]
    fn cbc_matches_sp800_38a() {
        check_vector(
            Mode::Cbc,
            "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2",
        );
    }

    #[test]
    fn cfb_matches_sp800_38a() {
        check_vector(
            Mode::Cfb,
            "3b3fd92eb72dad20333449f8e83cfb4ac8a64537a0b3a93fcde3cdad9f1ce58b",
        );
    }

    #[test]
    fn ofb_matches_sp800_38a() {
        check_vector(
            Mode::Ofb,
            "3b3fd92eb72dad20333449f8e83cfb4a7789508d16918f03f53c52dac54ed825",
        );
    }

    #[test]
    fn ecb_accepts_any_multiple_of_sixteen() {
        let mut cipher = Cipher::new(Mode::Ecb, b"key");
        for len in [16usize, 32, 48, 64] {
            let mut buf = vec![0u8; len];
            cipher.encrypt_stream(&mut buf).unwrap();
        }
    }

    #[test]
    fn block_modes_reject_bad_lengths() {
        for mode in [Mode::Ecb, Mode::Cbc] {
            let mut cipher = Cipher::new(mode, b"key");
            assert!(matches!(
                cipher.encrypt_stream(&mut []),
                Err(Error::EmptyInput { .. })
            ));
            let mut buf = [0u8; 17];
            assert!(matches!(
                cipher.decrypt_stream(&mut buf),
                Err(Error::UnalignedLength { len: 17, .. })
            ));
            assert_eq!(buf, [0u8; 17]);
        }
    }

    #[test]
    fn stream_modes_handle_partial_blocks() {
        for mode in [Mode::Cfb, Mode::Ofb] {
            for len in [1usize, 15, 17, 31, 40] {
                let plain: Vec<u8> = (0..len as u8).collect();
                let mut buf = plain.clone();
                let mut cipher = Cipher::with_seed(mode, b"partial", 5);
                cipher.set_iv(Some(&[0x42; 16]));
                cipher.encrypt_stream(&mut buf).unwrap();
                assert_ne!(buf, plain);
                cipher.reset_chain();
                cipher.decrypt_stream(&mut buf).unwrap();
                assert_eq!(buf, plain, "{mode} len {len}");
            }
            let mut cipher = Cipher::new(mode, b"partial");
            assert!(cipher.encrypt_stream(&mut []).is_err());
        }
    }

    #[test]
    fn chaining_carries_across_calls() {
        let plain: Vec<u8> = (0..96u8).collect();
        for mode in Mode::ALL {
            let mut whole = plain.clone();
            let mut cipher = vector_cipher(mode);
            cipher.encrypt_stream(&mut whole).unwrap();

            let mut pieces = plain.clone();
            let mut cipher = vector_cipher(mode);
            let (a, b) = pieces.split_at_mut(32);
            cipher.encrypt_stream(a).unwrap();
            cipher.encrypt_stream(b).unwrap();
            assert_eq!(whole, pieces, "{mode}");

            let mut cipher = vector_cipher(mode);
            let (a, b) = pieces.split_at_mut(48);
            cipher.decrypt_stream(a).unwrap();
            cipher.decrypt_stream(b).unwrap();
            assert_eq!(pieces, plain, "{mode}");
        }
    }

    #[test]
    fn ecb_ignores_iv_and_never_embeds() {
        let mut cipher = Cipher::new(Mode::Ecb, b"k");
        assert!(!cipher.embed_iv());
        cipher.set_embed_iv(true);
        assert!(!cipher.embed_iv());

        let mut a = [7u8; 32];
        let mut b = [7u8; 32];
        cipher.set_iv(Some(&[1u8; 16]));
        cipher.encrypt_stream(&mut a).unwrap();
        cipher.set_iv(Some(&[2u8; 16]));
        cipher.encrypt_stream(&mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[..16], a[16..]);
    }

    #[test]
    fn buffer_limit_must_be_block_multiple() {
        let mut cipher = Cipher::new(Mode::Cbc, b"k");
        assert_eq!(cipher.buffer_limit(), DEFAULT_BUFFER_LIMIT);
        assert!(matches!(
            cipher.set_buffer_limit(1000),
            Err(Error::InvalidBufferLimit { limit: 1000 })
        ));
        assert!(cipher.set_buffer_limit(0).is_err());
        assert_eq!(cipher.buffer_limit(), DEFAULT_BUFFER_LIMIT);
        cipher.set_buffer_limit(4096).unwrap();
        assert_eq!(cipher.buffer_limit(), 4096);
        assert!(cipher.set_buffer_limit(4097).is_err());
        assert_eq!(cipher.buffer_limit(), 4096);
    }

    #[test]
    fn replacing_key_changes_output() {
        let mut cipher = Cipher::new(Mode::Ecb, b"first");
        let mut a = [0u8; 16];
        cipher.encrypt_stream(&mut a).unwrap();
        cipher.replace_key(b"second");
        let mut b = [0u8; 16];
        cipher.encrypt_stream(&mut b).unwrap();
        assert_ne!(a, b);
        cipher.erase_key();
        let mut c = [0u8; 16];
        cipher.encrypt_stream(&mut c).unwrap();
        let mut d = [0u8; 16];
        Cipher::new(Mode::Ecb, &[]).encrypt_stream(&mut d).unwrap();
        assert_eq!(c, d);
    }
}
