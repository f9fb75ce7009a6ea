//! Whole-buffer encryption: fresh IV, padding and the optional IV header.

use aes_core::{Block, BLOCK_LEN};
use log::debug;

use crate::error::{Error, Result};
use crate::mode::Direction;
use crate::padding;
use crate::stream::Cipher;

impl Cipher {
    /// Encrypts `src` into a new buffer laid out as `[IV][ciphertext]`.
    ///
    /// A fresh IV is drawn for every call. ECB and CBC output is PKCS#7
    /// padded; CFB and OFB output has the same length as `src`. The header is
    /// present only while IV embedding is enabled.
    pub fn encrypt_buffer(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_buffer_inner(src)
            .map_err(|err| self.fail("encrypt buffer", err))
    }

    fn encrypt_buffer_inner(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        if src.is_empty() {
            return Err(Error::EmptyInput { mode: self.mode() });
        }
        self.fresh_iv();

        let header = if self.embed_iv() { BLOCK_LEN } else { 0 };
        let padded = self.mode().is_padded();
        let pad = if padded { padding::pad_len(src.len()) } else { 0 };

        let mut out = Vec::with_capacity(header + src.len() + pad);
        if header > 0 {
            out.extend_from_slice(self.iv());
        }
        out.extend_from_slice(src);
        if padded {
            padding::append(&mut out, src.len());
        }
        self.apply(Direction::Encrypt, &mut out[header..])?;
        debug!(
            "{}: encrypted {} bytes into {}",
            self.mode().label(),
            src.len(),
            out.len()
        );
        Ok(out)
    }

    /// Decrypts a buffer produced by [`Cipher::encrypt_buffer`].
    ///
    /// With IV embedding enabled the first 16 bytes replace the stored IV;
    /// otherwise the IV previously set on the cipher is used.
    pub fn decrypt_buffer(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_buffer_inner(src)
            .map_err(|err| self.fail("decrypt buffer", err))
    }

    fn decrypt_buffer_inner(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        let body = self.consume_iv_header(src)?;
        let mut out = body.to_vec();
        self.apply(Direction::Decrypt, &mut out)?;
        if self.mode().is_padded() {
            let len = padding::unpadded_len(&out)?;
            out.truncate(len);
        }
        Ok(out)
    }

    /// Splits off and installs the IV header when embedding is enabled, then
    /// restarts chaining from the active IV.
    fn consume_iv_header<'a>(&mut self, src: &'a [u8]) -> Result<&'a [u8]> {
        if !self.embed_iv() {
            self.reset_chain();
            return Ok(src);
        }
        if src.len() < BLOCK_LEN {
            return Err(Error::MissingIvHeader {
                len: src.len() as u64,
            });
        }
        let (head, body) = src.split_at(BLOCK_LEN);
        let mut iv: Block = [0u8; BLOCK_LEN];
        iv.copy_from_slice(head);
        self.set_iv(Some(&iv));
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const LENGTHS: [usize; 6] = [1, 15, 16, 17, 4096, 4096 + 7];

    #[test]
    fn round_trip_every_mode_and_length() {
        let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
        for mode in Mode::ALL {
            for key_len in [0usize, 5, 16] {
                let mut key = vec![0u8; key_len];
                rng.fill_bytes(&mut key);
                for len in LENGTHS {
                    let mut plain = vec![0u8; len];
                    rng.fill_bytes(&mut plain);
                    let mut cipher = Cipher::new(mode, &key);
                    let ct = cipher.encrypt_buffer(&plain).unwrap();
                    let mut other = Cipher::new(mode, &key);
                    let pt = other.decrypt_buffer(&ct).unwrap();
                    assert_eq!(pt, plain, "{mode} key {key_len} len {len}");
                }
            }
        }
    }

    #[test]
    fn output_layout_per_mode() {
        for mode in Mode::ALL {
            let mut cipher = Cipher::with_seed(mode, b"layout", 3);
            let ct = cipher.encrypt_buffer(&[0u8; 20]).unwrap();
            let header = if mode.uses_iv() { 16 } else { 0 };
            let body = if mode.is_padded() { 32 } else { 20 };
            assert_eq!(ct.len(), header + body, "{mode}");
            if mode.uses_iv() {
                assert_eq!(&ct[..16], cipher.iv());
            }
        }
    }

    #[test]
    fn aligned_plaintext_gains_pad_block() {
        for mode in [Mode::Ecb, Mode::Cbc] {
            let plain = [0x5au8; 32];
            let mut cipher = Cipher::new(mode, b"pad");
            let ct = cipher.encrypt_buffer(&plain).unwrap();
            let header = if mode.uses_iv() { 16 } else { 0 };
            assert_eq!(ct.len(), header + 48);
            assert_eq!(cipher.decrypt_buffer(&ct).unwrap(), plain);
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        for mode in Mode::ALL {
            let mut cipher = Cipher::new(mode, b"k");
            assert!(matches!(
                cipher.encrypt_buffer(&[]),
                Err(Error::EmptyInput { .. })
            ));
        }
    }

    #[test]
    fn fresh_iv_per_encryption() {
        let mut cipher = Cipher::new(Mode::Cbc, b"k");
        let a = cipher.encrypt_buffer(b"same message").unwrap();
        let b = cipher.encrypt_buffer(b"same message").unwrap();
        assert_ne!(a, b);
        assert_ne!(a[..16], b[..16]);
        assert_eq!(cipher.decrypt_buffer(&a).unwrap(), b"same message");
        assert_eq!(cipher.decrypt_buffer(&b).unwrap(), b"same message");
    }

    #[test]
    fn seeded_ciphers_are_reproducible() {
        let a = Cipher::with_seed(Mode::Ofb, b"k", 42)
            .encrypt_buffer(b"reproducible")
            .unwrap();
        let b = Cipher::with_seed(Mode::Ofb, b"k", 42)
            .encrypt_buffer(b"reproducible")
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn detached_iv_round_trip() {
        for mode in [Mode::Cbc, Mode::Cfb, Mode::Ofb] {
            let mut enc = Cipher::new(mode, b"detached");
            enc.set_embed_iv(false);
            let ct = enc.encrypt_buffer(b"no header here").unwrap();
            let expected = if mode.is_padded() { 16 } else { 14 };
            assert_eq!(ct.len(), expected);

            let mut dec = Cipher::new(mode, b"detached");
            dec.set_embed_iv(false);
            dec.set_iv(Some(enc.iv()));
            assert_eq!(dec.decrypt_buffer(&ct).unwrap(), b"no header here");
        }
    }

    #[test]
    fn short_header_is_rejected() {
        let mut cipher = Cipher::new(Mode::Cbc, b"k");
        assert!(matches!(
            cipher.decrypt_buffer(&[0u8; 10]),
            Err(Error::MissingIvHeader { len: 10 })
        ));
        assert!(matches!(
            cipher.decrypt_buffer(&[0u8; 16]),
            Err(Error::EmptyInput { .. })
        ));
        assert!(matches!(
            cipher.decrypt_buffer(&[0u8; 40]),
            Err(Error::UnalignedLength { len: 24, .. })
        ));
    }

    #[test]
    fn wrong_key_fails_padding_check() {
        let ct = Cipher::new(Mode::Ecb, b"right")
            .encrypt_buffer(&[1u8; 64])
            .unwrap();
        let result = Cipher::new(Mode::Ecb, b"wrong").decrypt_buffer(&ct);
        assert!(matches!(result, Err(Error::BadPadding { .. })));
    }

    #[test]
    fn cbc_error_propagates_two_blocks() {
        let plain: Vec<u8> = (0..80u8).collect();
        let mut cipher = Cipher::new(Mode::Cbc, b"propagation");
        let mut ct = cipher.encrypt_buffer(&plain).unwrap();
        // Header, then blocks 0..=5 (block 5 is padding). Corrupt block 2.
        ct[16 + 2 * 16 + 3] ^= 0x80;
        let pt = cipher.decrypt_buffer(&ct).unwrap();
        assert_eq!(pt.len(), plain.len());
        for (i, (got, want)) in pt.chunks(16).zip(plain.chunks(16)).enumerate() {
            match i {
                2 => assert_ne!(got, want),
                3 => {
                    let diff: Vec<usize> = (0..16).filter(|&j| got[j] != want[j]).collect();
                    assert_eq!(diff, vec![3]);
                }
                _ => assert_eq!(got, want, "block {i}"),
            }
        }
    }

    #[test]
    fn ofb_error_stays_in_one_byte() {
        let plain = vec![0x33u8; 64];
        let mut cipher = Cipher::new(Mode::Ofb, b"ofb");
        let mut ct = cipher.encrypt_buffer(&plain).unwrap();
        ct[16 + 21] ^= 0x01;
        let pt = cipher.decrypt_buffer(&ct).unwrap();
        let diff: Vec<usize> = (0..64).filter(|&i| pt[i] != plain[i]).collect();
        assert_eq!(diff, vec![21]);
        assert_eq!(pt[21], plain[21] ^ 0x01);
    }

    #[test]
    fn cfb_error_hits_byte_and_next_block() {
        let plain = vec![0x44u8; 64];
        let mut cipher = Cipher::new(Mode::Cfb, b"cfb");
        let mut ct = cipher.encrypt_buffer(&plain).unwrap();
        ct[16 + 21] ^= 0x01;
        let pt = cipher.decrypt_buffer(&ct).unwrap();
        assert_eq!(pt[21], plain[21] ^ 0x01);
        assert_eq!(pt[..21], plain[..21]);
        assert_eq!(pt[22..32], plain[22..32]);
        assert_ne!(pt[32..48], plain[32..48]);
        assert_eq!(pt[48..], plain[48..]);
    }
}
