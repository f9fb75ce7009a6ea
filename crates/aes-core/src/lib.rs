//! AES-128 block primitive shared by the mode layer and the CLI.
//!
//! This crate follows FIPS-197 and provides:
//! - Static GF(2^8) tables (S-box, inverse S-box, MixColumns multipliers).
//! - The AES-128 key schedule together with the IV state a cipher instance
//!   carries around.
//! - Single-block encryption and decryption.
//!
//! The implementation uses data-dependent table lookups and is not hardened
//! against timing or cache side channels.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
mod cipher;
mod error;
mod gf;
mod key;
mod round;
mod schedule;

pub use crate::block::{to_matrix, xor_in_place, xor_prefix, Block, BLOCK_LEN};
pub use crate::cipher::{
    decrypt_block, decrypt_in_place, encrypt_block, encrypt_in_place, expand_key, next_round_key,
};
pub use crate::error::{Error, Result};
pub use crate::gf::{gf_multiply, inv_sbox, sbox};
pub use crate::key::{Aes128Key, RoundKeys, ROUND_KEY_COUNT};
pub use crate::schedule::KeySchedule;
