//! AES round transformations.
//!
//! All operations work on a single 16-byte state without allocating.

use crate::block::{xor_in_place, Block};
use crate::gf::{gf_multiply, inv_sbox, sbox};

/// MixColumns coefficient matrix, one row per output byte.
const MIX: [[u8; 4]; 4] = [[2, 3, 1, 1], [1, 2, 3, 1], [1, 1, 2, 3], [3, 1, 1, 2]];

/// Inverse MixColumns coefficient matrix.
const INV_MIX: [[u8; 4]; 4] = [
    [14, 11, 13, 9],
    [9, 14, 11, 13],
    [13, 9, 14, 11],
    [11, 13, 9, 14],
];

/// Applies SubBytes to the state in place.
#[inline]
pub fn sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = sbox(*byte);
    }
}

/// Applies the inverse SubBytes transformation.
#[inline]
pub fn inv_sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = inv_sbox(*byte);
    }
}

/// Rotates row `r` of the state left by `r` positions.
#[inline]
pub fn shift_rows(state: &mut Block) {
    let s = *state;
    *state = [
        s[0], s[5], s[10], s[15], //
        s[4], s[9], s[14], s[3], //
        s[8], s[13], s[2], s[7], //
        s[12], s[1], s[6], s[11],
    ];
}

/// Rotates row `r` of the state right by `r` positions.
#[inline]
pub fn inv_shift_rows(state: &mut Block) {
    let s = *state;
    *state = [
        s[0], s[13], s[10], s[7], //
        s[4], s[1], s[14], s[11], //
        s[8], s[5], s[2], s[15], //
        s[12], s[9], s[6], s[3],
    ];
}

fn mix_with(state: &mut Block, matrix: &[[u8; 4]; 4]) {
    for column in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        for (out, coeffs) in column.iter_mut().zip(matrix.iter()) {
            *out = gf_multiply(coeffs[0], a0)
                ^ gf_multiply(coeffs[1], a1)
                ^ gf_multiply(coeffs[2], a2)
                ^ gf_multiply(coeffs[3], a3);
        }
    }
}

/// MixColumns over all four columns.
#[inline]
pub fn mix_columns(state: &mut Block) {
    mix_with(state, &MIX);
}

/// Inverse MixColumns over all four columns.
#[inline]
pub fn inv_mix_columns(state: &mut Block) {
    mix_with(state, &INV_MIX);
}

/// Adds (XORs) a round key into the state.
#[inline]
pub fn add_round_key(state: &mut Block, round_key: &Block) {
    xor_in_place(state, round_key);
}
