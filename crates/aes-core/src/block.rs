//! Block representation helpers.

/// AES block of 16 bytes.
///
/// Bytes map onto the 4x4 state matrix column by column:
/// `matrix[row][col] = block[col * 4 + row]`.
pub type Block = [u8; 16];

/// Size of one block in bytes.
pub const BLOCK_LEN: usize = 16;

/// XORs two blocks, writing the result into `dst`.
#[inline]
pub fn xor_in_place(dst: &mut Block, rhs: &Block) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}

/// XORs `rhs` into `dst` over the shorter of the two slices.
///
/// Used for the trailing partial block of the stream modes.
#[inline]
pub fn xor_prefix(dst: &mut [u8], rhs: &[u8]) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}

/// Returns the row-indexed matrix view of a block.
pub fn to_matrix(block: &Block) -> [[u8; 4]; 4] {
    let mut matrix = [[0u8; 4]; 4];
    for (col, column) in block.chunks_exact(4).enumerate() {
        for (row, byte) in column.iter().enumerate() {
            matrix[row][col] = *byte;
        }
    }
    matrix
}
