//! PKCS#7 padding for the block-aligned modes.

use aes_core::BLOCK_LEN;

use crate::error::{Error, Result};

/// Number of pad bytes appended to `len` data bytes: 1..=16, a full block
/// when `len` is already aligned.
pub fn pad_len(len: usize) -> usize {
    BLOCK_LEN - len % BLOCK_LEN
}

/// Appends padding for `data_len` bytes of payload to `buf`.
pub fn append(buf: &mut Vec<u8>, data_len: usize) {
    let n = pad_len(data_len);
    buf.resize(buf.len() + n, n as u8);
}

/// Returns the payload length of a padded buffer.
///
/// Every claimed pad byte must equal the pad count.
pub fn unpadded_len(data: &[u8]) -> Result<usize> {
    let value = *data.last().ok_or(Error::BadPadding { value: 0 })?;
    let n = value as usize;
    if n == 0 || n > BLOCK_LEN || n > data.len() {
        return Err(Error::BadPadding { value });
    }
    let payload = data.len() - n;
    if data[payload..].iter().any(|&b| b != value) {
        return Err(Error::BadPadding { value });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_input_gains_full_block() {
        assert_eq!(pad_len(0), 16);
        assert_eq!(pad_len(16), 16);
        assert_eq!(pad_len(17), 15);
        assert_eq!(pad_len(31), 1);

        let mut buf = vec![0xaa; 32];
        append(&mut buf, 32);
        assert_eq!(buf.len(), 48);
        assert!(buf[32..].iter().all(|&b| b == 16));
        assert_eq!(unpadded_len(&buf).unwrap(), 32);
    }

    #[test]
    fn strips_partial_padding() {
        let mut buf = b"hello".to_vec();
        append(&mut buf, 5);
        assert_eq!(buf.len(), 16);
        assert_eq!(buf[15], 11);
        assert_eq!(unpadded_len(&buf).unwrap(), 5);
    }

    #[test]
    fn rejects_malformed_padding() {
        let mut buf = [3u8; 16];
        buf[14] = 9;
        assert!(matches!(unpadded_len(&buf), Err(Error::BadPadding { value: 3 })));

        let mut zero = [1u8; 16];
        zero[15] = 0;
        assert!(unpadded_len(&zero).is_err());
        assert!(unpadded_len(&[17u8; 16]).is_err());
        assert!(unpadded_len(&[4u8; 2]).is_err());
        assert!(unpadded_len(&[]).is_err());
    }
}
