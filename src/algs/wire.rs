//! Byte views of halo rows.
//!
//! Rows travel as native-endian `f64` bytes; all ranks of a run share one
//! architecture. Received buffers carry no alignment guarantee, so decoding
//! reads each value unaligned.

use bytemuck::Pod;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Number of bytes a row of `n` scalars occupies on the wire.
pub const fn row_bytes(n: usize) -> usize {
    n * std::mem::size_of::<f64>()
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Decode a received row into `dst`, which fixes the expected length.
pub fn decode_row_into(raw: &[u8], dst: &mut [f64]) -> Result<(), String> {
    expect_exact_len(raw.len(), row_bytes(dst.len()))?;
    for (out, chunk) in dst
        .iter_mut()
        .zip(raw.chunks_exact(std::mem::size_of::<f64>()))
    {
        *out = bytemuck::pod_read_unaligned(chunk);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_recovers_an_encoded_row() {
        let row = [1.5, -2.0, f64::MAX];
        let mut raw = vec![0u8]; // force a misaligned copy
        raw.extend_from_slice(cast_slice(&row));
        let mut out = [0.0; 3];
        decode_row_into(&raw[1..], &mut out).unwrap();
        assert_eq!(out, row);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let mut out = [0.0; 2];
        let err = decode_row_into(&[0u8; 8], &mut out).unwrap_err();
        assert_eq!(err, "expected 16 bytes, got 8");
    }
}
