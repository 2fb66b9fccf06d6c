//! TIFF PackBits run-length encoding, used for raster-line compression.

use crate::error::{ReaderError, RasterError};

/// Encodes `input` using PackBits.
///
/// Runs of 2 or more identical bytes become a control byte `257 - n` (i.e. the
/// two's-complement negative run length) followed by the repeated byte.
/// Literal spans become `n - 1` followed by the literal bytes. No run or
/// literal span exceeds 128 bytes. If the encoded form would not be smaller
/// than `input`, `input` is returned unchanged as a single literal span (or
/// split into 128-byte literal spans if longer).
#[must_use]
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        let run_len = run_length_at(input, i);
        if run_len >= 2 {
            let n = run_len.min(128);
            out.push((257 - n) as u8);
            out.push(input[i]);
            i += n;
        } else {
            let start = i;
            let mut len = 0usize;
            while i < input.len() && len < 128 {
                // Stop the literal span as soon as a run of >= 2 begins, so
                // the next iteration can encode it as a run.
                if run_length_at(input, i) >= 2 {
                    break;
                }
                i += 1;
                len += 1;
            }
            out.push((len - 1) as u8);
            out.extend_from_slice(&input[start..start + len]);
        }
    }
    if out.len() >= input.len() {
        literal_fallback(input)
    } else {
        out
    }
}

fn literal_fallback(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / 128 + 1);
    for chunk in input.chunks(128) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
    out
}

fn run_length_at(input: &[u8], i: usize) -> usize {
    let b = input[i];
    let mut n = 1;
    while i + n < input.len() && input[i + n] == b {
        n += 1;
    }
    n
}

/// Decodes a PackBits-encoded buffer.
///
/// # Errors
///
/// Returns [`ReaderError::PackBits`] if a literal-span or run-length control
/// byte claims more bytes than remain in `input`.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, ReaderError> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < input.len() {
        let control = input[i] as i8;
        i += 1;
        if control >= 0 {
            let len = control as usize + 1;
            let end = i + len;
            if end > input.len() {
                return Err(ReaderError::PackBits(format!(
                    "literal span of {len} bytes at offset {i} exceeds input length {}",
                    input.len()
                )));
            }
            out.extend_from_slice(&input[i..end]);
            i = end;
        } else if control != -128 {
            let n = 257 - (control as i16 + 256) as usize;
            if i >= input.len() {
                return Err(ReaderError::PackBits(format!(
                    "run control byte at offset {} has no repeated byte following it",
                    i - 1
                )));
            }
            let byte = input[i];
            i += 1;
            out.extend(std::iter::repeat(byte).take(n));
        }
        // control == -128 is a no-op per the TIFF PackBits specification.
    }
    Ok(out)
}

/// Encodes a single raster line, falling back to the uncompressed line if
/// compression does not shrink it. Returns `(bytes, was_compressed)`.
#[must_use]
pub fn encode_line(line: &[u8]) -> (Vec<u8>, bool) {
    let compressed = encode(line);
    if compressed.len() < line.len() {
        (compressed, true)
    } else {
        (line.to_vec(), false)
    }
}

/// Decodes a raster line, validating that it decompresses to exactly
/// `expected_len` bytes.
///
/// # Errors
///
/// Returns [`RasterError::PackBits`] if the decoded length doesn't match.
pub fn decode_line(data: &[u8], expected_len: usize) -> Result<Vec<u8>, RasterError> {
    let decoded = decode(data).map_err(|e| RasterError::PackBits(e.to_string()))?;
    if decoded.len() != expected_len {
        return Err(RasterError::PackBits(format!(
            "decompressed line is {} bytes, expected {expected_len}",
            decoded.len()
        )));
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_a_run_then_literal_sequence() {
        let input = [0xAA, 0xAA, 0xAA, 0xBB, 0xCC, 0xDD];
        let encoded = encode(&input);
        assert_eq!(encoded, vec![0xFE, 0xAA, 0x02, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn round_trips_a_run_then_literal_sequence() {
        let input = [0xAA, 0xAA, 0xAA, 0xBB, 0xCC, 0xDD];
        let encoded = encode(&input);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn round_trips_arbitrary_bytes() {
        let input: Vec<u8> = (0..=255u8).chain(std::iter::repeat(0x42).take(200)).collect();
        let encoded = encode(&input);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn round_trips_empty_input() {
        assert_eq!(decode(&encode(&[])).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn all_zero_line_compresses_smaller_than_original() {
        let line = vec![0u8; 90];
        let (bytes, compressed) = encode_line(&line);
        assert!(compressed);
        assert!(bytes.len() < line.len());
    }

    #[test]
    fn incompressible_line_falls_back_to_literal() {
        let line: Vec<u8> = (0..90).map(|i| if i % 2 == 0 { 0x00 } else { 0xFF }).collect();
        let (bytes, compressed) = encode_line(&line);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, line);
        let _ = compressed;
    }

    #[test]
    fn decode_line_rejects_wrong_length() {
        let bytes = encode(&[0u8; 10]);
        assert!(decode_line(&bytes, 20).is_err());
    }
}
