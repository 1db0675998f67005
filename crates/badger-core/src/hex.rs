//! Hex encoding used by [`Slice::to_hex_string`](crate::Slice::to_hex_string)
//! and [`Slice::decode_hex`](crate::Slice::decode_hex).
//!
//! Encoding emits lowercase digits. Decoding accepts either case.

use crate::error::SliceError;

const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Encode `bytes` as lowercase hex, two characters per byte.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Decode hex text into bytes.
///
/// Fails on odd-length input or on the first character that is not a hex
/// digit. Nothing is partially returned on failure.
pub fn decode(text: &[u8]) -> Result<Vec<u8>, SliceError> {
    if text.len() % 2 != 0 {
        return Err(SliceError::OddHexLength { len: text.len() });
    }
    let mut out = Vec::with_capacity(text.len() / 2);
    for (pair_index, pair) in text.chunks_exact(2).enumerate() {
        let index = pair_index * 2;
        let hi = nibble(pair[0]).ok_or(SliceError::InvalidHexDigit {
            index,
            byte: pair[0],
        })?;
        let lo = nibble(pair[1]).ok_or(SliceError::InvalidHexDigit {
            index: index + 1,
            byte: pair[1],
        })?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_lowercase() {
        assert_eq!(encode(&[0x00, 0xab, 0x7f, 0xff]), "00ab7fff");
    }

    #[test]
    fn encode_empty() {
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn decode_accepts_mixed_case() {
        assert_eq!(decode(b"DeadBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn decode_rejects_odd_length() {
        assert_eq!(decode(b"abc"), Err(SliceError::OddHexLength { len: 3 }));
    }

    #[test]
    fn decode_reports_first_bad_digit() {
        assert_eq!(
            decode(b"00zz"),
            Err(SliceError::InvalidHexDigit {
                index: 2,
                byte: b'z'
            })
        );
        assert_eq!(
            decode(b"0x"),
            Err(SliceError::InvalidHexDigit {
                index: 1,
                byte: b'x'
            })
        );
    }

    #[test]
    fn decode_empty_is_ok() {
        assert_eq!(decode(b"").unwrap(), Vec::<u8>::new());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
                let text = encode(&bytes);
                prop_assert_eq!(text.len(), bytes.len() * 2);
                prop_assert_eq!(decode(text.as_bytes()).unwrap(), bytes);
            }

            #[test]
            fn uppercase_decodes_the_same(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
                let upper = encode(&bytes).to_ascii_uppercase();
                prop_assert_eq!(decode(upper.as_bytes()).unwrap(), bytes);
            }
        }
    }
}
