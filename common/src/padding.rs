// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ISO/IEC 7816-4 padding: a 0x80 marker followed by zero bytes.

use rand::rngs::OsRng;
use rand::Rng;

/// Padding marker byte.
pub const MARKER: u8 = 0x80;
/// Largest padding length `add_padding` will choose.
pub const MAX_PADDING: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaddingError {
    #[error("invalid padding")]
    Invalid,
}

/// Append padding of a length drawn uniformly from `0..=MAX_PADDING`.
///
/// A length of zero appends nothing at all, not even the marker.
pub fn add_padding(buf: &mut Vec<u8>) {
    let len = OsRng.gen_range(0..=MAX_PADDING);
    pad_with(buf, len);
}

/// Append exactly `len` padding bytes (`0x80` then `len - 1` zeros).
pub fn pad_with(buf: &mut Vec<u8>, len: usize) {
    if len == 0 {
        return;
    }
    buf.reserve(len);
    buf.push(MARKER);
    buf.resize(buf.len() + len - 1, 0x00);
}

/// Strip trailing zeros and the marker before them.
pub fn remove_padding(padded: &[u8]) -> Result<&[u8], PaddingError> {
    let end = padded
        .iter()
        .rposition(|&b| b != 0x00)
        .ok_or(PaddingError::Invalid)?;
    if padded[end] != MARKER {
        return Err(PaddingError::Invalid);
    }
    Ok(&padded[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_every_length() {
        let payloads: [&[u8]; 4] = [b"", b"\x00\x00", b"query\x80", b"\x12\x34\x00"];
        for payload in payloads {
            for len in 1..=MAX_PADDING {
                let mut buf = payload.to_vec();
                pad_with(&mut buf, len);
                assert_eq!(buf.len(), payload.len() + len);
                assert_eq!(buf[payload.len()], MARKER);
                assert_eq!(remove_padding(&buf).unwrap(), payload, "len {len}");
            }
        }
    }

    #[test]
    fn zero_length_appends_nothing() {
        let mut buf = b"abc".to_vec();
        pad_with(&mut buf, 0);
        assert_eq!(buf, b"abc");
        // nothing marks the end, so removal has to reject it
        assert_eq!(remove_padding(&buf), Err(PaddingError::Invalid));
    }

    #[test]
    fn zero_length_padding_on_empty_input_fails() {
        let mut buf = Vec::new();
        pad_with(&mut buf, 0);
        assert_eq!(remove_padding(&buf), Err(PaddingError::Invalid));
    }

    #[test]
    fn random_padding_stays_in_range() {
        for _ in 0..64 {
            let mut buf = b"x".to_vec();
            add_padding(&mut buf);
            let added = buf.len() - 1;
            assert!(added <= MAX_PADDING);
            if added > 0 {
                assert_eq!(remove_padding(&buf).unwrap(), b"x");
            }
        }
    }

    #[test]
    fn remove_rejects_missing_marker() {
        assert_eq!(remove_padding(b"abc\x00\x00"), Err(PaddingError::Invalid));
        assert_eq!(remove_padding(b"\x00\x00\x00"), Err(PaddingError::Invalid));
        assert_eq!(remove_padding(b""), Err(PaddingError::Invalid));
    }

    #[test]
    fn remove_strips_only_one_marker() {
        assert_eq!(remove_padding(b"\x80\x80\x00").unwrap(), b"\x80");
        assert_eq!(remove_padding(b"\x80").unwrap(), b"");
    }
}
