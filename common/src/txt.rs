// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Presentation-format escaping for TXT character-strings.
//
// Bytes outside printable ASCII travel as `\DDD` (decimal), and the control
// characters LF, TAB and CR may also appear as `\n`, `\t` and `\r`.

const BACKSLASH: u8 = b'\\';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnescapeError {
    #[error("invalid escape sequence at offset {offset} (byte {byte:#04x})")]
    InvalidEscape { byte: u8, offset: usize },

    #[error("decimal escape `\\{value:03}` at offset {offset} is out of byte range")]
    OutOfRange { value: u16, offset: usize },
}

/// Decode escaped TXT text back to raw bytes.
///
/// A backslash at the very end of the input ends decoding without an error.
pub fn unescape(txt: &[u8]) -> Result<Vec<u8>, UnescapeError> {
    let mut out = Vec::with_capacity(txt.len());
    let mut i = 0;

    while i < txt.len() {
        if txt[i] != BACKSLASH {
            out.push(txt[i]);
            i += 1;
            continue;
        }

        i += 1;
        if i == txt.len() {
            break;
        }

        if i + 2 < txt.len() && txt[i..i + 3].iter().all(u8::is_ascii_digit) {
            let value = txt[i..i + 3]
                .iter()
                .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
            let byte = u8::try_from(value).map_err(|_| UnescapeError::OutOfRange {
                value,
                offset: i - 1,
            })?;
            out.push(byte);
            i += 3;
            continue;
        }

        let decoded = match txt[i] {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            other => {
                return Err(UnescapeError::InvalidEscape {
                    byte: other,
                    offset: i - 1,
                })
            }
        };
        out.push(decoded);
        i += 1;
    }

    Ok(out)
}

/// Render raw TXT bytes in escaped form. `unescape(&escape(b)) == b` for
/// every input.
pub fn escape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for &b in raw {
        if (0x20..=0x7E).contains(&b) && b != BACKSLASH && b != b'"' {
            out.push(b);
        } else {
            out.push(BACKSLASH);
            out.extend_from_slice(format!("{b:03}").as_bytes());
        }
    }
    out
}
