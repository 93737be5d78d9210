//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 encoded words and the
//! handful of charsets that show up in real mail stores. Every decoder here
//! is lenient: stored messages are frequently truncated mid-line, so a
//! dangling escape or an incomplete Base64 quantum is dropped instead of
//! failing the whole body.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes Base64 data, ignoring whitespace and any incomplete trailing quantum.
///
/// # Errors
///
/// Returns an error if the input contains characters outside the Base64 alphabet
/// or padding in the middle of the data.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let mut cleaned: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let complete = cleaned.len() - cleaned.len() % 4;
    cleaned.truncate(complete);
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable bytes (RFC 2045).
///
/// Soft line breaks are removed. Malformed escapes are kept literally and a
/// lone `=` at the very end of the input is dropped.
#[must_use]
pub fn decode_quoted_printable(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte != b'=' {
            out.push(byte);
            i += 1;
            continue;
        }

        match (input.get(i + 1), input.get(i + 2)) {
            // Soft line break
            (Some(b'\r'), Some(b'\n')) => i += 3,
            (Some(b'\n'), _) => i += 2,
            (Some(&hi), Some(&lo)) => {
                if let (Some(h), Some(l)) = (hex_value(hi), hex_value(lo)) {
                    out.push((h << 4) | l);
                    i += 3;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
            (None, _) => i += 1,
            (Some(_), None) => {
                out.push(b'=');
                i += 1;
            }
        }
    }

    out
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Converts bytes in the given charset to a `String`.
///
/// UTF-8 and ASCII decode lossily; the ISO-8859-1 / Windows-1252 family maps
/// byte-for-byte (with the common Windows-1252 punctuation in `0x80..=0x9F`).
/// Unknown charsets fall back to lossy UTF-8.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let charset = charset.map(|c| c.trim().trim_matches('"').to_ascii_lowercase());

    match charset.as_deref() {
        Some(
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "iso-8859-15" | "windows-1252"
            | "cp1252",
        ) => bytes.iter().map(|&b| latin1_char(b)).collect(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn latin1_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x85 => '\u{2026}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        _ => char::from(byte),
    }
}

/// Decodes every RFC 2047 encoded word inside a header value.
///
/// Format of a single word: `=?charset?encoding?encoded-text?=`. Whitespace
/// between two adjacent encoded words is dropped, as the RFC requires.
/// Anything that does not parse as an encoded word is copied through.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut last_was_encoded = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);

        if let Some((decoded, consumed)) = decode_encoded_word(candidate) {
            if !(last_was_encoded && before.trim().is_empty()) {
                out.push_str(before);
            }
            out.push_str(&decoded);
            rest = &candidate[consumed..];
            last_was_encoded = true;
        } else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            last_was_encoded = false;
        }
    }

    out.push_str(rest);
    out
}

/// Decodes one encoded word at the start of `word`, returning the text and
/// the number of bytes consumed.
fn decode_encoded_word(word: &str) -> Option<(String, usize)> {
    let inner = word.strip_prefix("=?")?;
    let (charset, rest) = inner.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let payload = &rest[..end];

    if charset.is_empty() || charset.contains(char::is_whitespace) {
        return None;
    }
    if payload.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(payload).ok()?,
        "Q" | "q" => decode_quoted_printable(payload.replace('_', " ").as_bytes()),
        _ => return None,
    };

    // RFC 2231 language suffix: "utf-8*en"
    let charset = charset.split('*').next().unwrap_or(charset);
    let consumed = 2 + charset_len(inner) + encoding.len() + 1 + end + 2;
    Some((decode_charset(&bytes, Some(charset)), consumed))
}

/// Length of the charset segment including its trailing `?`.
fn charset_len(inner: &str) -> usize {
    inner.find('?').map_or(0, |i| i + 1)
}
