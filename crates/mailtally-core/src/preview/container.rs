//! Unwrapping raw RFC 822 bytes from on-disk message containers.

/// Header names that may start an Outlook message source.
const HEADER_STARTS: &[&[u8]] = &[
    b"return-path:",
    b"received:",
    b"delivered-to:",
    b"from:",
    b"date:",
    b"subject:",
    b"to:",
    b"message-id:",
    b"mime-version:",
    b"content-type:",
    b"reply-to:",
    b"sender:",
    b"x-",
];

/// Message bytes inside an `.emlx` file.
///
/// The first line holds the message length in bytes; the message follows and
/// a property list trails it. A length larger than what was read (the read is
/// capped) keeps everything available.
#[must_use]
pub fn unwrap_emlx(bytes: &[u8]) -> Option<&[u8]> {
    let newline = bytes.iter().position(|&b| b == b'\n')?;
    let length: usize = std::str::from_utf8(&bytes[..newline])
        .ok()?
        .trim()
        .parse()
        .ok()?;
    let message = &bytes[newline + 1..];
    Some(&message[..length.min(message.len())])
}

/// Message bytes inside an Outlook message source file.
///
/// Skips any binary framing up to the first byte that begins a header line.
#[must_use]
pub fn unwrap_outlook_source(bytes: &[u8]) -> Option<&[u8]> {
    (0..bytes.len())
        .filter(|&i| i == 0 || !bytes[i - 1].is_ascii_alphanumeric())
        .find(|&i| starts_header(&bytes[i..]))
        .map(|i| &bytes[i..])
}

fn starts_header(bytes: &[u8]) -> bool {
    HEADER_STARTS.iter().any(|name| {
        bytes.len() >= name.len() && bytes[..name.len()].eq_ignore_ascii_case(name)
    }) && header_line_is_plausible(bytes)
}

/// A header line is `name: value` with a token-only name.
fn header_line_is_plausible(bytes: &[u8]) -> bool {
    let Some(colon) = bytes.iter().take(80).position(|&b| b == b':') else {
        return false;
    };
    colon > 0
        && bytes[..colon]
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'-')
}
