//! MIME message structure and handling.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::html;
use std::fmt;

/// Nesting limit for multipart trees.
const MAX_DEPTH: usize = 8;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// MIME message part.
///
/// A multipart part keeps its raw body and also the parsed children.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw, still transfer-encoded).
    pub body: Vec<u8>,
    /// Child parts when this part is `multipart/*`.
    pub parts: Vec<Part>,
}

impl Part {
    /// Creates a new leaf part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            body,
            parts: Vec::new(),
        }
    }

    fn parse_bytes(raw: &[u8], depth: usize) -> Self {
        let (header_bytes, body) = split_header_body(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(header_bytes));
        let mut part = Self::new(headers, body.to_vec());

        if depth < MAX_DEPTH
            && let Ok(ct) = part.content_type()
            && ct.is_multipart()
            && let Some(boundary) = ct.boundary()
        {
            part.parts = split_multipart(body, boundary)
                .into_iter()
                .map(|child| Self::parse_bytes(child, depth + 1))
                .collect();
        }

        part
    }

    /// Gets the content type, defaulting to `text/plain` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Whether the part is marked as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.headers
            .get("content-disposition")
            .is_some_and(|d| d.trim_start().to_lowercase().starts_with("attachment"))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if Base64 decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(&self.body)),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the decoded body as a string in its declared charset.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        let content_type = self.content_type().unwrap_or_else(|_| ContentType::text_plain());
        Ok(decode_charset(&decoded, content_type.charset()))
    }

    /// Depth-first search for the first inline leaf of the given text subtype.
    #[must_use]
    pub fn find_text(&self, sub_type: &str) -> Option<&Self> {
        if !self.parts.is_empty() {
            return self.parts.iter().find_map(|child| child.find_text(sub_type));
        }

        let ct = self.content_type().ok()?;
        (ct.is("text", sub_type) && !self.is_attachment()).then_some(self)
    }
}

/// MIME message.
#[derive(Debug, Clone)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a raw RFC 822 message.
    ///
    /// Truncated input is accepted: an unterminated multipart yields the
    /// parts seen so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has no header section.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let root = Part::parse_bytes(raw, 0);
        if root.headers.is_empty() {
            return Err(Error::Parse("No header section".to_string()));
        }
        Ok(Self { root })
    }

    /// Top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// The root part (the message body itself for single-part messages).
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.root.parts.is_empty()
    }

    /// Gets the decoded From header.
    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.root.headers.get_decoded("from")
    }

    /// Gets the decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.root.headers.get_decoded("subject")
    }

    /// Finds and decodes the first text/plain part.
    ///
    /// # Errors
    ///
    /// Returns an error if no text part is found or decoding fails.
    pub fn text_part(&self) -> Result<String> {
        self.root
            .find_text("plain")
            .ok_or_else(|| Error::Parse("No text/plain part found".to_string()))?
            .body_text()
    }

    /// Finds and decodes the first text/html part.
    ///
    /// # Errors
    ///
    /// Returns an error if no HTML part is found or decoding fails.
    pub fn html_part(&self) -> Result<String> {
        self.root
            .find_text("html")
            .ok_or_else(|| Error::Parse("No text/html part found".to_string()))?
            .body_text()
    }

    /// Best readable text: the plain-text part, else the HTML part stripped
    /// of markup.
    #[must_use]
    pub fn readable_text(&self) -> Option<String> {
        self.text_part()
            .ok()
            .or_else(|| self.html_part().ok().map(|h| html::to_plain_text(&h)))
    }
}

/// Splits raw bytes at the first empty line.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(rest) = raw.strip_prefix(b"\r\n") {
        return (&raw[..0], rest);
    }
    if let Some(rest) = raw.strip_prefix(b"\n") {
        return (&raw[..0], rest);
    }

    let crlf = find(raw, b"\r\n\r\n").map(|i| (i, i + 4));
    let lf = find(raw, b"\n\n").map(|i| (i, i + 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((end, start)) => (&raw[..end], &raw[start..]),
        None => (raw, &raw[raw.len()..]),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits a multipart body into the raw bytes of each part.
///
/// The preamble and epilogue are discarded. A missing close delimiter ends
/// the last part at the end of the input.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let trimmed = line.trim_ascii_end();
        if let Some(rest) = trimmed.strip_prefix(delimiter.as_bytes())
            && (rest.is_empty() || rest == b"--")
        {
            if let Some(start) = current.take() {
                parts.push(strip_line_ending(&body[start..offset]));
            }
            if rest == b"--" {
                return parts;
            }
            current = Some(offset + line.len());
        }
        offset += line.len();
    }

    if let Some(start) = current {
        parts.push(&body[start..]);
    }
    parts
}

/// The line break before a delimiter belongs to the delimiter.
fn strip_line_ending(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_suffix(b"\r\n")
        .or_else(|| bytes.strip_suffix(b"\n"))
        .unwrap_or(bytes)
}
