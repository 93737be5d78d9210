//! # mailtally-mime
//!
//! Lenient MIME decoding for pulling readable text out of stored email.
//!
//! Mail stores keep messages as raw RFC 822 bytes, often truncated, often in
//! legacy charsets, and occasionally malformed. This crate decodes what it
//! can and leaves the rest alone:
//!
//! - **Message parsing**: headers, nested multipart trees, truncated bodies
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words
//! - **Charsets**: UTF-8 plus the Latin-1 family, lossy for everything else
//! - **HTML**: markup stripped down to line-structured plain text
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailtally_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: Test\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw)?;
//! println!("Subject: {}", message.subject().unwrap_or_default());
//! println!("Body: {}", message.readable_text().unwrap_or_default());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;
pub mod html;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
