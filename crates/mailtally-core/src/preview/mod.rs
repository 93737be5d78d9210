//! Best-effort plain-text previews of message bodies.
//!
//! A preview only feeds the scorer: it is lossy, at most
//! [`MAX_PREVIEW_CHARS`] characters, and any failure simply means no preview.

mod clean;
mod container;

use std::path::Path;

use mailtally_mime::Message;
use tokio::io::AsyncReadExt;
use tracing::{debug, trace};

use crate::record::{BodySource, ContainerFormat};

pub use clean::{MAX_PREVIEW_CHARS, clean_body, truncate};
pub use container::{unwrap_emlx, unwrap_outlook_source};

/// Bytes read from a message file.
pub const READ_LIMIT: u64 = 64 * 1024;

/// Extracts a preview from `source`, or `None`.
pub async fn extract(source: &BodySource) -> Option<String> {
    match source {
        BodySource::Inline(text) => clean_body(text),
        BodySource::File { path, format } => {
            let bytes = read_capped(path).await?;
            let preview = preview_from_container(&bytes, *format);
            if preview.is_none() {
                trace!("No preview in {}", path.display());
            }
            preview
        }
    }
}

/// Preview from the bytes of a message container file.
#[must_use]
pub fn preview_from_container(bytes: &[u8], format: ContainerFormat) -> Option<String> {
    let raw = match format {
        ContainerFormat::Emlx => unwrap_emlx(bytes),
        ContainerFormat::OutlookSource => unwrap_outlook_source(bytes),
    }?;
    preview_from_message(raw)
}

/// Preview from raw RFC 822 bytes.
#[must_use]
pub fn preview_from_message(raw: &[u8]) -> Option<String> {
    let message = match Message::parse(raw) {
        Ok(message) => message,
        Err(e) => {
            debug!("Unparseable message body: {e}");
            return None;
        }
    };
    clean_body(&message.readable_text()?)
}

async fn read_capped(path: &Path) -> Option<Vec<u8>> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            debug!("Cannot open {}: {e}", path.display());
            return None;
        }
    };

    let mut bytes = Vec::new();
    if let Err(e) = file.take(READ_LIMIT).read_to_end(&mut bytes).await {
        debug!("Cannot read {}: {e}", path.display());
        return None;
    }
    Some(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::testing::JANE_MESSAGE;

    #[tokio::test]
    async fn test_inline_source() {
        let source = BodySource::Inline("Please confirm\n\nSent from my iPhone".into());
        assert_eq!(extract(&source).await.as_deref(), Some("Please confirm"));
    }

    #[tokio::test]
    async fn test_emlx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.emlx");
        let contents = format!("{}\n{JANE_MESSAGE}<plist/>", JANE_MESSAGE.len());
        std::fs::write(&path, contents).unwrap();

        let source = BodySource::File {
            path,
            format: ContainerFormat::Emlx,
        };
        assert_eq!(
            extract(&source).await.as_deref(),
            Some(
                "Hi, Could you please review the attached proposal and confirm by Friday? \
                 Thanks, Jane"
            )
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_silent() {
        let source = BodySource::File {
            path: "/nonexistent/42.emlx".into(),
            format: ContainerFormat::Emlx,
        };
        assert!(extract(&source).await.is_none());
    }

    #[test]
    fn test_html_only_message() {
        let raw = b"Content-Type: text/html\r\n\r\n<html><style>p{}</style><p>Your order</p><p>has shipped</p></html>";
        assert_eq!(
            preview_from_message(raw).as_deref(),
            Some("Your order has shipped")
        );
    }

    #[test]
    fn test_outlook_source() {
        let raw = b"\x00\x02\x00From: a@b.c\r\nContent-Type: text/plain\r\n\r\nCan we meet?\r\n> old\r\n";
        assert_eq!(
            preview_from_container(raw, ContainerFormat::OutlookSource).as_deref(),
            Some("Can we meet?")
        );
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(preview_from_container(b"\x00\x01\x02", ContainerFormat::Emlx).is_none());
        assert!(preview_from_container(b"\x00\x01\x02", ContainerFormat::OutlookSource).is_none());
    }
}
