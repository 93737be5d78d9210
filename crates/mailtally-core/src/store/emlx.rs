//! Locating Apple Mail `.emlx` files on disk.
//!
//! Layout under the `V<N>` directory:
//!
//! ```text
//! <account>/<mailbox>.mbox[/<child>.mbox...]/<store-uuid>/Data/<partition>/Messages/<id>.emlx
//! ```
//!
//! `<partition>` is the decimal digits of `id / 1000` in reverse order, one
//! directory per digit, and is omitted for ids below 1000. Messages whose
//! body was never fully downloaded are stored as `<id>.partial.emlx`.

use std::path::{Path, PathBuf};

/// Finds the `.emlx` file for message `id` in mailbox `mailbox_url`.
#[must_use]
pub fn locate(version_dir: &Path, mailbox_url: &str, id: i64) -> Option<PathBuf> {
    let mbox_dir = mbox_dir(version_dir, mailbox_url)?;
    if !mbox_dir.is_dir() {
        return None;
    }

    let relative = messages_dir(id);
    let mut roots = vec![mbox_dir.clone()];
    if let Ok(entries) = std::fs::read_dir(&mbox_dir) {
        let mut stores: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.extension().is_none_or(|ext| ext != "mbox"))
            .collect();
        stores.sort();
        roots.extend(stores);
    }

    roots.iter().find_map(|root| {
        let dir = root.join(&relative);
        [format!("{id}.emlx"), format!("{id}.partial.emlx")]
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}

/// Directory of the `.mbox` bundle for a mailbox URL.
fn mbox_dir(version_dir: &Path, mailbox_url: &str) -> Option<PathBuf> {
    let rest = mailbox_url
        .split_once("://")
        .map_or(mailbox_url, |(_, rest)| rest);
    let mut segments = rest
        .split('/')
        .filter(|s| !s.is_empty())
        .map(percent_decode)
        .filter(|s| is_plain_segment(s));

    let account = segments.next()?;
    let mut dir = version_dir.join(account);
    let mut has_mailbox = false;
    for segment in segments {
        dir.push(format!("{segment}.mbox"));
        has_mailbox = true;
    }
    has_mailbox.then_some(dir)
}

/// A decoded segment that stays inside its parent directory when joined.
fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

/// `Data/<partition>/Messages` relative to the store directory.
fn messages_dir(id: i64) -> PathBuf {
    let mut dir = PathBuf::from("Data");
    let partition = id / 1000;
    if partition > 0 {
        for digit in partition.to_string().chars().rev() {
            dir.push(digit.to_string());
        }
    }
    dir.push("Messages");
    dir
}

/// Decodes `%XX` escapes in a URL path segment.
fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = segment.get(i + 1..i + 3)
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
