//! HTML to plain text conversion.
//!
//! No DOM: a single pass over the markup that keeps enough line structure
//! for line-oriented post-processing (signature and quote detection).

/// Tags whose closing (or, for `br`, any) occurrence ends a line.
const BLOCK_CLOSERS: &[&str] = &[
    "br", "/p", "/div", "/tr", "/li", "/h1", "/h2", "/h3", "/h4", "/h5", "/h6", "/blockquote",
    "/table", "hr",
];

/// Opening tags that start a new line.
const BLOCK_OPENERS: &[&str] = &["p", "div", "tr", "li", "blockquote", "table"];

/// Elements whose content is never text.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "head", "title"];

/// Convert HTML to plain text.
///
/// - Strips tags, drops `script`/`style`/`head` content
/// - Converts block elements to line breaks
/// - Decodes common HTML entities
#[must_use]
pub fn to_plain_text(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut last_was_block = false;
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => {
                let Some(end) = rest.find('>') else {
                    break;
                };
                let tag = tag_name(&rest[1..end]);
                rest = &rest[end + 1..];

                if SKIPPED_ELEMENTS.contains(&tag.as_str()) {
                    rest = skip_element(rest, &tag);
                    continue;
                }

                if BLOCK_CLOSERS.contains(&tag.as_str()) {
                    if !last_was_block {
                        result.push('\n');
                        last_was_block = true;
                    }
                } else if BLOCK_OPENERS.contains(&tag.as_str())
                    && !result.is_empty()
                    && !last_was_block
                {
                    result.push('\n');
                    last_was_block = true;
                }
            }
            '&' => {
                let (decoded, consumed) = decode_entity(rest);
                result.push_str(&decoded);
                rest = &rest[consumed..];
                last_was_block = false;
            }
            _ if c.is_whitespace() => {
                if !result.is_empty() && !result.ends_with(' ') && !result.ends_with('\n') {
                    result.push(' ');
                }
                rest = &rest[c.len_utf8()..];
            }
            _ => {
                result.push(c);
                last_was_block = false;
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    normalize_lines(&result)
}

/// Lowercased tag name, keeping a leading `/` for closing tags.
fn tag_name(inner: &str) -> String {
    let inner = inner.trim_start();
    let (prefix, body) = inner
        .strip_prefix('/')
        .map_or(("", inner), |body| ("/", body));
    let name: String = body
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect();
    format!("{prefix}{}", name.to_lowercase())
}

/// Skips past the closing tag of `tag`, or to the end of input.
fn skip_element<'a>(rest: &'a str, tag: &str) -> &'a str {
    let closing = format!("</{tag}");
    let lower = rest.to_ascii_lowercase();
    lower
        .find(&closing)
        .and_then(|start| rest[start..].find('>').map(|end| &rest[start + end + 1..]))
        .unwrap_or("")
}

/// Decodes the entity at the start of `input` (which begins with `&`).
fn decode_entity(input: &str) -> (String, usize) {
    let Some(semi) = input[1..].find(';').map(|i| i + 1) else {
        return ("&".to_string(), 1);
    };
    let entity = &input[1..semi];
    if entity.is_empty() || entity.len() > 10 || entity.contains(char::is_whitespace) {
        return ("&".to_string(), 1);
    }

    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "eacute" => "\u{e9}",
        "egrave" => "\u{e8}",
        "agrave" => "\u{e0}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "copy" => "\u{00A9}",
        "reg" => "\u{00AE}",
        "trade" => "\u{2122}",
        _ => {
            let code = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#')?.parse::<u32>().ok());
            return match code.and_then(char::from_u32) {
                Some(ch) => (ch.to_string(), semi + 1),
                None => ("&".to_string(), 1),
            };
        }
    };

    (decoded.to_string(), semi + 1)
}

/// Trims each line and collapses runs of blank lines to one.
fn normalize_lines(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }

    cleaned.trim().to_string()
}
