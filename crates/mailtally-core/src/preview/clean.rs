//! Cutting a body down to its first few meaningful lines.

/// Maximum preview length in characters, ellipsis included.
pub const MAX_PREVIEW_CHARS: usize = 300;

const ELLIPSIS: char = '…';

const SIGNATURE_PREFIXES: &[&str] = &["___", "Sent from", "Get Outlook for"];

/// Joins the non-empty lines before any signature or quoted reply.
///
/// Returns `None` when nothing is left.
#[must_use]
pub fn clean_body(body: &str) -> Option<String> {
    let mut preview = String::new();
    let mut lines = body.lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        if is_signature(line) || is_quote_start(line, lines.peek().copied()) {
            break;
        }
        if line.is_empty() {
            continue;
        }
        if !preview.is_empty() {
            preview.push(' ');
        }
        preview.push_str(line);
        if preview.chars().count() > MAX_PREVIEW_CHARS {
            break;
        }
    }

    if preview.is_empty() {
        return None;
    }
    Some(truncate(&preview))
}

/// Hard-truncates to [`MAX_PREVIEW_CHARS`] with a trailing ellipsis.
#[must_use]
pub fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_PREVIEW_CHARS - 1).collect();
    cut.push(ELLIPSIS);
    cut
}

fn is_signature(line: &str) -> bool {
    line == "--" || SIGNATURE_PREFIXES.iter().any(|p| line.starts_with(p))
}

fn is_quote_start(line: &str, next: Option<&str>) -> bool {
    if line.starts_with('>') {
        return true;
    }

    let lower = line.to_lowercase();
    if lower.starts_with("on ") && lower.ends_with("wrote:") {
        return true;
    }
    if lower.contains("-----original message-----") {
        return true;
    }
    // Outlook reply header, inline or on consecutive lines.
    lower.starts_with("from:")
        && (lower.contains("sent:")
            || next.is_some_and(|n| {
                let n = n.to_lowercase();
                n.starts_with("sent:") || n.starts_with("date:")
            }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_non_empty_lines() {
        let body = "Hi Jane,\n\n  Could you confirm?  \n\nThanks";
        assert_eq!(clean_body(body).as_deref(), Some("Hi Jane, Could you confirm? Thanks"));
    }

    #[test]
    fn test_stops_at_signatures() {
        for marker in ["--", "-- ", "________", "Sent from my iPhone", "Get Outlook for iOS"] {
            let body = format!("Keep this\n{marker}\nDrop this");
            assert_eq!(clean_body(&body).as_deref(), Some("Keep this"), "{marker:?}");
        }
    }

    #[test]
    fn test_dashes_inside_text_are_not_a_signature() {
        assert_eq!(
            clean_body("Budget -- final\nnumbers").as_deref(),
            Some("Budget -- final numbers")
        );
    }

    #[test]
    fn test_stops_at_quotes() {
        let cases = [
            "Sounds good\n> earlier message",
            "Sounds good\nOn Mon, Jan 6, 2025 at 9:00 AM Bob <bob@x.com> wrote:\nold",
            "Sounds good\n-----Original Message-----\nold",
            "Sounds good\nFrom: Bob Sent: Monday\nold",
            "Sounds good\nFrom: Bob\nSent: Monday\nold",
        ];
        for body in cases {
            assert_eq!(clean_body(body).as_deref(), Some("Sounds good"), "{body:?}");
        }
    }

    #[test]
    fn test_from_line_alone_is_kept() {
        assert_eq!(
            clean_body("From: the team\nWelcome aboard").as_deref(),
            Some("From: the team Welcome aboard")
        );
    }

    #[test]
    fn test_empty_and_quote_only_bodies() {
        assert_eq!(clean_body(""), None);
        assert_eq!(clean_body("\n\n  \n"), None);
        assert_eq!(clean_body("> all quoted"), None);
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        let body = "word ".repeat(100);
        let preview = clean_body(&body).unwrap_or_default();
        assert_eq!(preview.chars().count(), MAX_PREVIEW_CHARS);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_exactly_max_is_untouched() {
        let text = "x".repeat(MAX_PREVIEW_CHARS);
        assert_eq!(truncate(&text), text);
        let text = "é".repeat(MAX_PREVIEW_CHARS + 1);
        let cut = truncate(&text);
        assert_eq!(cut.chars().count(), MAX_PREVIEW_CHARS);
    }
}
