//! Plain-text ledger output.

use mailtally_core::{Category, TriageSummary, TriagedMessage};

const SENDER_WIDTH: usize = 32;
const NO_DATE: &str = "----------------";

/// `CATEGORY SCORE  DATE  SENDER  SUBJECT`
pub fn line(message: &TriagedMessage) -> String {
    let received = message
        .record
        .received_at
        .map_or_else(|| NO_DATE.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    let subject = if message.record.subject.is_empty() {
        "(no subject)"
    } else {
        message.record.subject.as_str()
    };
    format!(
        "{:<6} {:>3}  {received}  {:<width$}  {subject}",
        message.category.as_str(),
        message.score.total,
        fit(&message.record.sender, SENDER_WIDTH),
        width = SENDER_WIDTH
    )
}

/// `N messages: a ACTION, f FYI, i IGNORE`
pub fn summary(summary: &TriageSummary) -> String {
    let counts: Vec<String> = Category::ALL
        .iter()
        .map(|c| format!("{} {c}", summary.count(*c)))
        .collect();
    format!("{} messages: {}", summary.total(), counts.join(", "))
}

/// One line per category with what it holds.
pub fn legend() -> Vec<String> {
    Category::ALL
        .iter()
        .map(|c| format!("{:<6}  {}", c.as_str(), c.description()))
        .collect()
}

/// Shortens `text` to `width` characters, marking the cut with `…`.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}
