use serde::de::DeserializeOwned;
use threadlens_core::{CommentAnalysis, Parsed, ThemeReport};
use tracing::debug;

/// Best-effort parse of free-form model text: the whole reply as JSON first,
/// then the outermost delimited slice (models like to wrap JSON in prose),
/// otherwise the raw text is handed back unstructured.
fn best_effort<T: DeserializeOwned>(raw: &str, open: char, close: char) -> Parsed<T> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Parsed::Structured(value);
    }

    if let Some(slice) = outermost_slice(trimmed, open, close) {
        if let Ok(value) = serde_json::from_str::<T>(slice) {
            debug!("Recovered JSON payload embedded in prose reply");
            return Parsed::Structured(value);
        }
    }

    Parsed::Unstructured(trimmed.to_string())
}

fn outermost_slice(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Parses one relevance batch's reply. An unstructured result means the
/// caller drops that batch's contributions.
pub fn parse_comment_analyses(raw: &str) -> Parsed<Vec<CommentAnalysis>> {
    best_effort(raw, '[', ']')
}

/// Parses the theme-extraction reply, falling back to the raw text.
pub fn parse_theme_report(raw: &str) -> ThemeReport {
    best_effort(raw, '{', '}')
}
