//! Title cleanup and date detection for anchor text.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Maximum title length, counted in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Characters stripped from titles: reserved on common filesystems,
/// plus the full-width square brackets.
const FORBIDDEN: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|', '［', '］'];

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("valid date pattern"));

/// Make anchor text safe to use as a filename stem.
///
/// Forbidden characters are removed (not replaced), surrounding whitespace
/// is trimmed, and the result is cut to [`MAX_TITLE_CHARS`] characters.
pub fn sanitize_title(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    cleaned.trim().chars().take(MAX_TITLE_CHARS).collect()
}

/// Find the first `YYYY-MM-DD` substring and parse it as a calendar date.
///
/// Only the first match is considered. A match that is not a real date
/// (month 13, February 30th, ...) gives `None`.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    let found = DATE_PATTERN.find(text)?;
    NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d").ok()
}
