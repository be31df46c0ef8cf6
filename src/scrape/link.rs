use std::fmt;

use chrono::NaiveDate;
use url::Url;

/// A PDF link found on the scraped page.
///
/// Created once per matching anchor and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// Absolute URL of the document
    pub url: Url,
    /// Sanitized anchor text, usable as a filename stem
    pub title: String,
    /// First `YYYY-MM-DD` date found in the anchor text
    pub date: Option<NaiveDate>,
}

impl CandidateLink {
    /// Name of the archive entry this link is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.title)
    }
}

impl fmt::Display for CandidateLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{} ({})", self.title, date),
            None => f.write_str(&self.title),
        }
    }
}
