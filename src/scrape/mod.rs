//! PDF link discovery.
//!
//! Turns one HTML page into a list of [`CandidateLink`]s:
//!
//! 1. Every `<a href>` whose href ends in `.pdf` is considered
//! 2. The href is resolved against the page URL
//! 3. The anchor text becomes the title (or `unknown_title` when empty)
//! 4. A `YYYY-MM-DD` date in the text is parsed when present
//! 5. The title is stripped of filename-hostile characters and capped
//!    at 100 characters
//!
//! Titles are not deduplicated. Two anchors with the same text produce
//! two candidates with identical titles; see [`duplicate_titles`].

mod extractor;
mod link;
mod sanitize;

pub use extractor::{PDF_SUFFIX, UNKNOWN_TITLE, duplicate_titles, extract_links};
pub use link::CandidateLink;
pub use sanitize::{MAX_TITLE_CHARS, find_date, sanitize_title};
