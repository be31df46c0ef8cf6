use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};
use url::Url;

use super::link::CandidateLink;
use super::sanitize::{find_date, sanitize_title};

/// Title used when an anchor has no visible text.
pub const UNKNOWN_TITLE: &str = "unknown_title";

/// Suffix an href must carry to be picked up. Matched case-sensitively.
pub const PDF_SUFFIX: &str = ".pdf";

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Extract every PDF link from an HTML document.
///
/// Links are returned in document order. Relative hrefs are joined against
/// `base`; absolute ones pass through. Malformed markup never fails, it
/// simply yields fewer (or zero) links.
pub fn extract_links(html: &str, base: &Url) -> Vec<CandidateLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.ends_with(PDF_SUFFIX) {
            trace!(href, "Skipping non-PDF link");
            continue;
        }

        let url = match base.join(href) {
            Ok(url) => url,
            Err(e) => {
                debug!(href, error = %e, "Cannot resolve link against base URL");
                continue;
            }
        };

        let mut text = anchor_text(anchor);
        if text.is_empty() {
            text = UNKNOWN_TITLE.to_string();
        }

        links.push(CandidateLink {
            url,
            date: find_date(&text),
            title: sanitize_title(&text),
        });
    }

    debug!(count = links.len(), base = %base, "Extracted PDF links");
    links
}

/// Visible text of an anchor: each text node trimmed, empty ones dropped,
/// the rest joined without a separator.
fn anchor_text(anchor: ElementRef<'_>) -> String {
    anchor
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Titles shared by more than one link, in order of first appearance.
///
/// Such titles are ambiguous as selection keys and collide inside the
/// archive; callers report them, nothing renames them.
pub fn duplicate_titles(links: &[CandidateLink]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for link in links {
        *counts.entry(link.title.as_str()).or_default() += 1;
    }

    let mut duplicates: Vec<String> = Vec::new();
    for link in links {
        if counts[link.title.as_str()] > 1 && !duplicates.contains(&link.title) {
            duplicates.push(link.title.clone());
        }
    }
    duplicates
}
