//! One interactive run: scrape a page, ask which documents to fetch,
//! download them and hand back the archive.
//!
//! Every failure along the way is turned into an empty result for the
//! caller to report; nothing here aborts the process.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::{debug, info, warn};
use url::Url;

use crate::batch::{BatchReport, download_selected};
use crate::io::{Fetch, FetchError, fetch_page};
use crate::pacing::Pacer;
use crate::scrape::{CandidateLink, duplicate_titles, extract_links};
use crate::select::{SelectionSet, parse_selection};

/// What a page scrape produced
#[derive(Debug)]
pub enum ScrapeOutcome {
    /// At least one PDF link was found
    Found(Vec<CandidateLink>),
    /// The page loaded but carries no PDF links
    NoLinks,
    /// The page itself could not be fetched
    PageFailed(FetchError),
}

impl ScrapeOutcome {
    /// Candidate links, empty unless [`ScrapeOutcome::Found`]
    pub fn links(&self) -> &[CandidateLink] {
        match self {
            ScrapeOutcome::Found(links) => links,
            _ => &[],
        }
    }
}

/// Owns the fetcher and pacing for one user session
pub struct Session<F: Fetch> {
    fetcher: F,
    pacer: Pacer,
}

impl<F: Fetch> Session<F> {
    pub fn new(fetcher: F, pacer: Pacer) -> Self {
        Self { fetcher, pacer }
    }

    /// Fetch `url` and extract its PDF links
    pub async fn scrape(&self, url: &Url) -> ScrapeOutcome {
        let html = match fetch_page(&self.fetcher, url).await {
            Ok(html) => html,
            Err(e) => {
                debug!(url = %url, error = %e, "Page could not be loaded");
                return ScrapeOutcome::PageFailed(e);
            }
        };

        let links = extract_links(&html, url);
        if links.is_empty() {
            debug!(url = %url, "No PDF links found");
            return ScrapeOutcome::NoLinks;
        }

        for title in duplicate_titles(&links) {
            warn!(title = %title, "Several links share this title; only the first can be selected");
        }

        info!(url = %url, count = links.len(), "Found PDF links");
        ScrapeOutcome::Found(links)
    }

    /// Download the selection into an archive
    pub async fn download(
        &mut self,
        links: &[CandidateLink],
        selection: &SelectionSet,
    ) -> Result<BatchReport> {
        download_selected(&self.fetcher, links, selection, &mut self.pacer).await
    }
}

/// Print the numbered candidate list
pub fn render_candidates<W: Write>(out: &mut W, links: &[CandidateLink], verbose: bool) -> Result<()> {
    let width = links.len().to_string().len();
    for (i, link) in links.iter().enumerate() {
        if verbose {
            let date = link
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".repeat(10));
            writeln!(out, "{:>width$}) {}  {}  {}", i + 1, date, link.title, link.url)?;
        } else {
            writeln!(out, "{:>width$}) {}", i + 1, link.title)?;
        }
    }
    Ok(())
}

/// Ask for a selection until the answer parses.
///
/// End of input counts as an empty selection.
pub fn prompt_selection<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    count: usize,
) -> Result<Vec<usize>> {
    loop {
        write!(out, "Select PDFs to download (e.g. 1,3,5-7 or all): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(Vec::new());
        }

        match parse_selection(&line, count) {
            Ok(indices) => return Ok(indices),
            Err(e) => writeln!(out, "{e}")?,
        }
    }
}

/// Ask for the page URL until it parses as an absolute http(s) URL.
///
/// Returns `None` on end of input.
pub fn prompt_url<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<Url>> {
    loop {
        write!(out, "URL of the page to scan for PDFs: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(None);
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_page_url(line) {
            Ok(url) => return Ok(Some(url)),
            Err(e) => writeln!(out, "{e}")?,
        }
    }
}

/// Parse a page URL, accepting only http and https
pub fn parse_page_url(s: &str) -> Result<Url> {
    let url = Url::parse(s.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("Unsupported URL scheme: {}", other),
    }
}
