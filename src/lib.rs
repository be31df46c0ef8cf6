//! # pdfgrab
//!
//! Scrape one web page for PDF links, pick the ones you want, and get them
//! back as a single ZIP archive.
//!
//! The flow is strictly sequential:
//!
//! 1. Fetch the page and extract every `<a href>` ending in `.pdf`
//! 2. Offer the sanitized link titles for selection
//! 3. Download each selected document, pausing between requests
//! 4. Deflate the successful downloads into an in-memory `pdf_files.zip`
//!
//! Failed downloads are reported and skipped; nothing is retried.
//!
//! ## Example
//!
//! ```no_run
//! use pdfgrab::{HttpFetcher, Pacer, ScrapeOutcome, SelectionSet, Session};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = HttpFetcher::new(Duration::from_secs(30))?;
//!     let mut session = Session::new(fetcher, Pacer::default());
//!
//!     let url = url::Url::parse("https://example.com/news/")?;
//!     let outcome = session.scrape(&url).await;
//!     let links = outcome.links().to_vec();
//!
//!     let selection = SelectionSet::all(&links);
//!     let report = session.download(&links, &selection).await?;
//!     if let Some(archive) = report.archive {
//!         std::fs::write("pdf_files.zip", archive.bytes())?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cli;
pub mod io;
pub mod logging;
pub mod pacing;
pub mod scrape;
pub mod select;
pub mod session;
pub mod zip;

pub use batch::{BatchReport, FetchFailure, download_selected};
pub use cli::Cli;
pub use io::{Fetch, FetchError, FetchResponse, HttpFetcher};
pub use pacing::Pacer;
pub use scrape::{CandidateLink, extract_links};
pub use select::{SelectionSet, parse_selection};
pub use session::{ScrapeOutcome, Session};
pub use zip::{Archive, ArchiveBuilder, ArchiveEntry, ZipReader};
