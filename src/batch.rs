//! Sequential download of the selected documents into one archive.

use tracing::{debug, info, warn};
use url::Url;

use crate::io::{Fetch, fetch_bytes};
use crate::pacing::Pacer;
use crate::scrape::CandidateLink;
use crate::select::SelectionSet;
use crate::zip::{Archive, ArchiveBuilder};

/// A selected document that did not make it into the archive
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub title: String,
    pub url: Url,
    pub reason: String,
}

/// Result of one batch run
#[derive(Debug)]
pub struct BatchReport {
    /// `None` only when nothing was selected
    pub archive: Option<Archive>,
    /// Number of documents added to the archive
    pub downloaded: usize,
    /// Documents skipped because their download failed
    pub failures: Vec<FetchFailure>,
}

impl BatchReport {
    fn nothing_selected() -> Self {
        Self {
            archive: None,
            downloaded: 0,
            failures: Vec::new(),
        }
    }
}

/// Download every selected document and bundle the successes.
///
/// Requests are made one after another, spaced by `pacer`. A failed
/// document (non-2xx status or network error) is skipped and returned in
/// [`BatchReport::failures`] for the caller to report; the rest of the
/// batch continues. An empty selection makes no request and
/// produces no archive. Otherwise an archive is always produced, even if
/// every download failed.
pub async fn download_selected<F: Fetch + ?Sized>(
    fetcher: &F,
    links: &[CandidateLink],
    selection: &SelectionSet,
    pacer: &mut Pacer,
) -> anyhow::Result<BatchReport> {
    if selection.is_empty() {
        debug!("No documents selected");
        return Ok(BatchReport::nothing_selected());
    }

    let targets = selection.resolve(links);
    info!(
        count = targets.len(),
        interval_ms = pacer.min_interval().as_millis(),
        "Downloading selected documents"
    );

    let mut builder = ArchiveBuilder::new();
    let mut failures = Vec::new();

    for link in targets {
        pacer.wait().await;

        match fetch_bytes(fetcher, &link.url).await {
            Ok(body) => {
                builder.add(&link.file_name(), &body)?;
                info!(title = %link.title, bytes = body.len(), "Downloaded");
            }
            Err(e) => {
                debug!(title = %link.title, error = %e, "Download failed");
                failures.push(FetchFailure {
                    title: link.title.clone(),
                    url: link.url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let downloaded = builder.len();
    if downloaded == 0 {
        warn!("Every selected download failed; archive is empty");
    }

    Ok(BatchReport {
        archive: Some(builder.finish()?),
        downloaded,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{FetchError, FetchResponse};
    use crate::zip::ZipReader;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Serves fixed bodies by URL path (404 otherwise) and records the
    /// request order
    #[derive(Default)]
    struct Scripted {
        routes: Vec<(&'static str, &'static str)>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetch for Scripted {
        async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
            self.requests.lock().unwrap().push(url.path().to_string());
            let resp = match self.routes.iter().find(|(path, _)| *path == url.path()) {
                Some((_, body)) => FetchResponse {
                    status: 200,
                    content_type: None,
                    body: body.as_bytes().to_vec(),
                },
                None => FetchResponse {
                    status: 404,
                    content_type: None,
                    body: Vec::new(),
                },
            };
            Ok(resp)
        }
    }

    fn link(path: &str, title: &str) -> CandidateLink {
        CandidateLink {
            url: Url::parse("https://example.com/").unwrap().join(path).unwrap(),
            title: title.to_string(),
            date: None,
        }
    }

    fn no_delay() -> Pacer {
        Pacer::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn empty_selection_produces_no_archive() {
        let fetcher = Scripted::default();
        let links = vec![link("a.pdf", "A")];

        let report = download_selected(&fetcher, &links, &SelectionSet::new(), &mut no_delay())
            .await
            .unwrap();

        assert!(report.archive.is_none());
        assert!(fetcher.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn two_successes_make_two_entries() {
        let fetcher = Scripted {
            routes: vec![("/a.pdf", "%PDF a"), ("/b.pdf", "%PDF b")],
            ..Default::default()
        };
        let links = vec![link("a.pdf", "Alpha"), link("b.pdf", "Beta")];
        let selection = SelectionSet::from_titles(["Alpha", "Beta"]);

        let report = download_selected(&fetcher, &links, &selection, &mut no_delay())
            .await
            .unwrap();

        assert_eq!(report.downloaded, 2);
        assert!(report.failures.is_empty());

        let archive = report.archive.unwrap();
        let reader = ZipReader::new(archive.bytes());
        let entries = reader.list_files().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha.pdf", "Beta.pdf"]);
        assert_eq!(reader.read_entry(&entries[1]).unwrap(), b"%PDF b");
    }

    #[tokio::test]
    async fn failed_item_is_skipped_and_reported() {
        let fetcher = Scripted {
            routes: vec![("/a.pdf", "%PDF a"), ("/c.pdf", "%PDF c")],
            ..Default::default()
        };
        let links = vec![link("a.pdf", "A"), link("b.pdf", "B"), link("c.pdf", "C")];
        let selection = SelectionSet::all(&links);

        let report = download_selected(&fetcher, &links, &selection, &mut no_delay())
            .await
            .unwrap();

        assert_eq!(report.downloaded, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].title, "B");
        assert!(report.failures[0].reason.contains("404"));
        assert_eq!(
            *fetcher.requests.lock().unwrap(),
            vec!["/a.pdf", "/b.pdf", "/c.pdf"]
        );
        assert_eq!(report.archive.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn all_failures_still_yield_empty_archive() {
        let fetcher = Scripted::default();
        let links = vec![link("a.pdf", "A")];
        let selection = SelectionSet::all(&links);

        let report = download_selected(&fetcher, &links, &selection, &mut no_delay())
            .await
            .unwrap();

        let archive = report.archive.unwrap();
        assert!(archive.is_empty());
        assert_eq!(report.failures.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_title_fetches_first_link_only() {
        let fetcher = Scripted {
            routes: vec![("/1.pdf", "first"), ("/2.pdf", "second")],
            ..Default::default()
        };
        let links = vec![link("1.pdf", "Same"), link("2.pdf", "Same")];
        let selection = SelectionSet::from_indices(&links, &[1]);

        let report = download_selected(&fetcher, &links, &selection, &mut no_delay())
            .await
            .unwrap();

        assert_eq!(*fetcher.requests.lock().unwrap(), vec!["/1.pdf"]);
        assert_eq!(report.downloaded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn requests_are_spaced_by_pacer() {
        let fetcher = Scripted {
            routes: vec![("/a.pdf", "a"), ("/b.pdf", "b"), ("/c.pdf", "c")],
            ..Default::default()
        };
        let links = vec![link("a.pdf", "A"), link("b.pdf", "B"), link("c.pdf", "C")];
        let selection = SelectionSet::all(&links);
        let mut pacer = Pacer::new(Duration::from_secs(1));

        let start = tokio::time::Instant::now();
        download_selected(&fetcher, &links, &selection, &mut pacer)
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    /// Collects formatted log output
    #[derive(Clone, Default)]
    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogSink {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[tokio::test]
    async fn reported_failures_stay_below_warn() {
        let sink = LogSink::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let fetcher = Scripted::default();
        let links = vec![link("a.pdf", "A")];
        download_selected(&fetcher, &links, &SelectionSet::new(), &mut no_delay())
            .await
            .unwrap();
        let report = download_selected(&fetcher, &links, &SelectionSet::all(&links), &mut no_delay())
            .await
            .unwrap();
        assert_eq!(report.failures.len(), 1);

        // Failures come back in the report; only the batch-wide outcome is logged
        let logs = sink.text();
        assert!(!logs.contains("Download failed"), "{logs}");
        assert!(!logs.contains("No documents selected"), "{logs}");
        assert!(logs.contains("Every selected download failed"), "{logs}");
    }
}
