mod charset;
mod error;
mod http;

pub use charset::decode_html;
pub use error::FetchError;
pub use http::{DEFAULT_TIMEOUT, HttpFetcher};

use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Raw result of a single GET request
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// Raw `Content-Type` header, if the server sent one
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for fetching a URL over HTTP
///
/// Only transport failures are errors; any status code, including 4xx and
/// 5xx, comes back as a [`FetchResponse`].
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Perform one GET request and return status, content type and body
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

async fn fetch_ok<F: Fetch + ?Sized>(fetcher: &F, url: &Url) -> Result<FetchResponse, FetchError> {
    let resp = fetcher.get(url).await?;
    if !resp.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status,
        });
    }
    debug!(url = %url, bytes = resp.body.len(), "Fetched document");
    Ok(resp)
}

/// Fetch a document and return its body, failing on non-2xx statuses
pub async fn fetch_bytes<F: Fetch + ?Sized>(fetcher: &F, url: &Url) -> Result<Vec<u8>, FetchError> {
    Ok(fetch_ok(fetcher, url).await?.body)
}

/// Fetch an HTML page as text, decoded with the charset the server or the
/// page declares (see [`decode_html`])
pub async fn fetch_page<F: Fetch + ?Sized>(fetcher: &F, url: &Url) -> Result<String, FetchError> {
    let resp = fetch_ok(fetcher, url).await?;
    Ok(decode_html(&resp.body, resp.content_type.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u16, Option<&'static str>, &'static [u8]);

    #[async_trait]
    impl Fetch for Fixed {
        async fn get(&self, _url: &Url) -> Result<FetchResponse, FetchError> {
            Ok(FetchResponse {
                status: self.0,
                content_type: self.1.map(str::to_string),
                body: self.2.to_vec(),
            })
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn success_range() {
        let resp = |status| FetchResponse {
            status,
            content_type: None,
            body: Vec::new(),
        };
        assert!(resp(200).is_success());
        assert!(resp(204).is_success());
        assert!(!resp(304).is_success());
        assert!(!resp(404).is_success());
        assert!(!resp(500).is_success());
    }

    #[tokio::test]
    async fn fetch_page_decodes_lossily() {
        let page = fetch_page(&Fixed(200, None, b"<p>ok \xff</p>"), &url()).await.unwrap();
        assert_eq!(page, "<p>ok \u{fffd}</p>");
    }

    #[tokio::test]
    async fn fetch_page_honours_content_type_charset() {
        let fetcher = Fixed(200, Some("text/html; charset=Shift_JIS"), b"<p>\x8c\x88\x8e\x5a</p>");
        let page = fetch_page(&fetcher, &url()).await.unwrap();
        assert_eq!(page, "<p>決算</p>");
    }

    #[tokio::test]
    async fn fetch_bytes_keeps_body_untouched() {
        let body = fetch_bytes(&Fixed(200, Some("application/pdf"), b"%PDF\xff"), &url())
            .await
            .unwrap();
        assert_eq!(body, b"%PDF\xff");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let err = fetch_page(&Fixed(503, None, b"busy"), &url()).await.unwrap_err();
        match err {
            FetchError::Status { status, url } => {
                assert_eq!(status, 503);
                assert_eq!(url, "https://example.com/page");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
