//! DataLoader: fetch + parse of the footer's JSON documents.
//!
//! The network side sits behind [`DocumentSource`] so the controller can run
//! against [`HttpSource`] in the binary and an in-memory source in tests.
//! Fetching returns the raw body; parsing happens here so a malformed body is
//! reported as [`LoadError::Parse`] rather than as a transport failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::LoadError;
use crate::model::{ContactData, FeedData};

/// Something that can produce the body of a document addressed by a relative
/// path.
pub trait DocumentSource: Send + Sync + 'static {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, LoadError>> + Send;
}

/// reqwest-backed source; paths are resolved against `base` the way a browser
/// resolves a relative URL against the page.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    pub fn from_base_str(base: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base).map_err(|e| anyhow::anyhow!("invalid base url {base:?}: {e}"))?;
        Ok(Self::new(base))
    }

    pub fn resolve(&self, path: &str) -> Result<Url, LoadError> {
        self.base
            .join(path)
            .map_err(|e| LoadError::transport(path, e))
    }
}

impl DocumentSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        let url = self.resolve(path)?;
        debug!("fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| LoadError::transport(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LoadError::transport(url.as_str(), e))?;
        debug!(bytes = body.len(), "raw response from {}", url);
        Ok(body)
    }
}

/// Parse a fetched body into a document.
pub fn parse_document<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, LoadError> {
    serde_json::from_str(body).map_err(|source| LoadError::Parse {
        url: path.to_string(),
        source,
    })
}

/// Linear backoff: the n-th retry waits `n × backoff_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_step: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Given the retry count so far, return the incremented count and how
    /// long to wait before the next attempt, or `None` once exhausted.
    pub fn next_retry(&self, retry_count: u32) -> Option<(u32, Duration)> {
        if retry_count >= self.max_retries {
            return None;
        }
        let next = retry_count + 1;
        Some((next, self.backoff_step * next))
    }
}

/// How the controller loads its documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Contact and feed in parallel; both must succeed, no retry.
    FailFast,
    /// Contact only, retried per the policy.  No ticker.
    Retry(RetryPolicy),
}

impl LoadStrategy {
    pub fn has_feed(&self) -> bool {
        matches!(self, Self::FailFast)
    }
}

impl DataLoader<HttpSource> {
    pub fn from_config(source: &SourceConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            HttpSource::from_base_str(&source.base_url)?,
            source.contact_path.clone(),
            source.feed_path.clone(),
        ))
    }
}

/// Typed loading on top of a [`DocumentSource`].
pub struct DataLoader<S> {
    source: Arc<S>,
    contact_path: String,
    feed_path: String,
}

impl<S> Clone for DataLoader<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            contact_path: self.contact_path.clone(),
            feed_path: self.feed_path.clone(),
        }
    }
}

impl<S: DocumentSource> DataLoader<S> {
    pub fn new(source: S, contact_path: impl Into<String>, feed_path: impl Into<String>) -> Self {
        Self {
            source: Arc::new(source),
            contact_path: contact_path.into(),
            feed_path: feed_path.into(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// GET + parse one document.
    pub async fn load<T: DeserializeOwned>(&self, path: &str) -> Result<T, LoadError> {
        let result = match self.source.fetch(path).await {
            Ok(body) => parse_document(path, &body),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(kind = e.kind(), "load failed: {}", e);
        }
        result
    }

    pub async fn load_contact(&self) -> Result<ContactData, LoadError> {
        self.load(&self.contact_path).await
    }

    pub async fn load_feed(&self) -> Result<FeedData, LoadError> {
        self.load(&self.feed_path).await
    }

    /// Both documents concurrently.  The first failure wins and the other
    /// request is dropped.
    pub async fn load_all(&self) -> Result<(ContactData, FeedData), LoadError> {
        tokio::try_join!(self.load_contact(), self.load_feed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySource, Response};

    #[test]
    fn retry_policy_backs_off_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_retry(0), Some((1, Duration::from_millis(1000))));
        assert_eq!(policy.next_retry(1), Some((2, Duration::from_millis(2000))));
        assert_eq!(policy.next_retry(2), Some((3, Duration::from_millis(3000))));
        assert_eq!(policy.next_retry(3), None);
    }

    #[test]
    fn zero_retries_gives_up_immediately() {
        let policy = RetryPolicy {
            max_retries: 0,
            backoff_step: Duration::from_millis(10),
        };
        assert_eq!(policy.next_retry(0), None);
    }

    #[test]
    fn only_fail_fast_has_feed() {
        assert!(LoadStrategy::FailFast.has_feed());
        assert!(!LoadStrategy::Retry(RetryPolicy::default()).has_feed());
    }

    #[test]
    fn resolve_is_relative_to_base() {
        let src = HttpSource::from_base_str("http://localhost:8000/site/index.html").unwrap();
        assert_eq!(
            src.resolve("contact.json").unwrap().as_str(),
            "http://localhost:8000/site/contact.json"
        );
        assert!(HttpSource::from_base_str("not a url").is_err());
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let source = MemorySource::new();
        source.respond_body("contact.json", "{\"email\": ");
        let loader = DataLoader::new(source, "contact.json", "blog.json");

        let err = loader.load_contact().await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn load_all_fails_if_either_fails() {
        let source = MemorySource::new();
        source.respond_body("contact.json", r#"{"email":"a@b.com"}"#);
        source.respond("blog.json", Response::Status(500));
        let loader = DataLoader::new(source, "contact.json", "blog.json");

        let err = loader.load_all().await.unwrap_err();
        assert!(matches!(err, LoadError::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn load_all_returns_both_documents() {
        let source = MemorySource::new();
        source.respond_body("contact.json", r#"{"email":"a@b.com"}"#);
        source.respond_body("blog.json", r#"{"entries":[{"text":"hi"}]}"#);
        let loader = DataLoader::new(source, "contact.json", "blog.json");

        let (contact, feed) = loader.load_all().await.unwrap();
        assert_eq!(contact.email, "a@b.com");
        assert_eq!(feed.entries.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn load_all_fetches_concurrently() {
        let source = MemorySource::new();
        source
            .respond_body("contact.json", r#"{"email":"a@b.com"}"#)
            .with_latency("contact.json", Duration::from_millis(400));
        source
            .respond_body("blog.json", r#"{"entries":[]}"#)
            .with_latency("blog.json", Duration::from_millis(400));
        let loader = DataLoader::new(source, "contact.json", "blog.json");

        let start = tokio::time::Instant::now();
        loader.load_all().await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(800));
        assert_eq!(loader.source().call_count("contact.json"), 1);
        assert_eq!(loader.source().call_count("blog.json"), 1);
    }

    #[tokio::test]
    async fn missing_document_is_an_http_status() {
        let loader = DataLoader::new(MemorySource::new(), "contact.json", "blog.json");
        let err = loader.load_feed().await.unwrap_err();
        assert!(matches!(err, LoadError::HttpStatus { status: 404, .. }));
    }
}
