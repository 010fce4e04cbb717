//! HTTP artifact fetching
//!
//! One blocking-style fetch per artifact, no retries beyond what callers
//! decide. Redirects are followed manually because package archives love
//! to bounce downloads through mirrors.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::header::{LOCATION, USER_AGENT};
use hyper::{Method, Request, Uri};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
mod tests;

/// Maximum redirects followed for a single artifact URL.
const MAX_REDIRECTS: usize = 5;

/// Fetches one artifact into memory.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetcher backed by a shared HTTPS client.
pub struct HttpFetcher {
    client: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let https = HttpsConnector::new();
        let client = Client::builder(TokioExecutor::new()).build::<_, Empty<Bytes>>(https);
        Self {
            client,
            timeout: None,
        }
    }

    /// Bound every fetch to `limit`. The default is no bound at all: a
    /// stalled artifact server stalls the build.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    async fn fetch_inner(&self, url: &str) -> Result<Vec<u8>> {
        let mut uri: Uri = url
            .parse()
            .with_context(|| format!("Invalid artifact URL: {}", url))?;

        for _ in 0..=MAX_REDIRECTS {
            debug!("Fetching {}", uri);
            let request = Request::builder()
                .method(Method::GET)
                .uri(uri.clone())
                .header(USER_AGENT, concat!("dbstrap/", env!("CARGO_PKG_VERSION")))
                .body(Empty::<Bytes>::new())
                .context("Failed to build request")?;

            let response = self
                .client
                .request(request)
                .await
                .with_context(|| format!("Failed to fetch {}", uri))?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .with_context(|| format!("Redirect from {} without a Location header", uri))?;
                uri = resolve_location(&uri, location)?;
                continue;
            }

            if !status.is_success() {
                bail!("Fetching {} returned {}", uri, status);
            }

            let body = response
                .into_body()
                .collect()
                .await
                .with_context(|| format!("Failed to read body of {}", uri))?;
            let data = body.to_bytes().to_vec();
            debug!(
                "Fetched {} ({} bytes, sha256:{})",
                uri,
                data.len(),
                sha256::digest(&data)
            );
            return Ok(data);
        }

        bail!("Too many redirects fetching {}", url)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_inner(url))
                .await
                .map_err(|_| anyhow!("Fetching {} timed out after {:?}", url, limit))?,
            None => self.fetch_inner(url).await,
        }
    }
}

/// Resolve a Location header against the URL that produced it.
fn resolve_location(base: &Uri, location: &str) -> Result<Uri> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return location
            .parse()
            .with_context(|| format!("Invalid redirect target: {}", location));
    }

    // Relative redirect: keep the scheme and authority of the original URL.
    let scheme = base.scheme_str().unwrap_or("https");
    let authority = base
        .authority()
        .map(|authority| authority.as_str())
        .with_context(|| format!("Redirect from a URL without an authority: {}", base))?;
    format!("{}://{}{}", scheme, authority, location)
        .parse()
        .with_context(|| format!("Invalid redirect target: {}", location))
}
