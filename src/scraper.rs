use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::utils::error::{AppError, Result};

/// Upper bound for one page fetch, including the body download.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Raw answer from the remote server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// How a fetch that reached the server turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx with a non-blank body.
    Page(String),
    /// Any non-2xx status.
    HttpStatus { status: u16, status_text: String },
    /// 2xx but the body was empty or whitespace.
    EmptyBody,
}

/// One GET request. Implementations must abort the in-flight request once
/// `cancel` fires rather than letting it run to completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn fetch(&self, url: &Url, headers: &HeaderMap, cancel: &CancellationToken) -> Result<FetchedPage>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn fetch(&self, url: &Url, headers: &HeaderMap, cancel: &CancellationToken) -> Result<FetchedPage> {
        let request = async {
            let response = self
                .client
                .get(url.clone())
                .headers(headers.clone())
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;

            Ok::<_, AppError>(FetchedPage {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            })
        };

        // Dropping `request` on cancellation tears down the connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Transport(format!("request to {url} was cancelled"))),
            page = request => page,
        }
    }
}

/// Headers that make the request look like an ordinary desktop browser.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

pub struct PageFetcher {
    transport: Arc<dyn HttpTransport>,
    headers: HeaderMap,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            headers: browser_headers(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches `url` once. Transport failures and the deadline surface as
    /// `Err`; anything the server actually answered is a [`FetchOutcome`].
    pub async fn fetch(&self, url: &Url) -> Result<FetchOutcome> {
        let cancel = CancellationToken::new();
        let deadline = {
            let cancel = cancel.clone();
            let timeout = self.timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                cancel.cancel();
            })
        };

        let result = self.transport.fetch(url, &self.headers, &cancel).await;
        deadline.abort();

        let page = match result {
            Ok(page) => page,
            Err(e) if cancel.is_cancelled() => {
                tracing::warn!(url = %url, timeout_ms = self.timeout.as_millis() as u64, error = %e, "Page fetch aborted by deadline");
                return Err(AppError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                });
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(url = %url, status = page.status, bytes = page.body.len(), "Page fetched");
        Ok(classify(page))
    }
}

fn classify(page: FetchedPage) -> FetchOutcome {
    if !page.is_success() {
        return FetchOutcome::HttpStatus {
            status: page.status,
            status_text: page.status_text,
        };
    }

    if page.body.trim().is_empty() {
        return FetchOutcome::EmptyBody;
    }

    FetchOutcome::Page(page.body)
}
