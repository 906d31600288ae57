//! HTTP client creation and the transport seam used by every fetch.

use encoding_rs::{Encoding, UTF_8};
use reqwest::{cookie::Jar, header};
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::debug;
use url::Url;

use crate::errors::TransportError;
use crate::TARGET_WEB_REQUEST;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("avibase_rosters/", env!("CARGO_PKG_VERSION"));

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    /// Raw `Content-Type` header, when the server sent one.
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Charset label declared in the `Content-Type` header, if any.
    pub fn charset(&self) -> Option<&str> {
        self.content_type.as_deref()?.split(';').find_map(|part| {
            let (name, value) = part.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"'))
        })
    }

    /// Decode the body as text. Uses the declared charset when `encoding_rs`
    /// knows the label, otherwise UTF-8. A byte order mark takes precedence.
    /// Malformed sequences become U+FFFD; the flag reports whether any did.
    pub fn text(&self) -> (Cow<'_, str>, &'static Encoding, bool) {
        let encoding = self
            .charset()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        encoding.decode(&self.body)
    }
}

/// Issues GET requests. Implementations must be shareable across the
/// concurrent synonym batch.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Create the shared client. Built once and reused for every region and
/// synonym request so connections are pooled.
pub fn create_http_client() -> Result<reqwest::Client, TransportError> {
    let cookie_store = Jar::default();
    debug!(target: TARGET_WEB_REQUEST, "Creating HTTP client");

    reqwest::Client::builder()
        .cookie_store(true)
        .cookie_provider(Arc::new(cookie_store))
        .gzip(true)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(|e| TransportError::Client(e.to_string()))
}

/// Production transport backed by a single `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self::with_client(create_http_client()?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        debug!(target: TARGET_WEB_REQUEST, "GET {}", url);

        let request = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
            .send();

        let response = match timeout(self.request_timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                return Err(TransportError::Request {
                    url: url.to_string(),
                    reason: err.to_string(),
                })
            }
            Err(_) => {
                return Err(TransportError::Timeout {
                    url: url.to_string(),
                    seconds: self.request_timeout.as_secs(),
                })
            }
        };

        let status = response.status();
        debug!(target: TARGET_WEB_REQUEST, "Request to {} returned {}", url, status);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Request {
                url: url.to_string(),
                reason: format!("failed to read response body: {}", err),
            })?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body: body.to_vec(),
        })
    }
}
