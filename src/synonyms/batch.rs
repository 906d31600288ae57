//! Bounded-concurrency execution of synonym lookups.

use futures::stream::{self, StreamExt};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use url::Url;

use super::types::{
    SynonymOutcome, SynonymRequest, SynonymResponse, ALLOWED_ERROR_PROPORTION, MAX_ATTEMPTS,
    MAX_CONCURRENT_REQUESTS, RETRY_DELAY,
};
use crate::client::Transport;
use crate::errors::BatchFailure;
use crate::TARGET_WEB_REQUEST;

/// Runs a whole batch of lookups over a shared transport.
///
/// Individual failures are tolerated up to `allowed_error_proportion` of the
/// batch; beyond that the batch as a whole fails.
pub struct BatchResolver<'a, T> {
    transport: &'a T,
    max_concurrent_requests: usize,
    allowed_error_proportion: f64,
    max_attempts: usize,
    retry_delay: Duration,
    indent: usize,
}

impl<'a, T: Transport> BatchResolver<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
            allowed_error_proportion: ALLOWED_ERROR_PROPORTION,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
            indent: 0,
        }
    }

    pub fn with_concurrency(mut self, max_concurrent_requests: usize) -> Self {
        self.max_concurrent_requests = max_concurrent_requests.max(1);
        self
    }

    pub fn with_allowed_error_proportion(mut self, proportion: f64) -> Self {
        self.allowed_error_proportion = proportion;
        self
    }

    pub fn with_retry(mut self, max_attempts: usize, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Execute every request. Responses come back in request order.
    pub async fn resolve(
        &self,
        requests: Vec<SynonymRequest>,
    ) -> Result<Vec<SynonymResponse>, BatchFailure> {
        let total = requests.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let pad = "  ".repeat(self.indent);
        info!(
            target: TARGET_WEB_REQUEST,
            "{}Resolving {} synonym requests, {} at a time",
            pad,
            total,
            self.max_concurrent_requests
        );

        let mut indexed: Vec<(usize, SynonymResponse)> =
            stream::iter(requests.into_iter().enumerate())
                .map(move |(index, request)| async move {
                    let outcome = self.fetch(&request.url).await;
                    (index, SynonymResponse { request, outcome })
                })
                .buffer_unordered(self.max_concurrent_requests)
                .collect()
                .await;
        indexed.sort_by_key(|(index, _)| *index);
        let responses: Vec<SynonymResponse> =
            indexed.into_iter().map(|(_, response)| response).collect();

        let failed = responses.iter().filter(|r| r.outcome.is_failed()).count();
        let proportion = failed as f64 / total as f64;

        if proportion > self.allowed_error_proportion {
            let last_error = responses
                .iter()
                .rev()
                .find_map(|r| r.outcome.failure())
                .map(str::to_string);
            error!(
                target: TARGET_WEB_REQUEST,
                "{}{} of {} synonym requests failed", pad, failed, total
            );
            return Err(BatchFailure {
                failed,
                total,
                allowed: self.allowed_error_proportion,
                last_error,
            });
        }

        if failed > 0 {
            warn!(
                target: TARGET_WEB_REQUEST,
                "{}{} of {} synonym requests failed, within tolerance", pad, failed, total
            );
        } else {
            info!(target: TARGET_WEB_REQUEST, "{}All {} synonym requests succeeded", pad, total);
        }

        Ok(responses)
    }

    async fn fetch(&self, url: &Url) -> SynonymOutcome {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.transport.get(url).await {
                Ok(response) if response.is_success() => {
                    return SynonymOutcome::Fetched(response.text().0.into_owned());
                }
                Ok(response) => {
                    last_error = format!("{} {}", response.status, response.status_text);
                }
                Err(err) => {
                    last_error = err.to_string();
                }
            }

            if attempt < self.max_attempts {
                debug!(
                    target: TARGET_WEB_REQUEST,
                    "Attempt {} for {} failed ({}), retrying in {:?}",
                    attempt,
                    url,
                    last_error,
                    self.retry_delay
                );
                sleep(self.retry_delay).await;
            }
        }

        debug!(target: TARGET_WEB_REQUEST, "Giving up on {}: {}", url, last_error);
        SynonymOutcome::Failed(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::AvibaseEntry;
    use crate::client::HttpResponse;
    use crate::errors::TransportError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Echoes the path for every request except the listed ids, which fail
    /// the given number of times, or always when `None`.
    struct FlakyTransport {
        failing: HashMap<String, Option<usize>>,
        attempts: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl FlakyTransport {
        fn new(failing: &[(&str, Option<usize>)]) -> Self {
            Self {
                failing: failing
                    .iter()
                    .map(|(id, n)| (id.to_string(), *n))
                    .collect(),
                attempts: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }
    }

    impl Transport for FlakyTransport {
        async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let id = url.path().trim_start_matches('/').to_string();
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                let count = attempts.entry(id.clone()).or_insert(0);
                *count += 1;
                *count
            };

            match self.failing.get(&id) {
                Some(None) => Err(TransportError::Request {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                }),
                Some(Some(n)) if attempt <= *n => Ok(HttpResponse {
                    status: 503,
                    status_text: "Service Unavailable".to_string(),
                    content_type: None,
                    body: Vec::new(),
                }),
                _ => Ok(HttpResponse {
                    status: 200,
                    status_text: "OK".to_string(),
                    content_type: Some("text/html; charset=utf-8".to_string()),
                    body: id.into_bytes(),
                }),
            }
        }
    }

    fn requests(count: usize) -> Vec<SynonymRequest> {
        (0..count)
            .map(|i| {
                let id = format!("{:08X}", i);
                SynonymRequest {
                    url: Url::parse(&format!("http://synonyms.test/{id}")).unwrap(),
                    entry: AvibaseEntry {
                        english_name: format!("Bird {i}"),
                        latin_name: format!("Avis {i}"),
                        avibase_id: id,
                    },
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let transport = FlakyTransport::new(&[]);
        let responses = BatchResolver::new(&transport).resolve(Vec::new()).await.unwrap();
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_responses_follow_request_order_and_concurrency_is_bounded() {
        let transport = FlakyTransport::new(&[]);
        let input = requests(40);
        let responses = BatchResolver::new(&transport)
            .resolve(input.clone())
            .await
            .unwrap();

        let returned: Vec<&SynonymRequest> = responses.iter().map(|r| &r.request).collect();
        let expected: Vec<&SynonymRequest> = input.iter().collect();
        assert_eq!(returned, expected);
        assert!(transport.peak_in_flight.load(Ordering::SeqCst) <= MAX_CONCURRENT_REQUESTS);
        assert_eq!(
            responses[3].outcome,
            SynonymOutcome::Fetched("00000003".to_string())
        );
    }

    #[tokio::test]
    async fn test_failures_within_budget_are_marked() {
        let transport = FlakyTransport::new(&[("00000007", None)]);
        let responses = BatchResolver::new(&transport)
            .with_retry(2, Duration::ZERO)
            .resolve(requests(100))
            .await
            .unwrap();

        assert_eq!(responses.len(), 100);
        let failed: Vec<&str> = responses
            .iter()
            .filter(|r| r.outcome.is_failed())
            .map(|r| r.request.avibase_id())
            .collect();
        assert_eq!(failed, vec!["00000007"]);
        assert_eq!(transport.attempts.lock().unwrap()["00000007"], 2);
    }

    #[tokio::test]
    async fn test_failures_over_budget_fail_the_batch() {
        let transport = FlakyTransport::new(&[("00000001", None), ("00000002", None)]);
        let err = BatchResolver::new(&transport)
            .with_retry(1, Duration::ZERO)
            .resolve(requests(100))
            .await
            .unwrap_err();

        assert_eq!(err.failed, 2);
        assert_eq!(err.total, 100);
        assert!(err.last_error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_retry_recovers_transient_status() {
        let transport = FlakyTransport::new(&[("00000000", Some(2))]);
        let responses = BatchResolver::new(&transport)
            .with_retry(3, Duration::ZERO)
            .resolve(requests(1))
            .await
            .unwrap();

        assert_eq!(
            responses[0].outcome,
            SynonymOutcome::Fetched("00000000".to_string())
        );
        assert_eq!(transport.attempts.lock().unwrap()["00000000"], 3);
    }

    #[tokio::test]
    async fn test_custom_concurrency_and_budget() {
        let transport = FlakyTransport::new(&[("00000004", None)]);
        let err = BatchResolver::new(&transport)
            .with_concurrency(2)
            .with_allowed_error_proportion(0.0)
            .with_retry(1, Duration::ZERO)
            .resolve(requests(20))
            .await
            .unwrap_err();

        assert_eq!(err.failed, 1);
        assert_eq!(err.allowed, 0.0);
        assert!(transport.peak_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_status_failure_reason() {
        let transport = FlakyTransport::new(&[("00000000", Some(usize::MAX))]);
        let err = BatchResolver::new(&transport)
            .with_retry(1, Duration::ZERO)
            .resolve(requests(1))
            .await
            .unwrap_err();

        assert_eq!(err.last_error.as_deref(), Some("503 Service Unavailable"));
    }
}
