use crate::config::FeedSource;
use crate::feed::error::FeedError;
use crate::feed::json_feed::JsonFeed;
use crate::feed::parser::parse_bytes;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use thiserror::Error;

const MAX_RETRIES: u32 = 3;
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while retrieving and normalizing a feed.
///
/// Transport failures (network, HTTP status, size limits) are reported
/// as-is; a document that arrives intact but fails normalization is
/// wrapped in [`FetchError::Feed`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The document was retrieved but is not a valid feed
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Raw bytes of a retrieved document and the media type the server declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Limits applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    /// Retries after a 429, a 5xx or a truncated body.
    pub max_retries: u32,
    /// Backoff before retry `n` is `base_delay * 2^n`.
    pub base_delay: Duration,
    pub timeout: Duration,
    pub max_size: usize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_secs(1),
            timeout: REQUEST_TIMEOUT,
            max_size: MAX_FEED_SIZE,
        }
    }
}

/// Outcome of one source in [`fetch_all`].
#[derive(Debug)]
pub struct FetchResult {
    pub source: FeedSource,
    pub result: Result<JsonFeed, FetchError>,
}

/// Fetches a URL with the default policy (30s timeout, 10MB cap, 3 retries
/// backing off 1s, 2s, 4s).
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection or TLS errors
/// - [`FetchError::Timeout`] - Request exceeded the timeout
/// - [`FetchError::HttpStatus`] - Non-2xx response (5xx only after retries)
/// - [`FetchError::RateLimited`] - 429 response after max retries
/// - [`FetchError::ResponseTooLarge`] - Body exceeded the size cap
/// - [`FetchError::IncompleteResponse`] - Body truncated after max retries
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Fetched, FetchError> {
    fetch_with_policy(client, url, &FetchPolicy::default()).await
}

/// Same as [`fetch`] with explicit limits.
///
/// # Errors
///
/// See [`fetch`].
pub async fn fetch_with_policy(
    client: &reqwest::Client,
    url: &str,
    policy: &FetchPolicy,
) -> Result<Fetched, FetchError> {
    let mut retry_count = 0;

    loop {
        let response = tokio::time::timeout(policy.timeout, client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;
        let status = response.status();

        // EDGE-004: Handle rate limiting with exponential backoff
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if retry_count >= policy.max_retries {
                return Err(FetchError::RateLimited(policy.max_retries));
            }
            let delay = backoff(policy, retry_count);
            tracing::warn!(
                feed = %url,
                retry = retry_count,
                delay_ms = delay.as_millis() as u64,
                "Rate limited, backing off"
            );
            tokio::time::sleep(delay).await;
            retry_count += 1;
            continue;
        }

        if status.is_server_error() {
            if retry_count >= policy.max_retries {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }
            let delay = backoff(policy, retry_count);
            tracing::warn!(
                feed = %url,
                status = %status,
                retry = retry_count,
                delay_ms = delay.as_millis() as u64,
                "Server error, retrying after delay"
            );
            tokio::time::sleep(delay).await;
            retry_count += 1;
            continue;
        }

        // EDGE-002: 4xx and other non-success statuses fail immediately
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match read_limited_bytes(response, policy.max_size).await {
            Ok(bytes) => {
                tracing::debug!(
                    feed = %url,
                    bytes = bytes.len(),
                    content_type = content_type.as_deref().unwrap_or(""),
                    "Fetched feed"
                );
                return Ok(Fetched {
                    bytes,
                    content_type,
                });
            }
            Err(FetchError::IncompleteResponse { expected, received }) => {
                // EDGE-005: Retry truncated downloads with the same backoff
                if retry_count >= policy.max_retries {
                    return Err(FetchError::IncompleteResponse { expected, received });
                }
                let delay = backoff(policy, retry_count);
                tracing::debug!(
                    feed = %url,
                    expected = expected,
                    received = received,
                    attempt = retry_count + 1,
                    "Retrying incomplete download"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fetches and normalizes every source, at most `concurrency` at a time.
///
/// Results are returned in the order of `sources`, whatever order the
/// requests complete in.
pub async fn fetch_all(
    client: &reqwest::Client,
    sources: &[FeedSource],
    concurrency: usize,
) -> Vec<FetchResult> {
    fetch_all_with_policy(client, sources, concurrency, FetchPolicy::default()).await
}

/// Same as [`fetch_all`] with explicit limits.
pub async fn fetch_all_with_policy(
    client: &reqwest::Client,
    sources: &[FeedSource],
    concurrency: usize,
    policy: FetchPolicy,
) -> Vec<FetchResult> {
    let mut results: Vec<(usize, FetchResult)> = stream::iter(sources.iter().cloned().enumerate())
        .map(|(index, source)| {
            let client = client.clone();
            async move {
                let result = fetch_source(&client, &source, &policy).await;
                (index, FetchResult { source, result })
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

async fn fetch_source(
    client: &reqwest::Client,
    source: &FeedSource,
    policy: &FetchPolicy,
) -> Result<JsonFeed, FetchError> {
    let fetched = fetch_with_policy(client, &source.resource, policy).await?;
    // A configured content type overrides whatever the server declared
    let content_type = source
        .content_type
        .as_deref()
        .or(fetched.content_type.as_deref());
    Ok(parse_bytes(&fetched.bytes, content_type)?)
}

fn backoff(policy: &FetchPolicy, retry_count: u32) -> Duration {
    policy.base_delay.saturating_mul(2u32.saturating_pow(retry_count))
}

/// Reads a response body, failing once it exceeds `limit` bytes.
///
/// # Errors
///
/// [`FetchError::ResponseTooLarge`] if the declared or streamed size
/// exceeds `limit`; [`FetchError::IncompleteResponse`] if fewer bytes than
/// `Content-Length` arrived.
pub async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // EDGE-005: Network interruptions can end the stream early
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test</title><link>https://example.com/</link><description>d</description>
    <item><guid>1</guid><title>Test</title></item>
</channel></rss>"#;

    const VALID_JSON: &str = r#"{"title":"Json","items":[{"id":"a"}]}"#;

    fn fast_policy() -> FetchPolicy {
        FetchPolicy {
            base_delay: Duration::from_millis(10),
            ..FetchPolicy::default()
        }
    }

    fn source(server: &MockServer, route: &str) -> FeedSource {
        FeedSource::new(format!("{}{}", server.uri(), route))
    }

    #[tokio::test]
    async fn test_fetch_success_keeps_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(VALID_RSS, "application/rss+xml"),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let fetched = fetch(&client, &format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(fetched.bytes, VALID_RSS.as_bytes());
        assert_eq!(fetched.content_type.as_deref(), Some("application/rss+xml"));
    }

    #[tokio::test]
    async fn test_fetch_404_fails_without_retry() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch_with_policy(&client, &mock_server.uri(), &fast_policy())
            .await
            .unwrap_err();
        match err {
            FetchError::HttpStatus(404) => {}
            e => panic!("Expected HttpStatus(404), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_500_retries_then_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4) // Initial request + 3 retries
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch_with_policy(&client, &mock_server.uri(), &fast_policy())
            .await
            .unwrap_err();
        match err {
            FetchError::HttpStatus(500) => {}
            e => panic!("Expected HttpStatus(500), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_503_retry_then_success() {
        let mock_server = MockServer::start().await;

        // First two requests return 503, third succeeds
        Mock::given(any())
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let fetched = fetch_with_policy(&client, &mock_server.uri(), &fast_policy())
            .await
            .unwrap();
        assert_eq!(fetched.bytes, VALID_RSS.as_bytes());
    }

    #[tokio::test]
    async fn test_fetch_429_gives_up_after_max_retries() {
        let mock_server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(429))
            .expect(4)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch_with_policy(&client, &mock_server.uri(), &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::RateLimited(3)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let mock_server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(100)))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let policy = FetchPolicy {
            max_size: 10,
            ..fast_policy()
        };
        let err = fetch_with_policy(&client, &mock_server.uri(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ResponseTooLarge));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(any())
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let policy = FetchPolicy {
            timeout: Duration::from_millis(50),
            ..fast_policy()
        };
        let err = fetch_with_policy(&client, &mock_server.uri(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_input_order() {
        let mock_server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;
        Mock::given(path("/fast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(VALID_JSON, "application/feed+json"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let sources = vec![
            source(&mock_server, "/slow"),
            source(&mock_server, "/missing"),
            source(&mock_server, "/fast"),
        ];
        let client = reqwest::Client::new();
        let results = fetch_all_with_policy(&client, &sources, 3, fast_policy()).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].source, sources[0]);
        assert_eq!(results[0].result.as_ref().unwrap().title, "Test");
        assert!(matches!(results[1].result, Err(FetchError::HttpStatus(404))));
        assert_eq!(results[2].result.as_ref().unwrap().title, "Json");
    }

    #[tokio::test]
    async fn test_fetch_all_reports_invalid_feed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let results =
            fetch_all_with_policy(&client, &[source(&mock_server, "/")], 1, fast_policy()).await;
        match &results[0].result {
            Err(FetchError::Feed(FeedError::Xml(_))) => {}
            other => panic!("Expected Feed(Xml) error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_configured_content_type_overrides_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_JSON)
                    .insert_header("Content-Type", "text/plain"),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let mut json_source = source(&mock_server, "/feed.json");
        json_source.content_type = Some("application/json".into());
        let results = fetch_all_with_policy(&client, &[json_source], 1, fast_policy()).await;
        assert_eq!(results[0].result.as_ref().unwrap().items[0].id, "a");
    }
}
