use crate::config::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, REQUEST_TIMEOUT_SECS};
use crate::network::errors::NetworkError;
use crate::network::identity::IdentityProfile;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Boxed future returned by [`Pause`]
pub type PauseFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Suspends the fetch loop between attempts
pub trait Pause: Send + Sync {
    fn pause(&self, delay: Duration) -> PauseFuture<'_>;
}

/// Production pause backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPause;

impl Pause for TokioPause {
    fn pause(&self, delay: Duration) -> PauseFuture<'_> {
        Box::pin(tokio::time::sleep(delay))
    }
}

/// Bounded retry with a constant delay between attempts.
///
/// There is no exponential backoff: every wait is exactly `base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, shared by rate-limit responses and network failures
    pub max_attempts: u32,
    /// Wait inserted before each retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

// * Outcome of a single request
enum Attempt {
    Body(String),
    RateLimited,
}

// * HTTP engine for statement pages. Keeps a cookie jar so an authenticated
// * session established by the login flow is reused for every fetch.
pub struct StatementClient {
    inner: Client,
    policy: RetryPolicy,
    pause: Arc<dyn Pause>,
}

impl StatementClient {
    // * Initializes the client with the Chrome 120 identity.
    pub fn new(policy: RetryPolicy) -> Result<Self, NetworkError> {
        let identity = IdentityProfile::generate_chrome_120();

        let client = Client::builder()
            .user_agent(identity.user_agent.as_str())
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            inner: client,
            policy,
            pause: Arc::new(TokioPause),
        })
    }

    // * Replaces the pause used between attempts
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub(crate) fn http(&self) -> &Client {
        &self.inner
    }

    // * Fetches a URL with the client's retry policy.
    pub async fn fetch(&self, url: &str) -> Result<String, NetworkError> {
        self.fetch_with(url, self.policy).await
    }

    // * Fetches a URL, retrying 429s and request failures with a constant delay.
    // * A 429 consumes one of the shared attempts.
    pub async fn fetch_with(&self, url: &str, policy: RetryPolicy) -> Result<String, NetworkError> {
        let attempts = policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.attempt(url).await {
                Ok(Attempt::Body(body)) => {
                    debug!(url, attempt, bytes = body.len(), "Fetched page");
                    return Ok(body);
                }
                Ok(Attempt::RateLimited) => {
                    warn!(
                        url,
                        attempt,
                        "Rate limit hit. Retrying after {} seconds...",
                        policy.base_delay.as_secs_f64()
                    );
                }
                Err(e) => {
                    error!(url, attempt, "Error fetching data: {}", e);
                }
            }

            // * No wait after the final attempt
            if attempt < attempts {
                self.pause.pause(policy.base_delay).await;
            }
        }

        Err(NetworkError::RetriesExhausted {
            url: url.to_string(),
            attempts,
        })
    }

    async fn attempt(&self, url: &str) -> Result<Attempt, NetworkError> {
        let resp = self.inner.get(url).send().await?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Attempt::RateLimited);
        }

        let resp = resp.error_for_status()?;
        Ok(Attempt::Body(resp.text().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_retry_policy_clamps_zero_attempts() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_client_initialization() {
        let client = StatementClient::new(RetryPolicy::default());
        assert!(client.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_pause_waits_full_delay() {
        let start = tokio::time::Instant::now();
        TokioPause.pause(Duration::from_secs(5)).await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
