//! The rate-limited, retrying HTTP transport behind a [`Client`](crate::Client).

use crate::rate_limit::RateLimiter;
use crate::retry::{Outcome, RetryPolicy};
use crate::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Sends a built request and returns the raw response.
///
/// Implementations own pacing and retries. The client only wraps their
/// errors, so a custom transport (for instance a fake in tests) fully decides
/// what a dispatch sees.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use wordpress_client::transport::Transport;
/// use wordpress_client::TransportError;
///
/// struct AlwaysOk;
///
/// #[async_trait]
/// impl Transport for AlwaysOk {
///     async fn execute(
///         &self,
///         _request: reqwest::Request,
///     ) -> Result<reqwest::Response, TransportError> {
///         Ok(http::Response::new("ok").into())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request`, retrying as the transport sees fit.
    async fn execute(&self, request: reqwest::Request)
        -> Result<reqwest::Response, TransportError>;
}

/// A [`Transport`] on top of `reqwest` with client-side pacing and retries.
///
/// Every attempt first acquires a token from the rate limiter. Outcomes are
/// classified by the retry policy; a retried response is drained so its
/// connection can be reused. Requests whose body cannot be cloned (streams)
/// are sent exactly once.
pub struct HttpTransport {
    http: reqwest::Client,
    limiter: Arc<dyn RateLimiter>,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Creates a transport sending `user_agent` by default and giving up on a
    /// single attempt after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Setup`] if the HTTP client cannot be built.
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        limiter: Arc<dyn RateLimiter>,
        retry: RetryPolicy,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(TransportError::Setup)?;

        Ok(Self {
            http,
            limiter,
            retry,
        })
    }

    /// The retry policy applied to each request.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, TransportError> {
        let mut request = request;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let next = request.try_clone();
            let method = request.method().clone();
            let url = request.url().clone();

            self.limiter.acquire().await;

            tracing::debug!(
                method = %method,
                url = %url,
                attempt = attempt,
                "Sending HTTP request"
            );

            let result = self.http.execute(request).await;

            let Some(next) = next else {
                return result.map_err(TransportError::Network);
            };

            let delay = match &result {
                Ok(response) => {
                    let outcome = Outcome::Status(response.status(), response.headers());
                    if !self.retry.should_retry(&outcome, attempt) {
                        return result.map_err(TransportError::Network);
                    }
                    self.retry.delay(attempt, Some(response.headers()))
                }
                Err(error) => {
                    if !self.retry.should_retry(&Outcome::Failed(error), attempt) {
                        return result.map_err(TransportError::Network);
                    }
                    self.retry.delay(attempt, None)
                }
            };

            let Some(delay) = delay else {
                return match result {
                    Ok(response) => {
                        tracing::warn!(
                            status = response.status().as_u16(),
                            attempts = attempt,
                            "Retries exhausted, returning last response"
                        );
                        Ok(response)
                    }
                    Err(source) => Err(TransportError::RetriesExhausted {
                        attempts: attempt,
                        source,
                    }),
                };
            };

            match result {
                Ok(response) => {
                    tracing::warn!(
                        status = response.status().as_u16(),
                        attempt = attempt,
                        method = %method,
                        url = %url,
                        "Request failed"
                    );
                    if let Err(error) = drain_response_body(response).await {
                        tracing::warn!(error = %error, "Failed to drain response body");
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        attempt = attempt,
                        method = %method,
                        url = %url,
                        "Request failed"
                    );
                }
            }

            tracing::info!(
                delay_ms = delay.as_millis(),
                attempt = attempt,
                "Retrying request after delay"
            );
            tokio::time::sleep(delay).await;
            request = next;
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Reads and discards whatever is left of `response`'s body.
pub async fn drain_response_body(mut response: reqwest::Response) -> Result<(), reqwest::Error> {
    while response.chunk().await?.is_some() {}
    Ok(())
}
