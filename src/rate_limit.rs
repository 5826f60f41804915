//! Client-side request pacing and server rate limit hints.

use async_trait::async_trait;
use http::HeaderMap;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Requests per second allowed by a client's default limiter.
pub const DEFAULT_RATE: f64 = 2.0;

/// Burst size of a client's default limiter.
pub const DEFAULT_BURST: u32 = 1;

const MIN_RATE: f64 = 1e-6;

/// Paces outgoing requests.
///
/// [`HttpTransport`](crate::transport::HttpTransport) acquires once before
/// every attempt, retries included.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Waits until one more request may be sent.
    ///
    /// Dropping the returned future before it completes must not use up
    /// capacity.
    async fn acquire(&self);
}

/// Token bucket limiter.
///
/// The bucket holds up to `burst` tokens and refills at `rate` tokens per
/// second. It starts full. Waiters are served one at a time in arrival order.
///
/// # Examples
///
/// ```
/// use wordpress_client::rate_limit::{RateLimiter, TokenBucket};
///
/// # #[tokio::main]
/// # async fn main() {
/// // Two requests per second, no bursts.
/// let limiter = TokenBucket::new(2.0, 1);
/// limiter.acquire().await;
/// # }
/// ```
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket refilling at `rate` tokens per second.
    ///
    /// A non-positive `rate` is replaced by a very slow one and `burst` is at
    /// least one.
    pub fn new(rate: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            rate: if rate.is_finite() && rate > 0.0 { rate } else { MIN_RATE },
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Refill rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Bucket capacity.
    pub fn burst(&self) -> u32 {
        self.burst as u32
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
        state.last_refill = now;
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn acquire(&self) {
        // Holding the lock across the sleep queues later callers behind us.
        let mut state = self.state.lock().await;
        loop {
            self.refill(&mut state);
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return;
            }

            let wait = Duration::try_from_secs_f64((1.0 - state.tokens) / self.rate)
                .unwrap_or(Duration::MAX);
            tracing::trace!(wait_ms = wait.as_millis(), "Waiting for rate limiter");
            tokio::time::sleep(wait).await;
        }
    }
}

/// Parses a `Retry-After` header, given either as delay-seconds or as an
/// HTTP date.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = httpdate::parse_http_date(value).ok()?;
    Some(at.duration_since(SystemTime::now()).unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use std::sync::Arc;

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("60"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_retry_after_http_date() {
        let mut headers = HeaderMap::new();
        let at = SystemTime::now() + Duration::from_secs(120);
        headers.insert(
            "retry-after",
            HeaderValue::from_str(&httpdate::fmt_http_date(at)).unwrap(),
        );

        let delay = retry_after(&headers).unwrap();
        assert!(delay > Duration::from_secs(100) && delay <= Duration::from_secs(120));
    }

    #[test]
    fn test_retry_after_in_the_past_is_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"),
        );
        assert_eq!(retry_after(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn test_retry_after_missing_or_garbage() {
        assert_eq!(retry_after(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("later"));
        assert_eq!(retry_after(&headers), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_per_second_without_burst() {
        let limiter = TokenBucket::new(2.0, 1);
        let start = Instant::now();

        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(500));

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_available_up_front() {
        let limiter = TokenBucket::new(1.0, 3);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_are_paced() {
        let limiter = Arc::new(TokenBucket::new(2.0, 1));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();

        assert!(times[3].duration_since(start) >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_waiter_keeps_capacity() {
        let limiter = TokenBucket::new(1.0, 1);
        limiter.acquire().await;

        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), limiter.acquire()).await;
        assert!(abandoned.is_err());

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() <= Duration::from_secs(1));
    }
}
