//! Retry strategies and predicates for handling transient failures.
//!
//! The [`RetryPolicy`] is owned by the transport. The client core never
//! retries by itself.

use crate::rate_limit;
use http::{HeaderMap, StatusCode};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Defines how long to wait between attempts and when to stop.
///
/// # Examples
///
/// ```
/// use wordpress_client::RetryStrategy;
/// use std::time::Duration;
///
/// // Exponential backoff: 100ms, 200ms, 400ms, 800ms...
/// let exponential = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(30),
///     max_retries: 5,
///     jitter: true,
/// };
///
/// // Linear backoff: 1s, 1s, 1s...
/// let linear = RetryStrategy::Linear {
///     delay: Duration::from_secs(1),
///     max_retries: 3,
/// };
/// assert_eq!(linear.delay_for_attempt(4), None);
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Do not retry failed requests.
    #[default]
    None,

    /// Retry with exponentially increasing delays.
    ///
    /// Each retry waits for `initial_delay * 2^(attempt - 1)` (capped at
    /// `max_delay`). Jitter scales the delay by a random factor in `0.5..=1.0`.
    ExponentialBackoff {
        /// The initial delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// The maximum number of retry attempts.
        max_retries: usize,
        /// Whether to add random jitter to delays.
        jitter: bool,
    },

    /// Retry with a fixed delay between attempts.
    Linear {
        /// The delay between retry attempts.
        delay: Duration,
        /// The maximum number of retry attempts.
        max_retries: usize,
    },

    /// Custom retry logic.
    Custom {
        /// Takes the attempt number that just failed (1-indexed) and returns
        /// the delay before the next one, or `None` to stop.
        delay_fn: fn(attempt: usize) -> Option<Duration>,
    },
}

impl RetryStrategy {
    /// Returns the delay after the given failed attempt, or `None` if retries
    /// are exhausted.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt > *max_retries {
                    return None;
                }

                let exponent = attempt.saturating_sub(1).min(31) as u32;
                let delay = initial_delay
                    .saturating_mul(2u32.saturating_pow(exponent))
                    .min(*max_delay);

                if *jitter {
                    let factor = rand::thread_rng().gen_range(0.5..=1.0);
                    Some(delay.mul_f64(factor))
                } else {
                    Some(delay)
                }
            }
            RetryStrategy::Linear { delay, max_retries } => {
                (attempt <= *max_retries).then_some(*delay)
            }
            RetryStrategy::Custom { delay_fn } => delay_fn(attempt),
        }
    }

    /// Returns the maximum number of retries, if known.
    pub fn max_retries(&self) -> Option<usize> {
        match self {
            RetryStrategy::None => Some(0),
            RetryStrategy::ExponentialBackoff { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Linear { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Custom { .. } => None,
        }
    }
}

/// What a single attempt produced.
#[derive(Debug)]
pub enum Outcome<'a> {
    /// The server answered.
    Status(StatusCode, &'a HeaderMap),
    /// The attempt failed before a response arrived.
    Failed(&'a reqwest::Error),
}

/// Decides whether an attempt should be retried.
///
/// # Examples
///
/// ```
/// use wordpress_client::retry::{Outcome, RetryPredicate};
///
/// struct RetryOnRateLimit;
///
/// impl RetryPredicate for RetryOnRateLimit {
///     fn should_retry(&self, outcome: &Outcome<'_>, _attempt: usize) -> bool {
///         matches!(outcome, Outcome::Status(status, _) if status.as_u16() == 429)
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the attempt numbered `attempt` (1-indexed) should be
    /// retried.
    fn should_retry(&self, outcome: &Outcome<'_>, attempt: usize) -> bool;
}

/// Retries rate limiting, gateway and availability failures, and connection
/// or timeout errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTransient;

impl RetryPredicate for RetryOnTransient {
    fn should_retry(&self, outcome: &Outcome<'_>, _attempt: usize) -> bool {
        match outcome {
            Outcome::Status(status, _) => matches!(
                *status,
                StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::INTERNAL_SERVER_ERROR
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
            Outcome::Failed(error) => error.is_connect() || error.is_timeout(),
        }
    }
}

/// A retry strategy paired with the predicate that triggers it.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Delays between attempts.
    pub strategy: RetryStrategy,

    /// Which outcomes are retried.
    pub predicate: Arc<dyn RetryPredicate>,

    /// Upper bound on a server requested `Retry-After` wait.
    pub max_wait: Duration,
}

impl RetryPolicy {
    /// Default cap for `Retry-After` waits.
    pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60);

    /// Creates a policy from a strategy and predicate.
    pub fn new(strategy: RetryStrategy, predicate: Arc<dyn RetryPredicate>) -> Self {
        Self {
            strategy,
            predicate,
            max_wait: Self::DEFAULT_MAX_WAIT,
        }
    }

    /// The policy used by default: transient failures are retried up to
    /// `max_retries` times with jittered exponential backoff from 500ms to 30s.
    pub fn standard(max_retries: usize) -> Self {
        Self::new(
            RetryStrategy::ExponentialBackoff {
                initial_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(30),
                max_retries,
                jitter: true,
            },
            Arc::new(RetryOnTransient),
        )
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(RetryStrategy::None, Arc::new(RetryOnTransient))
    }

    /// Caps `Retry-After` waits at `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Returns `true` if `outcome` should be retried.
    pub fn should_retry(&self, outcome: &Outcome<'_>, attempt: usize) -> bool {
        self.predicate.should_retry(outcome, attempt)
    }

    /// Returns the wait before the next attempt, or `None` when the strategy
    /// is exhausted. A server `Retry-After` in `headers` takes precedence over
    /// the strategy's delay.
    pub fn delay(&self, attempt: usize, headers: Option<&HeaderMap>) -> Option<Duration> {
        let fallback = self.strategy.delay_for_attempt(attempt)?;

        Some(
            headers
                .and_then(rate_limit::retry_after)
                .map_or(fallback, |wait| wait.min(self.max_wait)),
        )
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("strategy", &self.strategy)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}
