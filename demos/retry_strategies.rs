//! Example demonstrating different retry strategies.
//!
//! This example shows how to:
//! - Turn retries off
//! - Configure exponential backoff and linear retries
//! - Configure a custom delay function
//! - Control which outcomes are retried with a custom predicate
//!
//! Every client points at the site named by `WORDPRESS_ENDPOINT` and uses the
//! `WORDPRESS_USERNAME` and `WORDPRESS_PASSWORD` credentials.
//!
//! Run with: `cargo run --example retry_strategies`

use std::sync::Arc;
use std::time::{Duration, Instant};
use wordpress_client::metadata::RequestMetadata;
use wordpress_client::retry::{Outcome, RetryOnTransient};
use wordpress_client::{
    Client, Config, Context, Error, RetryPolicy, RetryPredicate, RetryStrategy,
};

/// Retries transient failures, and also 404s for the first two attempts to
/// ride out a page cache that has not caught up with a new post yet.
struct RetryStaleCache;

impl RetryPredicate for RetryStaleCache {
    fn should_retry(&self, outcome: &Outcome<'_>, attempt: usize) -> bool {
        match outcome {
            Outcome::Status(status, _) if status.as_u16() == 404 => attempt <= 2,
            _ => RetryOnTransient.should_retry(outcome, attempt),
        }
    }
}

fn client(config: &Config, policy: RetryPolicy) -> Result<Client, Error> {
    Client::builder()
        .config(config.clone())
        .retry_policy(policy)
        .build()
}

async fn fetch(client: &Client, uri: &str) {
    let start = Instant::now();
    match client
        .execute(&Context::background(), RequestMetadata::new("GET", uri), None)
        .await
    {
        Ok(response) => println!("{} after {:?}", response.status, start.elapsed()),
        Err(e) => println!("Failed after {:?}: {}", start.elapsed(), e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing to see retry attempts
    tracing_subscriber::fmt()
        .with_env_filter("wordpress_client=info,retry_strategies=info")
        .init();

    let config = Config::from_env(None)?.with_timeout(Duration::from_secs(5));

    println!("=== No Retry Strategy ===");
    let no_retry = client(&config, RetryPolicy::none())?;
    fetch(&no_retry, "/wp-json/wp/v2/posts/999999").await;
    println!();

    println!("=== Standard Policy ===");
    println!("Exponential backoff from 500ms, honouring Retry-After");
    let standard = client(&config, RetryPolicy::standard(3))?;
    fetch(&standard, "/wp-json/").await;
    println!();

    println!("=== Exponential Backoff Strategy ===");
    println!("Delays: 100ms, 200ms, 400ms (with jitter)");
    let exponential = client(
        &config,
        RetryPolicy::new(
            RetryStrategy::ExponentialBackoff {
                initial_delay: Duration::from_millis(100),
                max_delay: Duration::from_secs(30),
                max_retries: 3,
                jitter: true,
            },
            Arc::new(RetryOnTransient),
        ),
    )?;
    fetch(&exponential, "/wp-json/wp/v2/posts?per_page=1").await;
    println!();

    println!("=== Linear Retry Strategy ===");
    println!("Fixed 500ms delay between attempts, Retry-After capped at 2s");
    let linear = client(
        &config,
        RetryPolicy::new(
            RetryStrategy::Linear {
                delay: Duration::from_millis(500),
                max_retries: 3,
            },
            Arc::new(RetryOnTransient),
        )
        .with_max_wait(Duration::from_secs(2)),
    )?;
    fetch(&linear, "/wp-json/wp/v2/pages?per_page=1").await;
    println!();

    println!("=== Custom Strategy and Predicate ===");
    println!("Custom delay function: attempt 1=100ms, 2=300ms, 3=1000ms; 404 retried twice");
    let custom = client(
        &config,
        RetryPolicy::new(
            RetryStrategy::Custom {
                delay_fn: |attempt| match attempt {
                    1 => Some(Duration::from_millis(100)),
                    2 => Some(Duration::from_millis(300)),
                    3 => Some(Duration::from_millis(1000)),
                    _ => None,
                },
            },
            Arc::new(RetryStaleCache),
        ),
    )?;
    fetch(&custom, "/wp-json/wp/v2/posts/999999").await;

    Ok(())
}
