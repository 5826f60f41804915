//! # wordpress-client - dispatch core for the WordPress REST API
//!
//! A small HTTP client core that talks to a WordPress site over Basic
//! Authentication (typically with an application password). Every request is
//! paced by a client-side rate limiter, transient failures are retried by the
//! transport, and with debug tracing on the full request and response are
//! dumped to a pluggable logger.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use wordpress_client::{Application, Client, Config, Context};
//! use wordpress_client::metadata::RequestMetadata;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wordpress_client::Error> {
//!     let app = Application::new("my-importer", "1.2.0", "ops@example.com")?;
//!     let config = Config::new(Some(app), "https://example.com", "admin", "xxxx xxxx xxxx")?
//!         .with_debug(true);
//!     let client = Client::new(config)?;
//!
//!     let ctx = Context::with_timeout(Duration::from_secs(30));
//!     let response = client
//!         .execute(&ctx, RequestMetadata::new("GET", "/wp-json/wp/v2/posts"), None)
//!         .await?;
//!
//!     println!("{}: {}", response.status, response.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Building blocks
//!
//! - [`Application`] identifies the caller and renders the `User-Agent`.
//! - [`Config`] holds the endpoint, credentials, retry and timeout settings
//!   and the debug [`Logger`]. [`Client::new`] fills in defaults and
//!   validates it before any request can be sent.
//! - [`Client::build_request`] and [`Client::dispatch`] form the request
//!   pipeline, bounded by a per-call [`Context`].
//! - [`transport::Transport`], [`rate_limit::RateLimiter`] and
//!   [`retry::RetryPredicate`] are the pluggable collaborators.
//!
//! ## Errors
//!
//! Every failure is an [`Error`] naming the layer that failed:
//!
//! ```
//! use wordpress_client::{Client, Config, Error};
//!
//! let err = Client::builder().build().unwrap_err();
//! assert!(matches!(err, Error::ConfigRequired));
//!
//! let err = Client::new(Config {
//!     endpoint: "https://example.com".into(),
//!     username: "admin".into(),
//!     ..Config::default()
//! })
//! .unwrap_err();
//! assert!(matches!(err, Error::PasswordRequired));
//! ```

mod application;
mod client;
pub mod config;
mod context;
mod error;
pub mod metadata;
pub mod rate_limit;
mod response;
pub mod retry;
mod trace;
pub mod transport;

pub use application::{Application, ApplicationError, UserAgent};
pub use client::{Client, ClientBuilder};
pub use config::{Config, Logger, StderrLogger, TracingLogger};
pub use context::Context;
pub use error::{Error, Result, TransportError};
pub use reqwest::Body;
pub use response::Response;
pub use retry::{RetryPolicy, RetryPredicate, RetryStrategy};
