//! The request dispatch pipeline.
//!
//! A [`Client`] turns a [`RequestMetadata`] into an authenticated request
//! ([`Client::build_request`]) and sends it through its rate-limited, retrying
//! transport ([`Client::dispatch`]), returning a fully buffered [`Response`].

use crate::{
    metadata::RequestMetadata,
    rate_limit::{RateLimiter, TokenBucket, DEFAULT_BURST, DEFAULT_RATE},
    retry::RetryPolicy,
    trace,
    transport::{HttpTransport, Transport},
    Config, Context, Error, Logger, Response, Result,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Body, Method};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// A client for the WordPress REST API.
///
/// Cloning is cheap and clones share the transport, and with it the rate
/// limiter.
///
/// # Examples
///
/// ```no_run
/// use wordpress_client::{Application, Client, Config, Context};
/// use wordpress_client::metadata::RequestMetadata;
///
/// # async fn example() -> Result<(), wordpress_client::Error> {
/// let app = Application::new("my-app", "1.0.0", "ops@example.com")?;
/// let config = Config::new(Some(app), "https://example.com", "admin", "app password")?;
/// let client = Client::new(config)?;
///
/// let ctx = Context::background();
/// let metadata = RequestMetadata::new("GET", "/wp-json/wp/v2/posts");
/// let request = client.build_request(&ctx, metadata, None)?;
/// let response = client.dispatch(&ctx, request).await?;
/// println!("{} {}", response.status, response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    config: Config,
    endpoint: Url,
    user_agent: String,
    authorization: HeaderValue,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client with the default transport.
    ///
    /// The config is defaulted with [`Config::with_defaults`] and validated.
    ///
    /// # Errors
    ///
    /// Returns the first failing check of [`Config::validate`].
    pub fn new(config: Config) -> Result<Self> {
        ClientBuilder::new().config(config).build()
    }

    /// The defaulted, validated config this client was built from.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The `User-Agent` sent when a request does not set one.
    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }

    fn logger(&self) -> Option<&dyn Logger> {
        if !self.inner.config.debug {
            return None;
        }
        self.inner.config.logger.as_deref()
    }

    /// Builds an authenticated request.
    ///
    /// The URI may be absolute or a path under the endpoint. Headers from
    /// `metadata` are applied in order. `User-Agent` is added unless
    /// `metadata` sets it. A Basic `Authorization` is added the same way, but
    /// only for URLs on the endpoint's origin. With debug on, the finished
    /// request is dumped to the logger.
    ///
    /// # Errors
    ///
    /// Returns the context error if `ctx` is already done, or
    /// [`Error::InvalidMethod`], [`Error::InvalidUrl`] or
    /// [`Error::InvalidHeader`] for malformed input.
    pub fn build_request(
        &self,
        ctx: &Context,
        metadata: RequestMetadata,
        body: Option<Body>,
    ) -> Result<reqwest::Request> {
        ctx.check()?;

        let method = Method::from_bytes(metadata.method.as_bytes())
            .map_err(|_| Error::InvalidMethod(metadata.method.clone()))?;
        let url = self.resolve(&metadata.uri)?;

        let mut request = reqwest::Request::new(method, url.clone());
        let headers = request.headers_mut();

        for (name, value) in &metadata.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("{:?}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.insert(name, value);
        }

        if !headers.contains_key(USER_AGENT) {
            let value = HeaderValue::from_str(&self.inner.user_agent)
                .map_err(|e| Error::InvalidHeader(format!("{}: {}", USER_AGENT, e)))?;
            headers.insert(USER_AGENT, value);
        }

        if !headers.contains_key(AUTHORIZATION) && self.is_endpoint_origin(&url) {
            headers.insert(AUTHORIZATION, self.inner.authorization.clone());
        }

        *request.body_mut() = body;

        if let Some(logger) = self.logger() {
            logger.log(format_args!("\n{}", trace::dump_request(&request)));
        }

        Ok(request)
    }

    /// Sends `request` and reads the whole response.
    ///
    /// Pacing and retries are left to the transport. Waiting for the rate
    /// limiter, the round trip and reading the body all give up as soon as
    /// `ctx` is cancelled or expires. The body is always read to the end, or
    /// dropped with the connection when reading is abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when no response was obtained,
    /// [`Error::ReadBody`] when the body could not be read, or
    /// [`Error::Cancelled`] / [`Error::DeadlineExceeded`] from `ctx`.
    pub async fn dispatch(&self, ctx: &Context, request: reqwest::Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();

        if let Some(logger) = self.logger() {
            logger.log(format_args!("request: {} {}", method, url));
        }

        tracing::debug!(method = %method, url = %url, "Dispatching request");

        let start = Instant::now();
        let raw = ctx.run(self.inner.transport.execute(request)).await??;

        let status = raw.status();
        let version = raw.version();
        let header = raw.headers().clone();

        let body = ctx.run(raw.bytes()).await?.map_err(|e| {
            tracing::warn!(error = %e, method = %method, url = %url, "Failed to read response body");
            Error::ReadBody(e)
        })?;

        tracing::info!(
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis(),
            method = %method,
            url = %url,
            "Received HTTP response"
        );

        if let Some(logger) = self.logger() {
            logger.log(format_args!(
                "\n{}",
                trace::dump_response(version, status, &header, &body)
            ));
        }

        Ok(Response::new(header, body, status))
    }

    /// Builds and dispatches a request in one call.
    pub async fn execute(
        &self,
        ctx: &Context,
        metadata: RequestMetadata,
        body: Option<Body>,
    ) -> Result<Response> {
        let request = self.build_request(ctx, metadata, body)?;
        self.dispatch(ctx, request).await
    }

    /// Absolute URIs pass through. Anything else is appended to the endpoint
    /// path, so `/wp-json/...` stays under a WordPress installed in a
    /// subdirectory.
    fn resolve(&self, uri: &str) -> Result<Url> {
        match Url::parse(uri) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(self.inner.endpoint.join(uri.trim_start_matches('/'))?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn is_endpoint_origin(&self, url: &Url) -> bool {
        url.origin() == self.inner.endpoint.origin()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("user_agent", &self.inner.user_agent)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// A config is required. Without a custom transport, the client uses an
/// [`HttpTransport`] pacing requests at 2 per second with no bursts and
/// retrying transient failures up to the config's `max_retries`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wordpress_client::{Application, Client, Config, RetryPolicy};
/// use wordpress_client::rate_limit::TokenBucket;
///
/// # fn example() -> Result<(), wordpress_client::Error> {
/// let app = Application::new("importer", "2.1.0", "https://importer.example")?;
/// let config = Config::new(Some(app), "https://example.com", "admin", "secret")?;
///
/// let client = Client::builder()
///     .config(config)
///     .rate_limiter(Arc::new(TokenBucket::new(5.0, 2)))
///     .retry_policy(RetryPolicy::none())
///     .build()?;
/// assert_eq!(client.user_agent(), "importer/2.1.0 (https://importer.example)");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<Config>,
    transport: Option<Arc<dyn Transport>>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    retry_policy: Option<RetryPolicy>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the default HTTP transport. The rate limiter and retry policy
    /// set on this builder are then unused.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the default 2 requests per second limiter.
    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Replaces the default retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Defaults and validates the config and builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigRequired`] without a config, the first failing
    /// check of [`Config::validate`], or [`Error::Transport`] if the default
    /// transport cannot be set up.
    pub fn build(self) -> Result<Client> {
        let config = self.config.ok_or(Error::ConfigRequired)?.with_defaults();
        let mut endpoint = config.validated_endpoint()?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let user_agent = config
            .application
            .as_ref()
            .and_then(|app| app.user_agent())
            .ok_or(Error::ApplicationRequired)?
            .to_string();

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let limiter = self.rate_limiter.unwrap_or_else(|| {
                    Arc::new(TokenBucket::new(DEFAULT_RATE, DEFAULT_BURST))
                });
                let retry = self
                    .retry_policy
                    .unwrap_or_else(|| RetryPolicy::standard(config.max_retries));
                Arc::new(HttpTransport::new(&user_agent, config.timeout, limiter, retry)?)
            }
        };

        let credentials = STANDARD.encode(format!("{}:{}", config.username, config.password));
        let mut authorization = HeaderValue::from_str(&format!("Basic {}", credentials))
            .map_err(|e| Error::InvalidHeader(format!("{}: {}", AUTHORIZATION, e)))?;
        authorization.set_sensitive(true);

        tracing::debug!(
            endpoint = %endpoint,
            user_agent = %user_agent,
            max_retries = config.max_retries,
            timeout_secs = config.timeout.as_secs(),
            debug = config.debug,
            "Created client"
        );

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                config,
                endpoint,
                user_agent,
                authorization,
            }),
        })
    }
}
