//! Client configuration, defaulting and validation.

use crate::{Application, Error, Result};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use url::Url;

/// Number of retries used when none is configured.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable holding the site URL, read by [`Config::from_env`].
pub const ENV_ENDPOINT: &str = "WORDPRESS_ENDPOINT";

/// Environment variable holding the Basic auth username.
pub const ENV_USERNAME: &str = "WORDPRESS_USERNAME";

/// Environment variable holding the password, usually an application password.
pub const ENV_PASSWORD: &str = "WORDPRESS_PASSWORD";

/// Optional environment variable overriding the retry count.
pub const ENV_MAX_RETRIES: &str = "WORDPRESS_MAX_RETRIES";

/// Optional environment variable overriding the timeout, in whole seconds.
pub const ENV_TIMEOUT: &str = "WORDPRESS_TIMEOUT";

/// Optional environment variable turning on debug traces.
pub const ENV_DEBUG: &str = "WORDPRESS_DEBUG";

/// Sink for debug traces of requests and responses.
///
/// # Examples
///
/// ```
/// use std::fmt;
/// use std::sync::Mutex;
/// use wordpress_client::Logger;
///
/// #[derive(Default)]
/// struct Capture(Mutex<Vec<String>>);
///
/// impl Logger for Capture {
///     fn log(&self, args: fmt::Arguments<'_>) {
///         self.0.lock().unwrap().push(args.to_string());
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Writes one formatted message.
    fn log(&self, args: fmt::Arguments<'_>);
}

/// Writes each message as a line on standard error, prefixed with the time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn log(&self, args: fmt::Arguments<'_>) {
        let now = httpdate::fmt_http_date(SystemTime::now());
        let mut stderr = std::io::stderr().lock();
        // Nowhere left to report a failed write to stderr.
        let _ = writeln!(stderr, "{} {}", now, args);
    }
}

/// Forwards each message to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "wordpress_client::trace", "{}", args);
    }
}

/// Configuration for a [`Client`](crate::Client).
///
/// A `Config` can be filled in field by field, in which case
/// [`Client::new`](crate::Client::new) fills in defaults and validates it, or
/// built through [`Config::new`], which validates immediately.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wordpress_client::{Application, Config};
///
/// let app = Application::new("my-app", "1.0.0", "ops@example.com")?;
/// let config = Config::new(Some(app), "https://example.com", "admin", "secret")?
///     .with_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.max_retries, 3);
/// # Ok::<(), wordpress_client::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Config {
    /// The application making requests. Filled with
    /// [`Application::default`] when absent.
    pub application: Option<Application>,

    /// Receives request and response dumps when `debug` is on. Falls back to
    /// [`StderrLogger`].
    pub logger: Option<Arc<dyn Logger>>,

    /// URL of the WordPress site to make requests to.
    pub endpoint: String,

    /// Username for Basic authentication.
    pub username: String,

    /// Password for Basic authentication, usually an application password.
    pub password: String,

    /// Maximum number of retries for transient failures. Zero means unset.
    pub max_retries: usize,

    /// Per-request time limit handed to the transport. Zero means unset.
    pub timeout: Duration,

    /// Whether to trace requests and responses to the logger.
    pub debug: bool,
}

impl Config {
    /// Creates a validated `Config` with default retries and timeout and debug
    /// tracing off.
    ///
    /// # Errors
    ///
    /// Returns the first failing check of [`Config::validate`].
    pub fn new(
        application: Option<Application>,
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            application,
            logger: None,
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            debug: false,
        };

        config.validate()?;

        Ok(config)
    }

    /// Loads a validated `Config` from `WORDPRESS_*` environment variables.
    ///
    /// `WORDPRESS_ENDPOINT`, `WORDPRESS_USERNAME` and `WORDPRESS_PASSWORD` are
    /// required. `WORDPRESS_MAX_RETRIES`, `WORDPRESS_TIMEOUT` (in seconds) and
    /// `WORDPRESS_DEBUG` are optional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnvVar`] for unparseable optional values, or the
    /// first failing check of [`Config::validate`].
    pub fn from_env(application: Option<Application>) -> Result<Self> {
        Self::from_lookup(application, |name| std::env::var(name).ok())
    }

    /// Like [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(application: Option<Application>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(
            application,
            lookup(ENV_ENDPOINT).unwrap_or_default(),
            lookup(ENV_USERNAME).unwrap_or_default(),
            lookup(ENV_PASSWORD).unwrap_or_default(),
        )?;

        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            config.max_retries = parse_env(ENV_MAX_RETRIES, &value)?;
        }

        if let Some(value) = lookup(ENV_TIMEOUT) {
            config.timeout = Duration::from_secs(parse_env(ENV_TIMEOUT, &value)?);
        }

        if let Some(value) = lookup(ENV_DEBUG) {
            config.debug = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "" | "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid_env(ENV_DEBUG, &value)),
            };
        }

        Ok(config)
    }

    /// Enables or disables debug tracing.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the logger that receives debug traces.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Sets the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns this config with every unset optional field defaulted.
    ///
    /// Fills in the built-in application, the default retry count and timeout,
    /// and a [`StderrLogger`] when debug tracing is on without a logger.
    /// Applying it twice gives the same result as applying it once.
    pub fn with_defaults(mut self) -> Self {
        if self.application.is_none() {
            self.application = Some(Application::default());
        }

        if self.max_retries < 1 {
            self.max_retries = DEFAULT_MAX_RETRIES;
        }

        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }

        if self.logger.is_none() && self.debug {
            self.logger = Some(Arc::new(StderrLogger));
        }

        self
    }

    /// Checks the config, stopping at the first failure.
    ///
    /// Checks run in a fixed order: application present, application valid,
    /// endpoint present, endpoint parseable, username present, password present.
    pub fn validate(&self) -> Result<()> {
        self.validated_endpoint().map(|_| ())
    }

    /// Validates the config and returns the parsed endpoint.
    pub(crate) fn validated_endpoint(&self) -> Result<Url> {
        let application = self.application.as_ref().ok_or(Error::ApplicationRequired)?;
        application.validate().map_err(Error::InvalidApplication)?;

        if self.endpoint.is_empty() {
            return Err(Error::EndpointRequired);
        }

        let endpoint = Url::parse(&self.endpoint).map_err(Error::InvalidEndpoint)?;

        if self.username.is_empty() {
            return Err(Error::UsernameRequired);
        }

        if self.password.is_empty() {
            return Err(Error::PasswordRequired);
        }

        Ok(endpoint)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("application", &self.application)
            .field("logger", &self.logger.as_ref().map(|_| "<logger>"))
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| invalid_env(name, value))
}

fn invalid_env(name: &str, value: &str) -> Error {
    Error::InvalidEnvVar {
        name: name.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApplicationError;
    use std::collections::HashMap;

    const ENDPOINT: &str = "https://example.com";

    fn app() -> Application {
        Application::new("Test App", "1.0.0", "https://testapp.com").unwrap()
    }

    fn raw_config() -> Config {
        Config {
            endpoint: ENDPOINT.to_string(),
            username: "testuser".to_string(),
            password: "testpassword".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_with_defaults_fills_missing_fields() {
        let config = raw_config().with_defaults();

        assert_eq!(config.application, Some(Application::default()));
        assert_eq!(config.endpoint, ENDPOINT);
        assert_eq!(config.username, "testuser");
        assert_eq!(config.password, "testpassword");
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.logger.is_none());
    }

    #[test]
    fn test_with_defaults_keeps_set_fields() {
        let config = Config {
            application: Some(app()),
            max_retries: 7,
            timeout: Duration::from_secs(5),
            ..raw_config()
        }
        .with_defaults();

        assert_eq!(config.application, Some(app()));
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_with_defaults_is_idempotent() {
        let once = raw_config().with_debug(true).with_defaults();
        let twice = once.clone().with_defaults();

        assert_eq!(once.application, twice.application);
        assert_eq!(once.max_retries, twice.max_retries);
        assert_eq!(once.timeout, twice.timeout);
        assert!(Arc::ptr_eq(
            once.logger.as_ref().unwrap(),
            twice.logger.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_debug_installs_stderr_logger() {
        assert!(raw_config().with_debug(true).with_defaults().logger.is_some());
        assert!(raw_config().with_debug(false).with_defaults().logger.is_none());
    }

    #[test]
    fn test_new_config() {
        let config = Config::new(Some(app()), ENDPOINT, "username", "password").unwrap();
        assert_eq!(config.application, Some(app()));
        assert_eq!(config.endpoint, ENDPOINT);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(!config.debug);
    }

    #[test]
    fn test_new_config_errors() {
        let err = Config::new(None, ENDPOINT, "u", "p").unwrap_err();
        assert!(matches!(err, Error::ApplicationRequired));

        let err = Config::new(Some(app()), "", "u", "p").unwrap_err();
        assert!(matches!(err, Error::EndpointRequired));

        let err = Config::new(Some(app()), "://bad", "u", "p").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidEndpoint(url::ParseError::RelativeUrlWithoutBase)
        ));

        let err = Config::new(Some(app()), ENDPOINT, "", "p").unwrap_err();
        assert!(matches!(err, Error::UsernameRequired));

        let err = Config::new(Some(app()), ENDPOINT, "u", "").unwrap_err();
        assert!(matches!(err, Error::PasswordRequired));
    }

    #[test]
    fn test_validate_reports_application_before_endpoint() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(Error::ApplicationRequired)));
    }

    #[test]
    fn test_validate_invalid_application() {
        let config = Config {
            application: Some(Application {
                name: String::new(),
                version: "1.0.0".to_string(),
                contact: "https://example.com".to_string(),
            }),
            ..raw_config()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidApplication(ApplicationError::NameRequired))
        ));
    }

    #[test]
    fn test_builtin_loggers_accept_messages() {
        let loggers: [Arc<dyn Logger>; 2] = [Arc::new(StderrLogger), Arc::new(TracingLogger)];
        for logger in loggers {
            logger.log(format_args!("request: {} {}", "GET", ENDPOINT));
        }
    }

    #[test]
    fn test_debug_output_hides_password() {
        let rendered = format!("{:?}", raw_config());
        assert!(rendered.contains("testuser"));
        assert!(!rendered.contains("testpassword"));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "https://blog.example.com"),
            (ENV_USERNAME, "editor"),
            (ENV_PASSWORD, "abcd efgh"),
            (ENV_MAX_RETRIES, "5"),
            (ENV_TIMEOUT, "15"),
            (ENV_DEBUG, "true"),
        ]
        .into_iter()
        .collect();

        let config =
            Config::from_lookup(Some(app()), |name| vars.get(name).map(|v| v.to_string()))
                .unwrap();

        assert_eq!(config.endpoint, "https://blog.example.com");
        assert_eq!(config.username, "editor");
        assert_eq!(config.password, "abcd efgh");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.debug);
    }

    #[test]
    fn test_from_lookup_errors() {
        let err = Config::from_lookup(Some(app()), |_| None).unwrap_err();
        assert!(matches!(err, Error::EndpointRequired));

        let err = Config::from_lookup(Some(app()), |name| match name {
            ENV_ENDPOINT => Some(ENDPOINT.to_string()),
            ENV_USERNAME | ENV_PASSWORD => Some("x".to_string()),
            ENV_TIMEOUT => Some("soon".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidEnvVar { ref name, .. } if name == ENV_TIMEOUT));
    }
}
