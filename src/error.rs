//! Error types for configuring the client and dispatching requests.
//!
//! Every failure names the layer it came from: configuration, request
//! construction, transport, or reading the response body. Underlying causes are
//! kept as sources so the full chain is available to callers.

use crate::application::ApplicationError;
use http::StatusCode;

/// The main error type for the client.
///
/// # Examples
///
/// ```
/// use wordpress_client::{Config, Error};
///
/// let err = Config::new(None, "https://example.com", "user", "pass").unwrap_err();
/// assert!(matches!(err, Error::ApplicationRequired));
/// assert!(err.is_config_error());
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A client was built without a [`Config`](crate::Config).
    #[error("config cannot be empty")]
    ConfigRequired,

    /// The config carries no [`Application`](crate::Application).
    #[error("application required")]
    ApplicationRequired,

    /// The application identity is incomplete.
    #[error("invalid application: {0}")]
    InvalidApplication(#[source] ApplicationError),

    /// The config has an empty endpoint.
    #[error("endpoint required")]
    EndpointRequired,

    /// The endpoint could not be parsed as a URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[source] url::ParseError),

    /// The config has an empty username.
    #[error("username required")]
    UsernameRequired,

    /// The config has an empty password.
    #[error("password required")]
    PasswordRequired,

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnvVar {
        /// The variable name
        name: String,
        /// The raw value found in the environment
        value: String,
    },

    /// The request method is not a valid HTTP method token.
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    /// The request URI could not be parsed or resolved against the endpoint.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A request header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The transport failed to produce a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// The response body could not be decoded into the requested type.
    ///
    /// The raw body is preserved so decoding problems can be debugged.
    #[error("failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The call's context was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The call's context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    /// Returns `true` for errors detected while defaulting and validating
    /// configuration, before any network activity.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::ConfigRequired
                | Error::ApplicationRequired
                | Error::InvalidApplication(_)
                | Error::EndpointRequired
                | Error::InvalidEndpoint(_)
                | Error::UsernameRequired
                | Error::PasswordRequired
                | Error::InvalidEnvVar { .. }
        )
    }

    /// Returns `true` if the error came from the call's context rather than
    /// from the request itself.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),

    /// A single attempt failed at the network layer and was not retried.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Every attempt allowed by the retry policy failed at the network layer.
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// The number of attempts made
        attempts: usize,
        /// The failure of the last attempt
        #[source]
        source: reqwest::Error,
    },

    /// A failure reported by a custom transport.
    #[error("{0}")]
    Other(String),
}

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_invalid_application_message_and_source() {
        let err = Error::InvalidApplication(ApplicationError::NameRequired);
        assert_eq!(
            err.to_string(),
            "invalid application: application name required"
        );
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("application name required".to_string())
        );
    }

    #[test]
    fn test_invalid_endpoint_wraps_parse_error() {
        let parse_error = url::Url::parse("://example.com").unwrap_err();
        let err = Error::InvalidEndpoint(parse_error);
        assert!(err.to_string().starts_with("invalid endpoint: "));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::ConfigRequired.is_config_error());
        assert!(Error::PasswordRequired.is_config_error());
        assert!(!Error::Cancelled.is_config_error());
        assert!(Error::Cancelled.is_context_error());
        assert!(Error::DeadlineExceeded.is_context_error());
        assert!(!Error::InvalidMethod("G ET".into()).is_context_error());
    }
}
