//! The buffered result of a dispatch.

use crate::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// A fully read HTTP response.
///
/// The headers are an owned copy and the body is completely buffered, so a
/// `Response` holds no connection resources.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use http::{HeaderMap, StatusCode};
/// use wordpress_client::Response;
///
/// let response = Response::new(HeaderMap::new(), Bytes::from_static(b"ok"), StatusCode::OK);
/// assert!(response.is_success());
/// assert_eq!(response.text(), "ok");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The response headers.
    pub header: HeaderMap,

    /// The response body.
    pub body: Bytes,

    /// The HTTP status code.
    pub status: StatusCode,
}

impl Response {
    /// Creates a new `Response`.
    pub fn new(header: HeaderMap, body: Bytes, status: StatusCode) -> Self {
        Self {
            header,
            body,
            status,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header.get(name)?.to_str().ok()
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] with the raw body when the body
    /// does not decode into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            tracing::error!(
                error = %e,
                status = self.status.as_u16(),
                "Failed to deserialize response"
            );

            Error::DeserializationFailed {
                raw_response: self.text().into_owned(),
                serde_error: e.to_string(),
                status: self.status,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Post {
        id: u64,
        title: String,
    }

    fn response(status: StatusCode, body: &'static str) -> Response {
        let mut header = HeaderMap::new();
        header.insert("content-type", HeaderValue::from_static("application/json"));
        Response::new(header, Bytes::from_static(body.as_bytes()), status)
    }

    #[test]
    fn test_json_decodes_body() {
        let response = response(StatusCode::OK, r#"{"id": 1, "title": "Hello"}"#);
        let post: Post = response.json().unwrap();
        assert_eq!(
            post,
            Post {
                id: 1,
                title: "Hello".to_string()
            }
        );
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_json_failure_keeps_raw_body() {
        let response = response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match response.json::<Post>() {
            Err(Error::DeserializationFailed {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(raw_response, "<html>bad gateway</html>");
                assert_eq!(status, StatusCode::BAD_GATEWAY);
            }
            other => panic!("expected DeserializationFailed, got {:?}", other),
        }
        assert!(!response.is_success());
    }
}
