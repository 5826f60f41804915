//! Caller-facing description of a request.

/// Method, target and headers for a single request.
///
/// Nothing is validated here. [`Client::build_request`](crate::Client::build_request)
/// parses the method, resolves the URI against the configured endpoint and
/// checks header names and values.
///
/// # Examples
///
/// ```
/// use wordpress_client::metadata::RequestMetadata;
///
/// let metadata = RequestMetadata::new("GET", "/wp-json/wp/v2/posts")
///     .with_header("Accept", "application/json");
/// assert_eq!(metadata.headers.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    /// The HTTP method, e.g. `GET`.
    pub method: String,

    /// An absolute URL, or a reference resolved against the endpoint.
    pub uri: String,

    /// Headers to set on the request, applied in order. A later header with
    /// the same name replaces an earlier one.
    pub headers: Vec<(String, String)>,
}

impl RequestMetadata {
    /// Creates metadata for `method` and `uri` with no headers.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several headers.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_with_headers_from_map() {
        let map: HashMap<&str, &str> = [("X-One", "1")].into_iter().collect();
        let metadata = RequestMetadata::new("POST", "/posts")
            .with_header("X-Zero", "0")
            .with_headers(map);

        assert_eq!(metadata.method, "POST");
        assert_eq!(metadata.uri, "/posts");
        assert_eq!(metadata.headers.len(), 2);
    }
}
