//! Wire-format dumps of requests and responses for debug tracing.

use http::{HeaderMap, StatusCode, Version};
use std::borrow::Cow;
use std::fmt::Write;

const REDACTED: &str = "[redacted]";

/// Renders `request` the way it goes on the wire: request line, headers, a
/// blank line and the body. Sensitive header values are redacted.
pub(crate) fn dump_request(request: &reqwest::Request) -> String {
    let url = request.url();
    let mut out = String::new();

    let target = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    let _ = write!(out, "{} {} {:?}\r\n", request.method(), target, request.version());

    if let Some(host) = url.host_str() {
        match url.port() {
            Some(port) => {
                let _ = write!(out, "Host: {}:{}\r\n", host, port);
            }
            None => {
                let _ = write!(out, "Host: {}\r\n", host);
            }
        }
    }

    write_headers(&mut out, request.headers());
    out.push_str("\r\n");

    if let Some(body) = request.body() {
        match body.as_bytes() {
            Some(bytes) => out.push_str(&String::from_utf8_lossy(bytes)),
            None => out.push_str("<streaming body>"),
        }
    }

    out
}

/// Renders a response: status line, headers, a blank line and the body.
pub(crate) fn dump_response(
    version: Version,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:?} {}\r\n", version, status);
    write_headers(&mut out, headers);
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = if value.is_sensitive() || *name == http::header::AUTHORIZATION {
            Cow::Borrowed(REDACTED)
        } else {
            String::from_utf8_lossy(value.as_bytes())
        };
        let _ = write!(out, "{}: {}\r\n", name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Method};

    #[test]
    fn test_dump_request() {
        let url = url::Url::parse("http://127.0.0.1:8080/wp-json/wp/v2/posts?page=2").unwrap();
        let mut request = reqwest::Request::new(Method::POST, url);
        request
            .headers_mut()
            .insert("content-type", HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_static("Basic dTpw");
        auth.set_sensitive(true);
        request.headers_mut().insert("authorization", auth);
        *request.body_mut() = Some(reqwest::Body::from("{\"title\":\"Hi\"}"));

        let dump = dump_request(&request);

        assert!(dump.starts_with("POST /wp-json/wp/v2/posts?page=2 HTTP/1.1\r\n"));
        assert!(dump.contains("Host: 127.0.0.1:8080\r\n"));
        assert!(dump.contains("content-type: application/json\r\n"));
        assert!(dump.contains("authorization: [redacted]\r\n"));
        assert!(!dump.contains("dTpw"));
        assert!(dump.ends_with("\r\n\r\n{\"title\":\"Hi\"}"));
    }

    #[test]
    fn test_dump_response() {
        let mut headers = HeaderMap::new();
        headers.insert("x-wp-total", HeaderValue::from_static("12"));

        let dump = dump_response(Version::HTTP_11, StatusCode::OK, &headers, b"ok");
        assert_eq!(dump, "HTTP/1.1 200 OK\r\nx-wp-total: 12\r\n\r\nok");
    }
}
