//! Intercepted request context.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use http::header::{HeaderMap, ACCEPT};
use http::{Method, Uri};

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let id = format!(
            "{:x}-{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        Self(id)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query string parameters.
pub type QueryParams = HashMap<String, String>;

/// The intercepted request, as handed to every worker.
///
/// Cheap to clone and read-only: workers get their own copy so a chunk
/// future never borrows from the dispatcher.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// Query string parameters.
    pub query: QueryParams,
}

impl RequestContext {
    /// Create a new request context.
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = uri.query().map(parse_query).unwrap_or_default();
        Self {
            request_id: RequestId::generate(),
            method,
            uri,
            headers: HeaderMap::new(),
            query,
        }
    }

    /// Build a context from an intercepted `http` request.
    pub fn from_request<B>(req: &http::Request<B>) -> Self {
        let mut cx = Self::new(req.method().clone(), req.uri().clone());
        cx.headers = req.headers().clone();
        cx
    }

    /// Set headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Get the request path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Get a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|s| s.as_str())
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check if this is a top-level navigation.
    ///
    /// Uses `Sec-Fetch-Mode` when the host provides it and falls back to a
    /// GET that accepts HTML.
    pub fn is_navigation(&self) -> bool {
        if let Some(mode) = self.header("sec-fetch-mode") {
            return mode.eq_ignore_ascii_case("navigate");
        }
        self.method == Method::GET
            && self
                .headers
                .get(ACCEPT)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|accept| accept.contains("text/html"))
    }
}

fn parse_query(query: &str) -> QueryParams {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigation(uri: &str) -> http::Request<()> {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("sec-fetch-mode", "navigate")
            .body(())
            .unwrap()
    }

    #[test]
    fn test_request_id_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();

        assert_ne!(a, b);
        assert_eq!(RequestId::from_string("abc").to_string(), "abc");
    }

    #[test]
    fn test_request_context_from_request() {
        let cx = RequestContext::from_request(&navigation("/posts/1?draft=true&x"));

        assert_eq!(cx.path(), "/posts/1");
        assert_eq!(cx.query_param("draft"), Some("true"));
        assert_eq!(cx.query_param("x"), Some(""));
        assert_eq!(cx.header("Sec-Fetch-Mode"), Some("navigate"));
        assert!(cx.is_navigation());
    }

    #[test]
    fn test_is_navigation_fetch_mode() {
        let req = http::Request::builder()
            .uri("/api/posts")
            .header("sec-fetch-mode", "cors")
            .header("accept", "text/html")
            .body(())
            .unwrap();

        assert!(!RequestContext::from_request(&req).is_navigation());
    }

    #[test]
    fn test_is_navigation_accept_fallback() {
        let html = http::Request::builder()
            .uri("/")
            .header("accept", "text/html,application/xhtml+xml")
            .body(())
            .unwrap();
        let json = http::Request::builder()
            .uri("/")
            .header("accept", "application/json")
            .body(())
            .unwrap();

        assert!(RequestContext::from_request(&html).is_navigation());
        assert!(!RequestContext::from_request(&json).is_navigation());
    }
}
