//! Navigation and path matching.

use swsr_core::{RequestContext, SwsrConfig};

/// Decides which requests are rendered.
///
/// Patterns are matched against the request path: a trailing `*` matches
/// any path with that prefix, a `:name` segment matches any one segment,
/// and anything else must match exactly. No patterns means every path.
#[derive(Debug, Clone, Default)]
pub struct RouteMatcher {
    patterns: Vec<String>,
    navigate_only: bool,
}

impl RouteMatcher {
    /// Create a matcher.
    pub fn new(patterns: Vec<String>, navigate_only: bool) -> Self {
        Self {
            patterns,
            navigate_only,
        }
    }

    /// Create a matcher from configuration.
    pub fn from_config(config: &SwsrConfig) -> Self {
        Self::new(config.routes.clone(), config.navigate_only)
    }

    /// Check if a request should be rendered.
    pub fn matches(&self, request: &RequestContext) -> bool {
        if self.navigate_only && !request.is_navigation() {
            return false;
        }
        self.matches_path(request.path())
    }

    /// Check a path against the patterns.
    pub fn matches_path(&self, path: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| pattern_matches(p, path))
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        return path.starts_with(prefix);
    }

    let mut expected = pattern.split('/');
    let mut actual = path.split('/');
    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return true,
            (Some(e), Some(a)) if e.starts_with(':') => {
                if a.is_empty() {
                    return false;
                }
            }
            (Some(e), Some(a)) if e == a => {}
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderValue, ACCEPT};
    use http::Method;

    fn navigation(path: &str) -> RequestContext {
        let mut request = RequestContext::new(Method::GET, path.parse().unwrap());
        request
            .headers
            .insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        request
    }

    #[test]
    fn test_pattern_kinds() {
        let matcher = RouteMatcher::new(
            vec!["/".into(), "/posts/:id".into(), "/docs/*".into()],
            false,
        );

        assert!(matcher.matches_path("/"));
        assert!(matcher.matches_path("/posts/42"));
        assert!(!matcher.matches_path("/posts/"));
        assert!(!matcher.matches_path("/posts/42/comments"));
        assert!(matcher.matches_path("/docs/intro/setup"));
        assert!(!matcher.matches_path("/about"));
    }

    #[test]
    fn test_empty_patterns_match_everything() {
        assert!(RouteMatcher::default().matches_path("/anything/at/all"));
    }

    #[test]
    fn test_navigate_only() {
        let matcher = RouteMatcher::new(Vec::new(), true);

        assert!(matcher.matches(&navigation("/")));

        let asset = RequestContext::new(Method::GET, "/app.js".parse().unwrap());
        assert!(!matcher.matches(&asset));

        let mut html = RequestContext::new(Method::GET, "/".parse().unwrap());
        html.headers
            .insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        assert!(matcher.matches(&html));
    }

    #[test]
    fn test_from_config() {
        let config = SwsrConfig::new().with_route("/posts/*").with_navigate_only(false);
        let matcher = RouteMatcher::from_config(&config);

        let request = RequestContext::new(Method::GET, "/posts/1".parse().unwrap());
        assert!(matcher.matches(&request));
    }
}
