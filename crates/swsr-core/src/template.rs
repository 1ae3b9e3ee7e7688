//! Page shell template with content and script placeholders.

use std::sync::Arc;

use crate::wire::{self, CONTENT_PLACEHOLDER, SCRIPT_PLACEHOLDER};

/// Compiled page template.
///
/// Immutable and cheap to clone; one instance is shared by every render of
/// the interceptor. Substitution replaces the first occurrence of each
/// placeholder only. A missing placeholder is not an error: the document
/// simply comes out un-augmented.
#[derive(Debug, Clone)]
pub struct Template {
    source: Arc<str>,
}

impl Template {
    /// Create a template from its HTML source.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Get the raw template source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check if the content placeholder is present.
    pub fn has_content_placeholder(&self) -> bool {
        self.source.contains(CONTENT_PLACEHOLDER)
    }

    /// Check if the script placeholder is present.
    pub fn has_script_placeholder(&self) -> bool {
        self.source.contains(SCRIPT_PLACEHOLDER)
    }

    /// Check if the template was built for the given version.
    ///
    /// Templates carry a `<!-- __SWSR_VERSION_{version}__ -->` marker so an
    /// interceptor never renders into a shell from a different build.
    pub fn matches_version(&self, version: Option<&str>) -> bool {
        match version {
            None => true,
            Some(v) if v.is_empty() => true,
            Some(v) => self.source.contains(&wire::version_marker(v)),
        }
    }

    /// Substitute rendered markup and the bootstrap script.
    pub fn render(&self, content: &str, script: &str) -> String {
        let mut html = String::with_capacity(self.source.len() + content.len() + script.len());
        html.push_str(&self.source);
        replace_first(&mut html, CONTENT_PLACEHOLDER, content);
        replace_first(&mut html, SCRIPT_PLACEHOLDER, script);
        html
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

fn replace_first(html: &mut String, placeholder: &str, with: &str) {
    if let Some(start) = html.find(placeholder) {
        html.replace_range(start..start + placeholder.len(), with);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        Template::new(format!(
            "<html><head>{}</head><body><div id=\"root\">{}</div></body></html>",
            SCRIPT_PLACEHOLDER, CONTENT_PLACEHOLDER
        ))
    }

    #[test]
    fn test_template_render_substitutes_both() {
        let html = template().render("<p>hi</p>", "<script>1</script>");

        assert_eq!(
            html,
            "<html><head><script>1</script></head><body><div id=\"root\"><p>hi</p></div></body></html>"
        );
    }

    #[test]
    fn test_template_render_first_occurrence_only() {
        let t = Template::new(format!("{0}|{0}", CONTENT_PLACEHOLDER));
        let html = t.render("X", "");

        assert_eq!(html, format!("X|{}", CONTENT_PLACEHOLDER));
    }

    #[test]
    fn test_template_missing_placeholders_no_op() {
        let t = Template::new("<html><body></body></html>");

        assert!(!t.has_content_placeholder());
        assert!(!t.has_script_placeholder());
        assert_eq!(t.render("X", "Y"), "<html><body></body></html>");
    }

    #[test]
    fn test_template_content_is_not_reinterpreted() {
        // Substituted markup that happens to contain the script placeholder
        // is still the content, and the real placeholder gets the script.
        let html = template().render(SCRIPT_PLACEHOLDER, "S");

        assert!(html.starts_with("<html><head>S</head>"));
    }

    #[test]
    fn test_template_version_marker() {
        let t = Template::new(format!("{}<body></body>", wire::version_marker("1.2.0")));

        assert!(t.matches_version(None));
        assert!(t.matches_version(Some("1.2.0")));
        assert!(!t.matches_version(Some("1.3.0")));
        assert!(template().matches_version(Some("")));
    }
}
