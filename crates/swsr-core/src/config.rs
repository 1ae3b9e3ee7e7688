//! Interceptor configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::mode::RenderMode;

/// Configuration for one interceptor.
///
/// Usually generated by the build plugin next to the template; loadable from
/// TOML or JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwsrConfig {
    /// Forced render mode. When unset the mode is probed once at runtime.
    #[serde(default)]
    pub mode: Option<RenderMode>,
    /// Build version the template must be marked with.
    #[serde(default)]
    pub version: Option<String>,
    /// Route patterns this interceptor renders (e.g., "/posts/:id").
    #[serde(default)]
    pub routes: Vec<String>,
    /// Only intercept top-level navigations.
    #[serde(default = "default_navigate_only")]
    pub navigate_only: bool,
}

fn default_navigate_only() -> bool {
    true
}

impl Default for SwsrConfig {
    fn default() -> Self {
        Self {
            mode: None,
            version: None,
            routes: Vec::new(),
            navigate_only: default_navigate_only(),
        }
    }
}

impl SwsrConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            Self::from_json(&content).with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            Self::from_toml(&content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Force a render mode instead of probing.
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Require a template version marker.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add a route pattern.
    pub fn with_route(mut self, pattern: impl Into<String>) -> Self {
        self.routes.push(pattern.into());
        self
    }

    /// Set whether only navigations are intercepted.
    pub fn with_navigate_only(mut self, navigate_only: bool) -> Self {
        self.navigate_only = navigate_only;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SwsrConfig::default();

        assert!(config.mode.is_none());
        assert!(config.version.is_none());
        assert!(config.routes.is_empty());
        assert!(config.navigate_only);
    }

    #[test]
    fn test_config_builder_chain() {
        let config = SwsrConfig::new()
            .with_mode(RenderMode::Stream)
            .with_version("1.0.0")
            .with_route("/")
            .with_route("/posts/:id")
            .with_navigate_only(false);

        assert_eq!(config.mode, Some(RenderMode::Stream));
        assert_eq!(config.version.as_deref(), Some("1.0.0"));
        assert_eq!(config.routes, vec!["/", "/posts/:id"]);
        assert!(!config.navigate_only);
    }

    #[test]
    fn test_config_from_toml() {
        let config = SwsrConfig::from_toml(
            r#"
mode = "string"
version = "2.1.0"
routes = ["/", "/posts/*"]
"#,
        )
        .unwrap();

        assert_eq!(config.mode, Some(RenderMode::String));
        assert_eq!(config.version.as_deref(), Some("2.1.0"));
        assert_eq!(config.routes.len(), 2);
        assert!(config.navigate_only);
    }

    #[test]
    fn test_config_from_json() {
        let config =
            SwsrConfig::from_json(r#"{"mode": "stream", "navigate_only": false}"#).unwrap();

        assert_eq!(config.mode, Some(RenderMode::Stream));
        assert!(!config.navigate_only);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_config_rejects_unknown_mode() {
        assert!(SwsrConfig::from_toml("mode = \"chunked\"").is_err());
    }

    #[test]
    fn test_config_load_missing_file() {
        let err = SwsrConfig::load("/nonexistent/swsr.toml").unwrap_err();

        assert!(err.to_string().contains("Failed to read config file"));
    }
}
