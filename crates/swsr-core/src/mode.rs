//! Render mode selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Strategy used to produce the HTML for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Wait for every chunk, then produce one complete document.
    String,
    /// Flush the shell immediately and patch chunks in as they settle.
    Stream,
}

impl RenderMode {
    /// Name used in the page-global mode marker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Stream => "stream",
        }
    }

    /// Check if this mode emits output incrementally.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Stream)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown render mode: {0}")]
pub struct UnknownRenderMode(pub String);

impl FromStr for RenderMode {
    type Err = UnknownRenderMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "stream" => Ok(Self::Stream),
            other => Err(UnknownRenderMode(other.to_string())),
        }
    }
}
