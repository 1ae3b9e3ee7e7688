//! Once-per-process render mode selection.

use std::sync::OnceLock;

use swsr_core::RenderMode;

use crate::host::Host;

/// Selects the render mode once and remembers it.
///
/// A configured mode always wins. Otherwise the host is probed for
/// streaming support on first use only; concurrent first callers share
/// that single probe.
#[derive(Debug, Default)]
pub struct ModeSelector {
    configured: Option<RenderMode>,
    selected: OnceLock<RenderMode>,
}

impl ModeSelector {
    /// Create a selector, optionally with a forced mode.
    pub fn new(configured: Option<RenderMode>) -> Self {
        Self {
            configured,
            selected: OnceLock::new(),
        }
    }

    /// Get the mode, selecting it on first call.
    pub fn select(&self, host: &dyn Host) -> RenderMode {
        *self.selected.get_or_init(|| {
            let (mode, source) = match self.configured {
                Some(mode) => (mode, "config"),
                None if host.supports_streaming() => (RenderMode::Stream, "probe"),
                None => (RenderMode::String, "probe"),
            };
            tracing::info!(mode = mode.as_str(), source, "render mode selected");
            mode
        })
    }

    /// Get the mode if it has been selected.
    pub fn selected(&self) -> Option<RenderMode> {
        self.selected.get().copied()
    }
}
