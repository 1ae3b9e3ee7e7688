//! Page diagnostics.

use swsr_core::RenderMode;

use crate::hydrate::PageGlobals;

/// Whether swsr is set up for a page and whether it rendered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwsrInfo {
    /// The page was rendered by swsr, or its template is prepared for it.
    pub enabled: bool,
    /// The page was rendered by swsr.
    pub hit: bool,
    /// Mode the page was rendered in.
    pub mode: Option<RenderMode>,
}

impl SwsrInfo {
    /// Read diagnostics from page globals.
    pub fn from_globals(globals: &PageGlobals) -> Self {
        let mode = globals.mode();
        let hit = mode.is_some();
        Self {
            enabled: hit || globals.has_script_placeholder(),
            hit,
            mode,
        }
    }
}

/// Log a one-line summary of the diagnostics and return it.
///
/// Pages without swsr log nothing.
pub fn inspect(info: &SwsrInfo) -> Option<String> {
    if !info.enabled {
        return None;
    }

    let summary = match info.mode {
        Some(mode) => format!("SWSR running on {} mode", mode),
        None => "SWSR is enabled, but not hit".to_string(),
    };
    tracing::info!(hit = info.hit, "{}", summary);
    Some(summary)
}
