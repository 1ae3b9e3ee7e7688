//! Page-side counterpart of the swsr renderers.
//!
//! This crate models what the page does with a rendered document:
//! - `ChunkRegistry` - Connections settled by streamed scripts
//! - `PageGlobals` / `Hydration` - Picking the chunks to hydrate with
//! - `SwsrInfo` / `inspect` - Diagnostics

mod hydrate;
mod info;
mod registry;

pub use hydrate::*;
pub use info::*;
pub use registry::*;
