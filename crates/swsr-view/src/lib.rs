//! Component-tree rendering for swsr.
//!
//! This crate provides:
//! - `View` - The component tree, with `Use` boundaries over chunks
//! - `RenderContext` - Per-render chunk access for the `App`
//! - `render_to_string` - Complete render of settled data
//! - `render_to_stream` - Suspending render with late boundary content

mod context;
mod html;
mod stream;
mod view;

pub use context::{App, RenderContext};
pub use html::{escape_html, render_to_string};
pub use stream::{render_to_stream, SWAP_RUNTIME};
pub use view::{Element, Lazy, Rejected, Use, View};
