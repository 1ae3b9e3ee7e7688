//! Core abstractions for service-worker side rendering.
//!
//! This crate provides the fundamental types shared by every layer:
//! - `RequestContext` - The intercepted navigation request
//! - `RenderMode` - String or stream rendering
//! - `Template` - Page shell with content and script placeholders
//! - `SwsrConfig` - Interceptor configuration
//! - `wire` - Bootstrap and settlement script format
//! - `TimingContext` - Render lifecycle tracking

mod config;
mod context;
mod error;
mod lifecycle;
mod mode;
mod template;
pub mod wire;

pub use config::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use mode::*;
pub use template::*;

/// Rendered output as a stream of byte chunks.
pub type ByteStream =
    futures::stream::BoxStream<'static, Result<Vec<u8>, RenderError>>;
