//! Public SDK for service-worker side rendering.
//!
//! This crate re-exports the whole pipeline:
//!
//! ```ignore
//! use swsr_sdk::prelude::*;
//!
//! let workers = WorkerTable::new().register("post", |req: RequestContext| async move {
//!     fetch_post(req.query_param("id")).await
//! });
//!
//! let app = |cx: &RenderContext| -> Result<View, RenderError> {
//!     Ok(cx
//!         .use_chunk("post", |post| View::text(post["title"].as_str().unwrap_or_default()))
//!         .pending("Loading...")
//!         .into())
//! };
//!
//! let dispatcher = Dispatcher::new(SwsrConfig::load("swsr.toml")?, template, workers, app, host);
//! let response = dispatcher.handle(RequestContext::from_request(&request)).await?;
//! ```

pub use swsr_client;
pub use swsr_core;
pub use swsr_data;
pub use swsr_dispatch;
pub use swsr_observability;
pub use swsr_streaming;
pub use swsr_view;

/// Prelude for convenient imports.
pub mod prelude {
    pub use swsr_client::*;
    pub use swsr_core::*;
    pub use swsr_data::*;
    pub use swsr_dispatch::*;
    pub use swsr_observability::*;
    pub use swsr_streaming::*;
    pub use swsr_view::*;
}
