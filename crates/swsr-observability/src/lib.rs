//! Observability for service-worker side rendering.
//!
//! This crate provides:
//! - `StructuredLogger` - Request-scoped logging through `tracing`
//! - `LogBuilder` - Fluent extra fields for a single event

mod logging;

pub use logging::*;

// Re-export RequestId and TimingContext from swsr-core for convenience
pub use swsr_core::{RequestId, TimingContext};
