//! Navigation interception and render dispatch.
//!
//! This crate decides how each intercepted request is answered:
//! - `Dispatcher` - Renders matching navigations, fails open to the network
//! - `ModeSelector` - Once-per-process render mode selection
//! - `RouteMatcher` - Navigation and path pattern matching
//! - `Host` - The environment the interceptor runs in

mod dispatcher;
mod host;
mod mode;
mod route;

pub use dispatcher::*;
pub use host::*;
pub use mode::*;
pub use route::*;
