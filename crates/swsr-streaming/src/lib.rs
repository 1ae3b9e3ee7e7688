//! Renderers for service-worker side rendering.
//!
//! This crate turns a component tree and its chunks into a response body:
//! - `StringRenderer` - Waits for every chunk, then renders once
//! - `StreamRenderer` - Flushes the shell first, then settlements as they happen
//! - `ShellCollector` - Shell buffer state machine
//! - `StreamingSink` - Shell-first forwarding into any byte sink

mod shell;
mod sink;
mod stream;
mod string;

pub use shell::*;
pub use sink::*;
pub use stream::*;
pub use string::*;
