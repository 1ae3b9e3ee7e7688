//! Chunk data model and the collection/reading side of the pipeline.
//!
//! This crate provides:
//! - `Chunk` - A named unit of asynchronous page data
//! - `WorkerTable` - Named data-fetching functions
//! - `collect_chunks` - Concurrent chunk collection for one request
//! - `ChunkReader` - Memoized tri-state view over a chunk

mod chunk;
mod collector;
mod reader;
mod worker;

pub use chunk::*;
pub use collector::*;
pub use reader::*;
pub use worker::*;
