//! Render context and the component-tree entry point.

use serde_json::Value;
use swsr_core::{RenderError, RenderMode};
use swsr_data::{Chunk, ChunkError, ChunkMap};

use crate::view::{Use, View};

/// Per-render context handed to the component tree.
///
/// Holds the chunk mapping for exactly one render; never shared across
/// requests.
#[derive(Debug, Clone)]
pub struct RenderContext {
    chunks: ChunkMap,
    mode: RenderMode,
}

impl RenderContext {
    /// Create a context.
    pub fn new(chunks: ChunkMap, mode: RenderMode) -> Self {
        Self { chunks, mode }
    }

    /// Get the mode this render runs in.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Get all chunks.
    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    /// Get a chunk by name.
    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.get(name)
    }

    /// Build a boundary for a named chunk.
    ///
    /// An unknown name yields a failed chunk, so the boundary shows its
    /// rejected view instead of aborting the render.
    pub fn use_chunk<F>(&self, name: &str, children: F) -> Use
    where
        F: Fn(&Value) -> View + Send + Sync + 'static,
    {
        let chunk = self
            .chunk(name)
            .cloned()
            .unwrap_or_else(|| Chunk::failed(ChunkError::new(format!("No chunk named '{}'", name))));
        Use::new(chunk, children).named(name)
    }
}

/// The page's component tree.
pub trait App: Send + Sync {
    /// Build the view for one render.
    fn render(&self, cx: &RenderContext) -> Result<View, RenderError>;
}

impl<F> App for F
where
    F: Fn(&RenderContext) -> Result<View, RenderError> + Send + Sync,
{
    fn render(&self, cx: &RenderContext) -> Result<View, RenderError> {
        self(cx)
    }
}
