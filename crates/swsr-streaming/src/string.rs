//! Atomic string-mode renderer.

use serde_json::{Map, Value};
use swsr_core::{wire, RenderError, RenderMode, Template};
use swsr_data::{settle_all, ChunkMap, EmbeddedChunk};
use swsr_view::{render_to_string, App, RenderContext};

/// Renders a complete document after every chunk has settled.
#[derive(Debug, Clone)]
pub struct StringRenderer {
    template: Template,
}

impl StringRenderer {
    /// Create a renderer for a template.
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    /// Wait for all chunks, render the tree, and fill the template.
    ///
    /// A failed chunk does not fail the render; it reaches the tree as a
    /// failed chunk and the page as an error marker.
    pub async fn render(&self, app: &dyn App, chunks: &ChunkMap) -> Result<String, RenderError> {
        let settled = settle_all(chunks).await;

        let cx = RenderContext::new(settled.clone(), RenderMode::String);
        let markup = render_to_string(&app.render(&cx)?)?;

        let script = wire::string_bootstrap(&embed(&settled)?)?;
        tracing::debug!(chunks = settled.len(), "string render complete");

        Ok(self.template.render(&markup, &script))
    }
}

/// Build the literal chunk map embedded in the page.
fn embed(chunks: &ChunkMap) -> Result<Map<String, Value>, RenderError> {
    let mut map = Map::new();
    for (name, chunk) in chunks.iter() {
        let result = chunk
            .peek()
            .ok_or_else(|| RenderError::Suspended(name.to_string()))?;
        map.insert(
            name.to_string(),
            serde_json::to_value(EmbeddedChunk::from_result(&result))?,
        );
    }
    Ok(map)
}
