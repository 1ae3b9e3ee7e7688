//! Hydration bootstrap.

use serde_json::{Map, Value};
use swsr_core::wire::{self, ScriptCall, SCRIPT_PLACEHOLDER};
use swsr_core::RenderMode;
use swsr_data::{Chunk, ChunkMap, EmbeddedChunk};
use swsr_view::RenderContext;

use crate::registry::{ChunkRegistry, RegistryError};

/// The swsr globals a document defines once its scripts have run.
#[derive(Debug, Default)]
pub struct PageGlobals {
    mode: Option<RenderMode>,
    embedded: Option<Map<String, Value>>,
    registry: Option<ChunkRegistry>,
    script_placeholder: bool,
}

impl PageGlobals {
    /// Evaluate the swsr scripts of a document, in order.
    ///
    /// For a streamed document this may be a prefix: settlements that have
    /// not arrived yet leave their connections pending.
    pub fn from_document(html: &str) -> Result<Self, RegistryError> {
        let mut globals = Self {
            script_placeholder: html.contains(SCRIPT_PLACEHOLDER),
            ..Self::default()
        };

        for call in wire::parse_document(html)? {
            match call {
                ScriptCall::Mode(mode) => globals.mode = Some(mode),
                ScriptCall::EmbedChunks(map) => globals.embedded = Some(map),
                ScriptCall::CreateConnections(_) => {
                    globals
                        .registry
                        .get_or_insert_with(ChunkRegistry::new)
                        .apply(call)?;
                }
                settlement => globals
                    .registry
                    .as_mut()
                    .ok_or(RegistryError::NotCreated)?
                    .apply(settlement)?,
            }
        }

        Ok(globals)
    }

    /// Get the mode marker.
    pub fn mode(&self) -> Option<RenderMode> {
        self.mode
    }

    /// Get the string-mode chunk map.
    pub fn embedded(&self) -> Option<&Map<String, Value>> {
        self.embedded.as_ref()
    }

    /// Get the stream-mode registry.
    pub fn registry(&self) -> Option<&ChunkRegistry> {
        self.registry.as_ref()
    }

    /// Get the stream-mode registry for applying later settlements.
    pub fn registry_mut(&mut self) -> Option<&mut ChunkRegistry> {
        self.registry.as_mut()
    }

    /// Check if the unreplaced script placeholder is still in the document.
    pub fn has_script_placeholder(&self) -> bool {
        self.script_placeholder
    }
}

/// How the page should start.
#[derive(Debug)]
pub enum Hydration {
    /// The document was not rendered by swsr; render from scratch.
    ClientRender,
    /// Hydrate the server markup with these chunks.
    Hydrate { mode: RenderMode, chunks: ChunkMap },
}

impl Hydration {
    /// Decide how to start from the page globals.
    pub fn bootstrap(globals: &PageGlobals) -> Self {
        let Some(mode) = globals.mode() else {
            return Self::ClientRender;
        };

        let chunks = match mode {
            RenderMode::String => globals
                .embedded()
                .map(|map| {
                    map.iter()
                        .map(|(name, value)| (name.as_str(), embedded_chunk(value)))
                        .collect()
                })
                .unwrap_or_default(),
            RenderMode::Stream => globals
                .registry()
                .map(ChunkRegistry::chunks)
                .unwrap_or_default(),
        };

        Self::Hydrate { mode, chunks }
    }

    /// Get the render context to hydrate with.
    pub fn context(&self) -> Option<RenderContext> {
        match self {
            Self::ClientRender => None,
            Self::Hydrate { mode, chunks } => Some(RenderContext::new(chunks.clone(), *mode)),
        }
    }
}

fn embedded_chunk(value: &Value) -> Chunk {
    match serde_json::from_value::<EmbeddedChunk>(value.clone()) {
        Ok(embedded) => embedded.into_chunk(),
        Err(_) => Chunk::resolved(value.clone()),
    }
}
