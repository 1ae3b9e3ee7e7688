//! Chunk collection for one request.

use futures::future::join_all;
use swsr_core::RequestContext;

use crate::chunk::Chunk;
use crate::worker::WorkerTable;

/// Mapping from chunk name to chunk for one render.
///
/// Iteration follows the worker table's registration order, which keeps
/// output deterministic; callers must not rely on it otherwise.
#[derive(Debug, Clone, Default)]
pub struct ChunkMap {
    entries: Vec<(String, Chunk)>,
}

impl ChunkMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk, replacing any chunk with the same name.
    pub fn insert(&mut self, name: impl Into<String>, chunk: Chunk) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = chunk,
            None => self.entries.push((name, chunk)),
        }
    }

    /// Get a chunk by name.
    pub fn get(&self, name: &str) -> Option<&Chunk> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Get chunk names.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Iterate over name/chunk pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Chunk)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if every chunk has settled.
    pub fn is_settled(&self) -> bool {
        self.entries.iter().all(|(_, c)| c.peek().is_some())
    }
}

impl<S: Into<String>> FromIterator<(S, Chunk)> for ChunkMap {
    fn from_iter<I: IntoIterator<Item = (S, Chunk)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, chunk) in iter {
            map.insert(name, chunk);
        }
        map
    }
}

/// Invoke every worker once with the request.
///
/// Each call hands back a future immediately; nothing is awaited here.
/// The returned chunks are shared futures, so whichever renderer drives
/// them polls all of them concurrently. A chunk settles exactly once and
/// is never retried.
pub fn collect_chunks(workers: &WorkerTable, request: &RequestContext) -> ChunkMap {
    workers
        .iter()
        .map(|(name, worker)| (name, Chunk::pending(worker(request.clone()))))
        .collect()
}

/// Wait for every chunk, keeping each chunk's own outcome.
///
/// Never short-circuits: a failed chunk becomes a failed terminal chunk
/// while the rest keep resolving.
pub async fn settle_all(chunks: &ChunkMap) -> ChunkMap {
    let settled = join_all(chunks.iter().map(|(_, chunk)| chunk.settled())).await;

    chunks
        .iter()
        .zip(settled)
        .map(|((name, _), result)| (name, Chunk::from_result(result)))
        .collect()
}
