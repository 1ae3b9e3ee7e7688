//! Suspending chunk reader.

use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;

use crate::chunk::{Chunk, ChunkFuture, ChunkResult, ChunkValue};

/// What a reader reports for its chunk.
///
/// `Pending` tells the rendering layer to pause the enclosing subtree until
/// the future settles, then read again.
pub enum ChunkState<'a> {
    /// Not settled; await the future and re-read.
    Pending(ChunkFuture),
    /// Settled with data.
    Ready(&'a Value),
    /// Settled with a failure and its message, if any.
    Failed(Option<&'a str>),
}

impl fmt::Debug for ChunkState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(_) => f.write_str("Pending(..)"),
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Failed(message) => f.debug_tuple("Failed").field(message).finish(),
        }
    }
}

impl ChunkState<'_> {
    /// Check if the reader must suspend.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

#[derive(Debug)]
enum Terminal {
    Ready(Value),
    Failed(Option<String>),
}

impl Terminal {
    fn from_result(result: &ChunkResult) -> Self {
        match result {
            Ok(value) => Self::Ready(value.clone()),
            Err(error) => Self::Failed(error.message().map(str::to_string)),
        }
    }

    fn state(&self) -> ChunkState<'_> {
        match self {
            Self::Ready(value) => ChunkState::Ready(value),
            Self::Failed(message) => ChunkState::Failed(message.as_deref()),
        }
    }
}

/// Memoized tri-state view over one chunk instance.
///
/// Reading never subscribes to the chunk's future: a pending read hands out
/// a clone of the same shared future every time, and the first read after
/// settlement stores the terminal view for all later reads.
#[derive(Debug)]
pub struct ChunkReader {
    chunk: Chunk,
    terminal: OnceLock<Terminal>,
}

impl ChunkReader {
    /// Create a reader for a chunk.
    pub fn new(chunk: Chunk) -> Self {
        let terminal = OnceLock::new();
        match chunk.value() {
            ChunkValue::Resolved(value) => {
                let _ = terminal.set(Terminal::Ready(value.clone()));
            }
            ChunkValue::Failed(error) => {
                let _ = terminal.set(Terminal::Failed(error.message().map(str::to_string)));
            }
            ChunkValue::Pending(_) => {}
        }
        Self { chunk, terminal }
    }

    /// Get the chunk this reader was created for.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Read the chunk's current state.
    pub fn read(&self) -> ChunkState<'_> {
        if let Some(terminal) = self.terminal.get() {
            return terminal.state();
        }

        match self.chunk.value() {
            ChunkValue::Pending(future) => match future.peek() {
                None => ChunkState::Pending(future.clone()),
                Some(result) => self
                    .terminal
                    .get_or_init(|| Terminal::from_result(result))
                    .state(),
            },
            // Terminal chunks are stored by `new`.
            ChunkValue::Resolved(value) => ChunkState::Ready(value),
            ChunkValue::Failed(error) => ChunkState::Failed(error.message()),
        }
    }

    /// Check if the terminal view has been memoized.
    pub fn is_settled(&self) -> bool {
        self.terminal.get().is_some()
    }
}

/// Holder that memoizes a reader by chunk instance.
///
/// Mirrors a render-layer memo slot: the same instance keeps its reader,
/// a different instance replaces it.
#[derive(Debug, Default)]
pub struct ReaderSlot {
    reader: Option<ChunkReader>,
}

impl ReaderSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the reader for a chunk, creating it when the instance changed.
    pub fn reader(&mut self, chunk: &Chunk) -> &ChunkReader {
        if !self.reader.as_ref().is_some_and(|r| r.chunk().ptr_eq(chunk)) {
            self.reader = None;
        }
        self.reader.get_or_insert_with(|| ChunkReader::new(chunk.clone()))
    }
}
