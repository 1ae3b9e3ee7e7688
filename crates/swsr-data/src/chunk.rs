//! Chunk data model.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a chunk's data source.
pub type ChunkResult = Result<Value, ChunkError>;

/// Shared, multi-consumer future for a pending chunk.
///
/// Cloning does not subscribe anything: the underlying future is polled
/// once, by whichever consumer awaits it first, and every clone observes
/// the same settlement.
pub type ChunkFuture = Shared<BoxFuture<'static, ChunkResult>>;

/// Failure of a chunk's data source.
///
/// Carries the failure message only, since that is all that crosses the
/// wire to the page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .message.as_deref().unwrap_or("chunk rejected"))]
pub struct ChunkError {
    message: Option<String>,
}

impl ChunkError {
    /// Create a chunk error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Create a chunk error without a message.
    pub fn without_message() -> Self {
        Self { message: None }
    }

    /// Get the failure message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// The three shapes a chunk can take.
pub enum ChunkValue {
    /// Not settled yet.
    Pending(ChunkFuture),
    /// Settled successfully.
    Resolved(Value),
    /// Settled with a failure.
    Failed(ChunkError),
}

/// A named unit of asynchronous page data.
///
/// Handles are cheap to clone; clones share the same instance, and
/// [`Chunk::ptr_eq`] is the instance identity readers are memoized on.
#[derive(Clone)]
pub struct Chunk {
    inner: Arc<ChunkValue>,
}

impl Chunk {
    /// Create a pending chunk from a data source future.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = ChunkResult> + Send + 'static,
    {
        Self::from_shared(future.boxed().shared())
    }

    /// Create a pending chunk from an existing shared future.
    pub fn from_shared(future: ChunkFuture) -> Self {
        Self {
            inner: Arc::new(ChunkValue::Pending(future)),
        }
    }

    /// Create a resolved chunk.
    pub fn resolved(value: Value) -> Self {
        Self {
            inner: Arc::new(ChunkValue::Resolved(value)),
        }
    }

    /// Create a failed chunk.
    pub fn failed(error: ChunkError) -> Self {
        Self {
            inner: Arc::new(ChunkValue::Failed(error)),
        }
    }

    /// Create a terminal chunk from a settlement.
    pub fn from_result(result: ChunkResult) -> Self {
        match result {
            Ok(value) => Self::resolved(value),
            Err(error) => Self::failed(error),
        }
    }

    /// Get the chunk's current shape.
    pub fn value(&self) -> &ChunkValue {
        &self.inner
    }

    /// Check if two handles refer to the same chunk instance.
    pub fn ptr_eq(&self, other: &Chunk) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Check if the chunk was created pending.
    pub fn is_pending(&self) -> bool {
        matches!(*self.inner, ChunkValue::Pending(_))
    }

    /// Get the settlement if it is already known, without polling.
    pub fn peek(&self) -> Option<ChunkResult> {
        match &*self.inner {
            ChunkValue::Pending(future) => future.peek().cloned(),
            ChunkValue::Resolved(value) => Some(Ok(value.clone())),
            ChunkValue::Failed(error) => Some(Err(error.clone())),
        }
    }

    /// Wait for the chunk to settle.
    pub fn settled(&self) -> BoxFuture<'static, ChunkResult> {
        match &*self.inner {
            ChunkValue::Pending(future) => future.clone().boxed(),
            ChunkValue::Resolved(value) => futures::future::ready(Ok(value.clone())).boxed(),
            ChunkValue::Failed(error) => futures::future::ready(Err(error.clone())).boxed(),
        }
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner {
            ChunkValue::Pending(future) => match future.peek() {
                Some(settled) => f.debug_tuple("Chunk::Pending").field(settled).finish(),
                None => f.write_str("Chunk::Pending(..)"),
            },
            ChunkValue::Resolved(value) => f.debug_tuple("Chunk::Resolved").field(value).finish(),
            ChunkValue::Failed(error) => f.debug_tuple("Chunk::Failed").field(error).finish(),
        }
    }
}

/// Final chunk value as embedded in a string-mode document.
///
/// Failures are encoded as `{"__SWSR_ERROR__": {"message": ...}}` so the
/// page can tell them apart from data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddedChunk {
    /// Failure marker.
    Failed(FailureMarker),
    /// Resolved data.
    Resolved(Value),
}

/// Failure marker object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailureMarker {
    #[serde(rename = "__SWSR_ERROR__")]
    pub error: FailurePayload,
}

/// Failure marker payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePayload {
    #[serde(default)]
    pub message: Option<String>,
}

impl EmbeddedChunk {
    /// Build the embedded form of a settlement.
    pub fn from_result(result: &ChunkResult) -> Self {
        match result {
            Ok(value) => Self::Resolved(value.clone()),
            Err(error) => Self::Failed(FailureMarker {
                error: FailurePayload {
                    message: error.message().map(str::to_string),
                },
            }),
        }
    }

    /// Turn the embedded form back into a terminal chunk.
    pub fn into_chunk(self) -> Chunk {
        match self {
            Self::Resolved(value) => Chunk::resolved(value),
            Self::Failed(marker) => Chunk::failed(ChunkError {
                message: marker.error.message,
            }),
        }
    }
}
