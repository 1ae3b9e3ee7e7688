//! Named data-fetching functions.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use swsr_core::RequestContext;

use crate::chunk::{ChunkError, ChunkResult};

/// A data-fetching function: request in, future of a JSON value out.
pub type WorkerFn = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, ChunkResult> + Send + Sync>;

/// Table of named workers, one per chunk.
///
/// Request-independent and immutable once built; shared by every render.
/// Names are unique: registering a name twice replaces the earlier worker
/// in place.
#[derive(Clone, Default)]
pub struct WorkerTable {
    workers: Vec<(String, WorkerFn)>,
}

impl WorkerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker returning any serializable value.
    ///
    /// The value is converted to JSON when the future resolves; a failed
    /// conversion rejects the chunk like any other error.
    pub fn register<F, Fut, T, E>(self, name: impl Into<String>, worker: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize,
        E: fmt::Display,
    {
        let worker: WorkerFn = Arc::new(move |request| {
            worker(request)
                .map(|result| match result {
                    Ok(value) => serde_json::to_value(value).map_err(|e| ChunkError::new(e.to_string())),
                    Err(e) => Err(ChunkError::new(e.to_string())),
                })
                .boxed()
        });
        self.register_raw(name, worker)
    }

    /// Register a worker that already produces chunk results.
    pub fn register_raw(mut self, name: impl Into<String>, worker: WorkerFn) -> Self {
        let name = name.into();
        match self.workers.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = worker,
            None => self.workers.push((name, worker)),
        }
        self
    }

    /// Get chunk names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.workers.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Iterate over workers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WorkerFn)> {
        self.workers.iter().map(|(n, w)| (n.as_str(), w))
    }

    /// Number of workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl fmt::Debug for WorkerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerTable")
            .field("names", &self.names())
            .finish()
    }
}
