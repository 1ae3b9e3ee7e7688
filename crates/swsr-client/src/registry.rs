//! Client chunk registry.

use futures::channel::oneshot;
use serde_json::Value;
use swsr_core::wire::{self, ScriptCall, WireError};
use swsr_data::{Chunk, ChunkError, ChunkMap, ChunkResult};

/// Error for registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("No connection named '{0}'")]
    UnknownChunk(String),

    #[error("Connection '{0}' has already settled")]
    AlreadySettled(String),

    #[error("Connections have not been created")]
    NotCreated,

    #[error("Connections have already been created")]
    AlreadyCreated,

    #[error("Malformed document: {0}")]
    Wire(#[from] WireError),
}

/// Settlement status of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Pending,
    Resolved,
    Rejected,
}

/// Page-side handle for one streamed chunk.
///
/// Settles at most once. `chunk()` always agrees with `status()`: while
/// pending it is a shared future that completes with the settlement, and
/// once settled it is the terminal value.
#[derive(Debug)]
pub struct ChunkConnection {
    status: ConnectionStatus,
    data: Option<Value>,
    error: Option<ChunkError>,
    chunk: Chunk,
    sender: Option<oneshot::Sender<ChunkResult>>,
}

impl ChunkConnection {
    fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        let chunk = Chunk::pending(async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(ChunkError::new("connection dropped")))
        });
        Self {
            status: ConnectionStatus::Pending,
            data: None,
            error: None,
            chunk,
            sender: Some(sender),
        }
    }

    fn settle(&mut self, result: ChunkResult) {
        match &result {
            Ok(value) => {
                self.status = ConnectionStatus::Resolved;
                self.data = Some(value.clone());
            }
            Err(error) => {
                self.status = ConnectionStatus::Rejected;
                self.error = Some(error.clone());
            }
        }
        self.chunk = Chunk::from_result(result.clone());
        if let Some(sender) = self.sender.take() {
            // Nobody may be waiting anymore; the terminal chunk covers that.
            let _ = sender.send(result);
        }
    }

    /// Get the status.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Get the resolved value.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Get the rejection.
    pub fn error(&self) -> Option<&ChunkError> {
        self.error.as_ref()
    }

    /// Get the connection's chunk.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }
}

/// Connections for every chunk of a streamed document.
#[derive(Debug, Default)]
pub struct ChunkRegistry {
    connections: Vec<(String, ChunkConnection)>,
    created: bool,
}

impl ChunkRegistry {
    /// Create an empty registry; `create` must run before any settlement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create one pending connection per name.
    ///
    /// Runs once per page; a second call leaves every connection as it is.
    pub fn create<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), RegistryError> {
        if self.created {
            return Err(RegistryError::AlreadyCreated);
        }
        self.connections = names
            .iter()
            .map(|name| (name.as_ref().to_string(), ChunkConnection::new()))
            .collect();
        self.created = true;
        Ok(())
    }

    /// Check if connections have been created.
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Resolve a connection.
    pub fn resolve(&mut self, name: &str, value: Value) -> Result<(), RegistryError> {
        self.pending(name)?.settle(Ok(value));
        Ok(())
    }

    /// Reject a connection.
    pub fn reject(&mut self, name: &str, message: Option<String>) -> Result<(), RegistryError> {
        let error = match message {
            Some(message) => ChunkError::new(message),
            None => ChunkError::without_message(),
        };
        self.pending(name)?.settle(Err(error));
        Ok(())
    }

    fn pending(&mut self, name: &str) -> Result<&mut ChunkConnection, RegistryError> {
        if !self.created {
            return Err(RegistryError::NotCreated);
        }
        let connection = self
            .connections
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| RegistryError::UnknownChunk(name.to_string()))?;
        if connection.status != ConnectionStatus::Pending {
            return Err(RegistryError::AlreadySettled(name.to_string()));
        }
        Ok(connection)
    }

    /// Get a connection by name.
    pub fn get(&self, name: &str) -> Option<&ChunkConnection> {
        self.connections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Get the current chunk of every connection.
    pub fn chunks(&self) -> ChunkMap {
        self.connections
            .iter()
            .map(|(name, connection)| (name.as_str(), connection.chunk.clone()))
            .collect()
    }

    /// Execute one parsed script call.
    ///
    /// Bootstrap calls other than connection creation do not concern the
    /// registry and are ignored.
    pub fn apply(&mut self, call: ScriptCall) -> Result<(), RegistryError> {
        match call {
            ScriptCall::CreateConnections(names) => self.create(&names),
            ScriptCall::Resolve { name, value } => self.resolve(&name, value),
            ScriptCall::Reject { name, message } => self.reject(&name, message),
            ScriptCall::Mode(_) | ScriptCall::EmbedChunks(_) => Ok(()),
        }
    }

    /// Execute every swsr script in an HTML document or fragment.
    pub fn apply_html(&mut self, html: &str) -> Result<usize, RegistryError> {
        let calls = wire::parse_document(html)?;
        let count = calls.len();
        for call in calls {
            self.apply(call)?;
        }
        Ok(count)
    }
}
