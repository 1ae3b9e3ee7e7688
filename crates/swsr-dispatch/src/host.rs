//! Host environment interface.

use std::fmt::{self, Display};

use async_trait::async_trait;
use futures::{Sink, StreamExt};
use swsr_core::{ByteStream, RenderError, RequestContext, TimingContext};
use swsr_streaming::StreamingSink;

/// Error from the host's network pass-through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Network request failed: {0}")]
pub struct NetworkError(pub String);

/// Response body produced by the dispatcher or the network.
pub enum Body {
    /// A complete document.
    Full(String),
    /// A body delivered incrementally.
    Stream(ByteStream),
}

impl Body {
    /// Check if the body is streamed.
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Read the whole body.
    ///
    /// For a streamed body this waits for the end of the stream and
    /// returns the first error it carries.
    pub async fn into_bytes(self) -> Result<Vec<u8>, RenderError> {
        match self {
            Self::Full(html) => Ok(html.into_bytes()),
            Self::Stream(mut stream) => {
                let mut bytes = Vec::new();
                while let Some(item) = stream.next().await {
                    bytes.extend_from_slice(&item?);
                }
                Ok(bytes)
            }
        }
    }

    /// Read the whole body as text.
    pub async fn into_string(self) -> Result<String, RenderError> {
        Ok(String::from_utf8(self.into_bytes().await?)?)
    }

    /// Write the body into the host's response writer and close it.
    ///
    /// The shell always goes out first. A streamed body that fails after
    /// the shell ends with `RenderError::Truncated` and leaves the writer
    /// open, so the host can abort the response.
    pub async fn write_to<S, E>(self, writer: S) -> Result<S, RenderError>
    where
        S: Sink<Vec<u8>, Error = E> + Unpin,
        E: Display,
    {
        let mut sink = StreamingSink::new(writer, TimingContext::new());
        match self {
            Self::Full(html) => {
                sink.send_shell(html.into_bytes()).await?;
                sink.complete().await?;
            }
            Self::Stream(stream) => sink.forward(stream).await?,
        }

        tracing::debug!(
            chunks_sent = sink.chunks_sent(),
            elapsed_us = sink.timing().elapsed().as_micros() as u64,
            "response written"
        );
        Ok(sink.into_inner())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(html) => f.debug_tuple("Full").field(&html.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for Body {
    fn from(html: String) -> Self {
        Self::Full(html)
    }
}

impl From<&str> for Body {
    fn from(html: &str) -> Self {
        Self::Full(html.to_string())
    }
}

/// The environment the interceptor runs in.
#[async_trait]
pub trait Host: Send + Sync {
    /// Probe whether responses can carry a streamed body.
    fn supports_streaming(&self) -> bool;

    /// Forward a request to the network unmodified.
    async fn fetch(&self, request: RequestContext) -> Result<http::Response<Body>, NetworkError>;
}
