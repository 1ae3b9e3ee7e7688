//! Shell-first output sink.

use std::fmt::Display;

use futures::{Sink, SinkExt, StreamExt};
use swsr_core::{ByteStream, LifecyclePhase, RenderError, TimingContext};

/// State of the streaming sink.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SinkState {
    /// Initial state, shell not yet sent.
    Initial,
    /// Shell has been sent, body chunks can follow.
    ShellSent,
    /// Response has been completed.
    Completed,
    /// Output was cut short after the shell.
    Failed(String),
}

/// Sink wrapper that enforces the shell-first pattern.
///
/// Generic over the underlying sink so any `Sink<Vec<u8>>` can carry the
/// response body, whether a host body writer or a test channel.
pub struct StreamingSink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    inner: S,
    state: SinkState,
    timing: TimingContext,
    chunks_sent: usize,
}

impl<S, E> StreamingSink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    /// Create a new streaming sink.
    pub fn new(sink: S, timing: TimingContext) -> Self {
        Self {
            inner: sink,
            state: SinkState::Initial,
            timing,
            chunks_sent: 0,
        }
    }

    /// Send the shell document. Must be called before anything else.
    pub async fn send_shell(&mut self, bytes: Vec<u8>) -> Result<(), RenderError> {
        if self.state != SinkState::Initial {
            return Err(RenderError::Stream(
                "Shell already sent or sink completed".to_string(),
            ));
        }

        self.inner
            .send(bytes)
            .await
            .map_err(|e| RenderError::Stream(e.to_string()))?;
        self.timing.mark("shell_sent");
        self.state = SinkState::ShellSent;

        Ok(())
    }

    /// Send body bytes that follow the shell.
    pub async fn send_chunk(&mut self, bytes: Vec<u8>) -> Result<(), RenderError> {
        match self.state {
            SinkState::ShellSent => {}
            SinkState::Initial => {
                return Err(RenderError::Stream("Shell not sent".to_string()));
            }
            SinkState::Completed | SinkState::Failed(_) => {
                return Err(RenderError::Stream("Sink already closed".to_string()));
            }
        }

        self.inner
            .send(bytes)
            .await
            .map_err(|e| RenderError::Stream(e.to_string()))?;
        self.chunks_sent += 1;

        Ok(())
    }

    /// Close the response.
    pub async fn complete(&mut self) -> Result<(), RenderError> {
        self.inner
            .close()
            .await
            .map_err(|e| RenderError::Stream(e.to_string()))?;
        self.state = SinkState::Completed;
        self.timing.mark("complete");
        Ok(())
    }

    /// Forward a rendered body: its first item is the shell, the rest follow.
    ///
    /// An error before the shell is returned as is, so the caller can still
    /// fall back. An error after it is reported as `Truncated`; the inner
    /// sink is left open so the host sees an incomplete body.
    pub async fn forward(&mut self, mut body: ByteStream) -> Result<(), RenderError> {
        while let Some(item) = body.next().await {
            let shell_sent = self.state != SinkState::Initial;
            match item {
                Ok(bytes) if shell_sent => self.send_chunk(bytes).await?,
                Ok(bytes) => self.send_shell(bytes).await?,
                Err(e) if shell_sent => {
                    self.state = SinkState::Failed(e.to_string());
                    return Err(RenderError::Truncated(e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        if self.state == SinkState::Initial {
            return Err(RenderError::ShellIncomplete);
        }
        self.complete().await
    }

    /// Number of body chunks sent after the shell.
    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// Get the current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        match &self.state {
            SinkState::Initial => LifecyclePhase::Start,
            SinkState::ShellSent => LifecyclePhase::ShellSent,
            SinkState::Completed => LifecyclePhase::Completion,
            SinkState::Failed(message) => LifecyclePhase::Error(message.clone()),
        }
    }

    /// Get timing context reference.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    /// Consume the sink and return the inner value.
    pub fn into_inner(self) -> S {
        self.inner
    }
}
