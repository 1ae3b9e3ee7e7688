//! Render lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Render started, shell still being collected.
    Start,
    /// Shell document has been flushed downstream.
    ShellSent,
    /// Output closed normally.
    Completion,
    /// An error occurred.
    Error(String),
}

impl LifecyclePhase {
    /// Check if output bytes have already left the pipeline.
    ///
    /// Past this point a render error can no longer fail open.
    pub fn has_emitted(&self) -> bool {
        matches!(self, Self::ShellSent | Self::Completion)
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Mark a chunk's settlement.
    pub fn mark_chunk_settled(&mut self, chunk: &str) {
        self.mark(&format!("chunk_{}_settled", chunk));
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get time to shell flush.
    pub fn time_to_shell(&self) -> Option<Duration> {
        self.marks
            .get("shell_sent")
            .map(|t| t.duration_since(self.start))
    }

    /// Get time to the first chunk settlement.
    pub fn time_to_first_chunk(&self) -> Option<Duration> {
        self.marks
            .iter()
            .filter(|(k, _)| k.starts_with("chunk_") && k.ends_with("_settled"))
            .map(|(_, t)| t.duration_since(self.start))
            .min()
    }

    /// Get settlement time for a specific chunk.
    pub fn chunk_timing(&self, chunk: &str) -> Option<Duration> {
        self.marks
            .get(&format!("chunk_{}_settled", chunk))
            .map(|t| t.duration_since(self.start))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_marks() {
        let mut timing = TimingContext::new();

        assert!(timing.time_to_shell().is_none());
        assert!(timing.time_to_first_chunk().is_none());

        timing.mark("shell_sent");
        timing.mark_chunk_settled("post");
        timing.mark_chunk_settled("comments");

        assert!(timing.time_to_shell().is_some());
        assert!(timing.chunk_timing("post").is_some());
        assert!(timing.chunk_timing("missing").is_none());
        assert!(timing.time_to_first_chunk() <= timing.chunk_timing("comments"));
    }

    #[test]
    fn test_lifecycle_has_emitted() {
        assert!(!LifecyclePhase::Start.has_emitted());
        assert!(LifecyclePhase::ShellSent.has_emitted());
        assert!(LifecyclePhase::Completion.has_emitted());
    }
}
