//! Shell buffer state machine.

use swsr_core::wire::STREAM_ENDING;
use swsr_core::{RenderError, Template};

/// State of the shell collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    /// Buffering render output until the end-of-shell marker.
    Collecting,
    /// Shell document produced; later output passes through.
    Ready,
}

/// Outcome of feeding render output to the collector.
#[derive(Debug, PartialEq, Eq)]
pub enum Feed {
    /// Still collecting; nothing to emit.
    Buffered,
    /// The shell just completed; emit this document.
    Shell(String),
    /// Shell already sent; emit these bytes unchanged.
    Body(Vec<u8>),
}

/// Collects the synchronous part of a stream render into the shell document.
///
/// Bytes are buffered undecoded, so a character split across two reads is
/// decoded whole at the transition. The shell is produced exactly once.
#[derive(Debug)]
pub struct ShellCollector {
    template: Template,
    bootstrap: String,
    buffer: Vec<u8>,
    state: ShellState,
}

impl ShellCollector {
    /// Create a collector that fills `template` and injects `bootstrap`.
    pub fn new(template: Template, bootstrap: impl Into<String>) -> Self {
        Self {
            template,
            bootstrap: bootstrap.into(),
            buffer: Vec::new(),
            state: ShellState::Collecting,
        }
    }

    /// Feed one piece of render output.
    pub fn push(&mut self, bytes: Vec<u8>) -> Result<Feed, RenderError> {
        if self.state == ShellState::Ready {
            return Ok(Feed::Body(bytes));
        }

        self.buffer.extend_from_slice(&bytes);
        if !self.buffer.ends_with(STREAM_ENDING.as_bytes()) {
            return Ok(Feed::Buffered);
        }

        let len = self.buffer.len() - STREAM_ENDING.len();
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.truncate(len);
        let content = String::from_utf8(buffer)?;

        self.state = ShellState::Ready;
        Ok(Feed::Shell(self.template.render(&content, &self.bootstrap)))
    }

    /// Check that the render produced a shell before it ended.
    pub fn finish(&self) -> Result<(), RenderError> {
        match self.state {
            ShellState::Ready => Ok(()),
            ShellState::Collecting => Err(RenderError::ShellIncomplete),
        }
    }

    /// Get the current state.
    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Check if the shell has been produced.
    pub fn is_ready(&self) -> bool {
        self.state == ShellState::Ready
    }

    /// Number of bytes buffered so far.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> ShellCollector {
        ShellCollector::new(
            Template::new(
                "<html><head><!-- __SWSR_SCRIPT_PLACEHOLDER__ --></head><body><!-- __SWSR_CONTENT_PLACEHOLDER__ --></body></html>",
            ),
            "<script>boot</script>",
        )
    }

    // === Transition Tests ===

    #[test]
    fn test_buffers_until_marker() {
        let mut shell = collector();

        assert_eq!(shell.push(b"<main>".to_vec()).unwrap(), Feed::Buffered);
        assert_eq!(shell.push(b"hello</main>".to_vec()).unwrap(), Feed::Buffered);
        assert_eq!(shell.buffered(), 18);
        assert_eq!(shell.state(), ShellState::Collecting);

        let feed = shell.push(STREAM_ENDING.as_bytes().to_vec()).unwrap();
        assert_eq!(
            feed,
            Feed::Shell(
                "<html><head><script>boot</script></head><body><main>hello</main></body></html>"
                    .to_string()
            )
        );
        assert!(shell.is_ready());
    }

    #[test]
    fn test_marker_split_across_reads() {
        let mut shell = collector();
        let (head, tail) = STREAM_ENDING.as_bytes().split_at(8);

        let mut first = b"x".to_vec();
        first.extend_from_slice(head);
        assert_eq!(shell.push(first).unwrap(), Feed::Buffered);
        assert!(matches!(shell.push(tail.to_vec()).unwrap(), Feed::Shell(doc) if doc.contains("<body>x</body>")));
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let mut shell = collector();
        let bytes = "héllo".as_bytes();

        shell.push(bytes[..2].to_vec()).unwrap();
        shell.push(bytes[2..].to_vec()).unwrap();
        let feed = shell.push(STREAM_ENDING.as_bytes().to_vec()).unwrap();

        assert!(matches!(feed, Feed::Shell(doc) if doc.contains("<body>héllo</body>")));
    }

    #[test]
    fn test_never_flushes_twice() {
        let mut shell = collector();
        shell.push(STREAM_ENDING.as_bytes().to_vec()).unwrap();

        assert_eq!(shell.push(Vec::new()).unwrap(), Feed::Body(Vec::new()));
        assert_eq!(
            shell.push(STREAM_ENDING.as_bytes().to_vec()).unwrap(),
            Feed::Body(STREAM_ENDING.as_bytes().to_vec())
        );
        assert_eq!(shell.push(b"late".to_vec()).unwrap(), Feed::Body(b"late".to_vec()));
    }

    // === Failure Tests ===

    #[test]
    fn test_finish_without_marker() {
        let mut shell = collector();
        shell.push(b"<main>".to_vec()).unwrap();

        assert!(matches!(shell.finish(), Err(RenderError::ShellIncomplete)));
    }

    #[test]
    fn test_invalid_utf8_shell() {
        let mut shell = collector();
        let mut bytes = vec![0xff, 0xfe];
        bytes.extend_from_slice(STREAM_ENDING.as_bytes());

        assert!(matches!(shell.push(bytes), Err(RenderError::Encoding(_))));
    }
}
