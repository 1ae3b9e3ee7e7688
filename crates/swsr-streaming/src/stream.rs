//! Incremental stream-mode renderer.
//!
//! Output order is fixed: the shell document first, then render output and
//! settlement scripts as they become available. Settlements that happen
//! while the shell is still being collected are queued and written right
//! after it, so a settlement script never runs before the registry it
//! calls into exists. Output closes when the render completes.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, FuturesUnordered, Stream, StreamExt};
use swsr_core::{wire, ByteStream, RenderError, RenderMode, Template, TimingContext};
use swsr_data::{ChunkMap, ChunkResult};
use swsr_view::{render_to_stream, App, RenderContext, View};

use crate::shell::{Feed, ShellCollector};

type Settlement = BoxFuture<'static, (String, ChunkResult)>;

/// Renders the shell as soon as it is ready and streams the rest.
#[derive(Debug, Clone)]
pub struct StreamRenderer {
    template: Template,
}

impl StreamRenderer {
    /// Create a renderer for a template.
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    /// Start a stream render.
    ///
    /// Resolves once the shell document is ready, with a body whose first
    /// item is that document. Any failure up to that point is returned
    /// here and nothing has been emitted. A failure afterwards is yielded
    /// as the body's last item.
    pub async fn render(&self, app: &dyn App, chunks: ChunkMap) -> Result<ByteStream, RenderError> {
        let cx = RenderContext::new(chunks.clone(), RenderMode::Stream);
        let view = app.render(&cx)?;
        let body = render_to_stream(View::fragment([view, View::raw(wire::STREAM_ENDING)]));

        let bootstrap = wire::stream_bootstrap(&chunks.names())?;
        let settlements = chunks
            .iter()
            .map(|(name, chunk)| {
                let name = name.to_string();
                let settled = chunk.settled();
                async move { (name, settled.await) }.boxed()
            })
            .collect();

        let mut output = RenderStream {
            body: Some(body),
            settlements,
            shell: ShellCollector::new(self.template.clone(), bootstrap),
            queued: VecDeque::new(),
            timing: TimingContext::new(),
            phase: Phase::CollectingShell,
        };

        match output.next().await {
            Some(Ok(shell)) => Ok(stream::once(async move { Ok(shell) })
                .chain(output)
                .boxed()),
            Some(Err(e)) => Err(e),
            None => Err(RenderError::ShellIncomplete),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    CollectingShell,
    ShellReady,
    Done,
}

struct RenderStream {
    body: Option<ByteStream>,
    settlements: FuturesUnordered<Settlement>,
    shell: ShellCollector,
    queued: VecDeque<String>,
    timing: TimingContext,
    phase: Phase,
}

impl RenderStream {
    fn settlement_script(&mut self, name: &str, result: &ChunkResult) -> Result<String, RenderError> {
        self.timing.mark_chunk_settled(name);
        tracing::debug!(
            chunk = name,
            ok = result.is_ok(),
            elapsed_us = self.timing.elapsed().as_micros() as u64,
            "chunk settled"
        );

        let script = match result {
            Ok(value) => wire::resolve_script(name, value)?,
            Err(error) => wire::reject_script(name, error.message())?,
        };
        Ok(script)
    }

    fn fail(&mut self, error: RenderError) -> Poll<Option<Result<Vec<u8>, RenderError>>> {
        self.phase = Phase::Done;
        self.body = None;
        Poll::Ready(Some(Err(error)))
    }

    /// Move every settlement that has already happened into the queue.
    fn drain_settled(&mut self, cx: &mut Context<'_>) -> Result<(), RenderError> {
        while let Poll::Ready(Some((name, result))) = self.settlements.poll_next_unpin(cx) {
            let script = self.settlement_script(&name, &result)?;
            self.queued.push_back(script);
        }
        Ok(())
    }

    fn poll_collecting(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Vec<u8>, RenderError>>> {
        // Keep the data sources running while the shell renders.
        if let Err(e) = self.drain_settled(cx) {
            return self.fail(e);
        }

        let Some(body) = self.body.as_mut() else {
            return self.fail(RenderError::ShellIncomplete);
        };

        loop {
            match body.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(bytes))) => match self.shell.push(bytes) {
                    Ok(Feed::Shell(document)) => {
                        self.phase = Phase::ShellReady;
                        self.timing.mark("shell_sent");
                        tracing::debug!(
                            queued = self.queued.len(),
                            elapsed_us = self.timing.elapsed().as_micros() as u64,
                            "shell flushed"
                        );
                        return Poll::Ready(Some(Ok(document.into_bytes())));
                    }
                    Ok(Feed::Buffered | Feed::Body(_)) => continue,
                    Err(e) => return self.fail(e),
                },
                Poll::Ready(Some(Err(e))) => return self.fail(e),
                Poll::Ready(None) => {
                    let error = match self.shell.finish() {
                        Ok(()) => RenderError::ShellIncomplete,
                        Err(e) => e,
                    };
                    return self.fail(error);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    /// Output ends with the render itself. Settlements that have happened
    /// by then are still written; chunks that are still pending are dropped
    /// and stay pending on the page.
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Vec<u8>, RenderError>>> {
        if let Some(script) = self.queued.pop_front() {
            return Poll::Ready(Some(Ok(script.into_bytes())));
        }

        if self.body.is_some() {
            if let Poll::Ready(Some((name, result))) = self.settlements.poll_next_unpin(cx) {
                return match self.settlement_script(&name, &result) {
                    Ok(script) => Poll::Ready(Some(Ok(script.into_bytes()))),
                    Err(e) => self.fail(e),
                };
            }
        }

        if let Some(body) = self.body.as_mut() {
            match body.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(bytes))) => return Poll::Ready(Some(Ok(bytes))),
                Poll::Ready(Some(Err(e))) => return self.fail(e),
                Poll::Ready(None) => {
                    self.body = None;
                    if let Err(e) = self.drain_settled(cx) {
                        return self.fail(e);
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }

        if let Some(script) = self.queued.pop_front() {
            return Poll::Ready(Some(Ok(script.into_bytes())));
        }

        self.phase = Phase::Done;
        tracing::debug!(
            unsettled = self.settlements.len(),
            elapsed_us = self.timing.elapsed().as_micros() as u64,
            "stream render complete"
        );
        Poll::Ready(None)
    }
}

impl Stream for RenderStream {
    type Item = Result<Vec<u8>, RenderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.phase {
            Phase::CollectingShell => this.poll_collecting(cx),
            Phase::ShellReady => this.poll_ready(cx),
            Phase::Done => Poll::Ready(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::future;
    use serde_json::json;
    use std::time::Duration;
    use swsr_core::wire::ScriptCall;
    use swsr_data::{Chunk, ChunkError};

    const TEMPLATE: &str = "<html><head><!-- __SWSR_SCRIPT_PLACEHOLDER__ --></head><body><!-- __SWSR_CONTENT_PLACEHOLDER__ --></body></html>";

    fn controlled() -> (oneshot::Sender<ChunkResult>, Chunk) {
        let (tx, rx) = oneshot::channel::<ChunkResult>();
        let chunk = Chunk::pending(async move {
            rx.await.unwrap_or_else(|_| Err(ChunkError::new("canceled")))
        });
        (tx, chunk)
    }

    fn app(cx: &RenderContext) -> Result<View, RenderError> {
        let boundaries = cx.chunks().names().into_iter().map(|name| {
            View::from(cx.use_chunk(name, |v| View::text(v.to_string())).pending("…"))
        });
        Ok(View::fragment(boundaries.collect::<Vec<_>>()))
    }

    fn renderer() -> StreamRenderer {
        StreamRenderer::new(Template::new(TEMPLATE))
    }

    async fn next_text(body: &mut ByteStream) -> String {
        let bytes = body.next().await.expect("body ended").expect("body failed");
        String::from_utf8(bytes).unwrap()
    }

    // === Shell Tests ===

    #[tokio::test]
    async fn test_shell_is_first_item() {
        let (_tx, c) = controlled();
        let chunks: ChunkMap = [("c", c)].into_iter().collect();

        let mut body = renderer().render(&app, chunks).await.unwrap();
        let shell = next_text(&mut body).await;

        assert!(shell.starts_with("<html><head><script id=\"swsr-runtime\">window.__SWSR_MODE__='stream';"));
        assert!(shell.contains("__SWSR_CREATE_CONNECTIONS__([\"c\"]);</script>"));
        assert!(shell.contains("<body><!--$?--><template id=\"B:0\"></template>…<!--/$--></body>"));
        assert!(!shell.contains(wire::STREAM_ENDING));
    }

    #[tokio::test]
    async fn test_settlement_after_shell_written_once() {
        let (tx, c) = controlled();
        let chunks: ChunkMap = [("c", c)].into_iter().collect();

        let mut body = renderer().render(&app, chunks).await.unwrap();
        let shell = next_text(&mut body).await;
        tx.send(Ok(json!({"title": "hello"}))).unwrap();

        let rest: Vec<String> = body
            .map(|item| String::from_utf8(item.unwrap()).unwrap())
            .collect()
            .await;
        let document = format!("{}{}", shell, rest.concat());

        let resolutions: Vec<_> = wire::parse_document(&document)
            .unwrap()
            .into_iter()
            .filter(|call| matches!(call, ScriptCall::Resolve { .. }))
            .collect();
        assert_eq!(
            resolutions,
            vec![ScriptCall::Resolve {
                name: "c".into(),
                value: json!({"title": "hello"})
            }]
        );
        assert!(document.contains("$RC(\"B:0\",\"S:0\")"));
    }

    #[tokio::test]
    async fn test_pre_shell_settlements_queued_behind_shell() {
        let chunks: ChunkMap = [
            ("a", Chunk::pending(async { Ok(json!(1)) })),
            ("b", Chunk::pending(async { Err(ChunkError::without_message()) })),
        ]
        .into_iter()
        .collect();

        let items: Vec<String> = renderer()
            .render(&app, chunks)
            .await
            .unwrap()
            .map(|item| String::from_utf8(item.unwrap()).unwrap())
            .collect()
            .await;

        assert!(items[0].contains(wire::CREATE_CONNECTIONS));
        let a = wire::resolve_script("a", &json!(1)).unwrap();
        let b = wire::reject_script("b", None).unwrap();
        assert_eq!(items.iter().filter(|i| **i == a).count(), 1);
        assert_eq!(items.iter().filter(|i| **i == b).count(), 1);
        assert!(items.iter().skip(1).all(|i| !i.contains(wire::CREATE_CONNECTIONS)));
    }

    #[tokio::test]
    async fn test_output_closes_with_render_not_with_unread_chunks() {
        let chunks: ChunkMap = [
            ("ready", Chunk::pending(async { Ok(json!(1)) })),
            ("hanging", Chunk::pending(future::pending::<ChunkResult>())),
        ]
        .into_iter()
        .collect();
        let page = |_: &RenderContext| -> Result<View, RenderError> { Ok(View::text("static")) };

        let body = renderer().render(&page, chunks).await.unwrap();
        let items = tokio::time::timeout(Duration::from_millis(300), body.collect::<Vec<_>>())
            .await
            .expect("output stayed open");
        let document: String = items
            .into_iter()
            .map(|item| String::from_utf8(item.unwrap()).unwrap())
            .collect();

        assert!(document.contains(&wire::resolve_script("ready", &json!(1)).unwrap()));
        assert!(!document.contains("[\"hanging\"].re"));
    }

    // === Failure Tests ===

    #[tokio::test]
    async fn test_sync_render_error_before_emission() {
        let failing = |_: &RenderContext| -> Result<View, RenderError> {
            Err(RenderError::Render("component threw".into()))
        };

        let result = renderer().render(&failing, ChunkMap::new()).await;

        assert!(matches!(result, Err(RenderError::Render(_))));
    }

    #[tokio::test]
    async fn test_shell_error_before_emission() {
        let failing = |_: &RenderContext| -> Result<View, RenderError> {
            Ok(View::lazy(|| Err(RenderError::Render("threw in shell".into()))))
        };

        let result = renderer().render(&failing, ChunkMap::new()).await;

        assert!(matches!(result, Err(RenderError::Render(_))));
    }

    #[tokio::test]
    async fn test_late_error_ends_body() {
        let (tx, c) = controlled();
        let chunks: ChunkMap = [("c", c)].into_iter().collect();
        let late = |cx: &RenderContext| -> Result<View, RenderError> {
            Ok(cx
                .use_chunk("c", |_| View::lazy(|| Err(RenderError::Render("late".into()))))
                .into())
        };

        let mut body = renderer().render(&late, chunks).await.unwrap();
        next_text(&mut body).await;
        tx.send(Ok(json!(1))).unwrap();

        let mut saw_error = false;
        while let Some(item) = body.next().await {
            if item.is_err() {
                saw_error = true;
                break;
            }
        }
        assert!(saw_error);
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn test_reader_sees_streamed_value() {
        let (tx, c) = controlled();
        let chunks: ChunkMap = [("c", c.clone())].into_iter().collect();

        let body = renderer().render(&app, chunks).await.unwrap();
        tx.send(Ok(json!("X"))).unwrap();
        let _: Vec<_> = body.collect().await;

        let reader = swsr_data::ChunkReader::new(c);
        assert!(matches!(reader.read(), swsr_data::ChunkState::Ready(v) if *v == json!("X")));
    }
}
