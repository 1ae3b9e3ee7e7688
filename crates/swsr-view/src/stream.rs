//! Suspending streaming render.
//!
//! The shell is every part of the tree that can be written without waiting:
//! a boundary whose chunk is still pending writes its `pending` view between
//! `<!--$?--><template id="B:n"></template>` and `<!--/$-->`. Each such
//! boundary is re-rendered once its chunk settles and written after the
//! shell as `<div hidden id="S:n">...</div>` plus a `$RC` call that moves
//! the content into place.

use std::collections::VecDeque;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, FuturesUnordered, StreamExt};
use swsr_core::{ByteStream, RenderError};
use swsr_data::{ChunkReader, ChunkState};

use crate::html::write_view;
use crate::view::{Use, View};

/// Client function swapping late boundary content into place.
pub const SWAP_RUNTIME: &str = concat!(
    "window.$RC=function(b,s){var t=document.getElementById(b),c=document.getElementById(s);",
    "if(!t||!c)return;var p=t.parentNode,m=t.previousSibling,x=t.nextSibling,d=0;",
    "while(x){var n=x.nextSibling;if(x.nodeType===8){if(x.data===\"/$\"){if(d===0)break;d--}",
    "else if(x.data===\"$?\"||x.data===\"$\")d++}p.removeChild(x);x=n}",
    "while(c.firstChild)p.insertBefore(c.firstChild,x);p.removeChild(t);",
    "c.parentNode.removeChild(c);if(m&&m.nodeType===8)m.data=\"$\"}"
);

#[derive(Default)]
struct BoundaryQueue {
    next_id: usize,
    runtime_sent: bool,
    pending: FuturesUnordered<BoxFuture<'static, (usize, Use)>>,
}

impl BoundaryQueue {
    /// Write a pending boundary's placeholder and schedule its content.
    fn suspend(&mut self, boundary: &Use, out: &mut String) -> Result<(), RenderError> {
        let id = self.next_id;
        self.next_id += 1;

        let settled = boundary.chunk().settled();
        let late = boundary.clone();
        self.pending.push(
            async move {
                let _ = settled.await;
                (id, late)
            }
            .boxed(),
        );

        out.push_str(&format!("<!--$?--><template id=\"B:{}\"></template>", id));
        write_view(&boundary.render_pending(), out, &mut |b: &Use, o: &mut String| {
            self.suspend(b, o)
        })?;
        out.push_str("<!--/$-->");
        Ok(())
    }

    fn write_shell(&mut self, view: &View) -> Result<String, RenderError> {
        let mut out = String::new();
        write_view(view, &mut out, &mut |b: &Use, o: &mut String| self.suspend(b, o))?;
        Ok(out)
    }

    /// Render a settled boundary's content.
    fn complete(&mut self, id: usize, boundary: &Use) -> Result<String, RenderError> {
        let reader = ChunkReader::new(boundary.chunk().clone());
        let view = match reader.read() {
            ChunkState::Ready(value) => boundary.render_resolved(value),
            ChunkState::Failed(message) => boundary.render_rejected(message),
            ChunkState::Pending(_) => {
                return Err(RenderError::Stream(format!(
                    "boundary {} woke before its chunk settled",
                    boundary.label()
                )))
            }
        };

        let mut out = String::new();
        if !self.runtime_sent {
            out.push_str("<script>");
            out.push_str(SWAP_RUNTIME);
            out.push_str("</script>");
            self.runtime_sent = true;
        }
        out.push_str(&format!("<div hidden id=\"S:{}\">", id));
        write_view(&view, &mut out, &mut |b: &Use, o: &mut String| self.suspend(b, o))?;
        out.push_str(&format!(
            "</div><script>$RC(\"B:{0}\",\"S:{0}\")</script>",
            id
        ));
        Ok(out)
    }
}

struct StreamState {
    shell: VecDeque<Result<Vec<u8>, RenderError>>,
    queue: BoundaryQueue,
    done: bool,
}

/// Render a view as a byte stream.
///
/// Each top-level child of a root fragment becomes its own shell item, so
/// consumers see the shell arrive in pieces. Late boundary content follows
/// in settlement order. The first error ends the stream.
pub fn render_to_stream(view: View) -> ByteStream {
    let roots = match view {
        View::Fragment(children) => children,
        other => vec![other],
    };

    let mut queue = BoundaryQueue::default();
    let mut shell = VecDeque::with_capacity(roots.len());
    for root in &roots {
        match queue.write_shell(root) {
            Ok(html) => shell.push_back(Ok(html.into_bytes())),
            Err(e) => {
                shell.push_back(Err(e));
                break;
            }
        }
    }

    let state = StreamState {
        shell,
        queue,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }

        if let Some(item) = state.shell.pop_front() {
            state.done = item.is_err();
            return Some((item, state));
        }

        let (id, boundary) = state.queue.pending.next().await?;
        let item = state.queue.complete(id, &boundary).map(String::into_bytes);
        state.done = item.is_err();
        Some((item, state))
    })
    .boxed()
}
