//! Synchronous HTML rendering.

use swsr_core::RenderError;
use swsr_data::{ChunkReader, ChunkState};

use crate::view::{Element, Use, View};

/// Escape text content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Render a view to a complete string.
///
/// Every chunk must already be settled: a pending chunk here means the
/// caller skipped collection, and is reported as `Suspended`.
pub fn render_to_string(view: &View) -> Result<String, RenderError> {
    let mut out = String::new();
    write_view(view, &mut out, &mut |boundary: &Use, _out: &mut String| {
        Err(RenderError::Suspended(boundary.label()))
    })?;
    Ok(out)
}

/// Handler for a boundary whose chunk is still pending.
pub(crate) type OnPending<'a> =
    dyn FnMut(&Use, &mut String) -> Result<(), RenderError> + 'a;

/// Write a view, delegating pending boundaries to `on_pending`.
pub(crate) fn write_view(
    view: &View,
    out: &mut String,
    on_pending: &mut OnPending<'_>,
) -> Result<(), RenderError> {
    match view {
        View::Text(text) => out.push_str(&escape_html(text)),
        View::Raw(html) => out.push_str(html),
        View::Element(el) => write_element(el, out, on_pending)?,
        View::Fragment(children) => {
            for child in children {
                write_view(child, out, on_pending)?;
            }
        }
        View::Lazy(lazy) => write_view(&lazy.render()?, out, on_pending)?,
        View::Use(boundary) => {
            let reader = ChunkReader::new(boundary.chunk().clone());
            match reader.read() {
                ChunkState::Ready(value) => {
                    write_view(&boundary.render_resolved(value), out, on_pending)?
                }
                ChunkState::Failed(message) => {
                    write_view(&boundary.render_rejected(message), out, on_pending)?
                }
                ChunkState::Pending(_) => on_pending(boundary, out)?,
            }
        }
    }
    Ok(())
}

fn write_element(
    el: &Element,
    out: &mut String,
    on_pending: &mut OnPending<'_>,
) -> Result<(), RenderError> {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
    out.push('>');

    if el.is_void() {
        return Ok(());
    }

    for child in &el.children {
        write_view(child, out, on_pending)?;
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
    Ok(())
}
