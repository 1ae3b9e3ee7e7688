//! Bootstrap and settlement script wire format.
//!
//! Every document produced by a renderer carries one bootstrap script in
//! place of the script placeholder:
//!
//! ```text
//! string: <script id="swsr-runtime">window.__SWSR_MODE__='string';window.__SWSR_CHUNKS__={..};</script>
//! stream: <script id="swsr-runtime">window.__SWSR_MODE__='stream';{runtime};__SWSR_CREATE_CONNECTIONS__([..]);</script>
//! ```
//!
//! In stream mode the document is followed by zero or more settlement
//! scripts, one per chunk:
//!
//! ```text
//! <script>window.__SWSR_CHUNK_CONNECTIONS__["name"].resolve(<json>)</script>
//! <script>window.__SWSR_CHUNK_CONNECTIONS__["name"].reject(<json string>?)</script>
//! ```
//!
//! All JSON embedded in a script is escaped so it cannot terminate the
//! surrounding `<script>` element.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::mode::RenderMode;

/// Placeholder replaced by the rendered markup.
pub const CONTENT_PLACEHOLDER: &str = "<!-- __SWSR_CONTENT_PLACEHOLDER__ -->";

/// Placeholder replaced by the bootstrap script.
pub const SCRIPT_PLACEHOLDER: &str = "<!-- __SWSR_SCRIPT_PLACEHOLDER__ -->";

/// End-of-shell marker appended after the component tree in stream mode.
pub const STREAM_ENDING: &str = "__SWSR_STREAM_ENDING__";

/// Id of the bootstrap script element.
pub const RUNTIME_SCRIPT_ID: &str = "swsr-runtime";

/// Page-global mode marker.
pub const MODE_GLOBAL: &str = "window.__SWSR_MODE__";

/// Page-global literal chunk map (string mode).
pub const CHUNKS_GLOBAL: &str = "window.__SWSR_CHUNKS__";

/// Page-global connection table (stream mode).
pub const CONNECTIONS_GLOBAL: &str = "window.__SWSR_CHUNK_CONNECTIONS__";

/// Registry creation entry point defined by [`STREAM_RUNTIME`].
pub const CREATE_CONNECTIONS: &str = "__SWSR_CREATE_CONNECTIONS__";

/// Key of the failure marker embedded in the string-mode chunk map.
pub const ERROR_MARKER_KEY: &str = "__SWSR_ERROR__";

/// Name given to errors raised by rejected connections on the client.
pub const CHUNK_ERROR_NAME: &str = "SwsrChunkError";

/// Client runtime for stream mode.
///
/// Creates one connection per chunk name. A connection settles at most
/// once; later resolve/reject calls are ignored.
pub const STREAM_RUNTIME: &str = concat!(
    "function __SWSR_CREATE_CONNECTIONS__(n){var t={};n.forEach(function(k){",
    "var c={status:0};c.promise=new Promise(function(y,x){",
    "c.resolve=function(v){if(c.status)return;c.status=1;c.data=v;y(v)};",
    "c.reject=function(m){if(c.status)return;c.status=2;var e=Error(m);",
    "e.name=\"SwsrChunkError\";c.error=e;x(e)}});",
    "c.promise.catch(function(){});t[k]=c});",
    "window.__SWSR_CHUNK_CONNECTIONS__=t}"
);

/// Error for malformed swsr scripts.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("Unterminated script element at byte {0}")]
    Unterminated(usize),

    #[error("Malformed {kind} script: {detail}")]
    Malformed { kind: &'static str, detail: String },

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl WireError {
    fn malformed(kind: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            detail: detail.into(),
        }
    }
}

/// One swsr call found in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCall {
    /// `window.__SWSR_MODE__='...'`
    Mode(RenderMode),
    /// `window.__SWSR_CHUNKS__={...}`
    EmbedChunks(Map<String, Value>),
    /// `__SWSR_CREATE_CONNECTIONS__([...])`
    CreateConnections(Vec<String>),
    /// `window.__SWSR_CHUNK_CONNECTIONS__["name"].resolve(value)`
    Resolve { name: String, value: Value },
    /// `window.__SWSR_CHUNK_CONNECTIONS__["name"].reject(message?)`
    Reject {
        name: String,
        message: Option<String>,
    },
}

/// Build the template version marker for a build version.
pub fn version_marker(version: &str) -> String {
    format!("<!-- __SWSR_VERSION_{}__ -->", version)
}

/// Serialize a value as JSON that is safe to inline in a `<script>`.
pub fn to_script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(escape_script_json(&json))
}

/// Escape characters that could end the script element or the JS string.
///
/// These characters only ever appear inside JSON strings, where the
/// `\uXXXX` form is equivalent.
fn escape_script_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Bootstrap script for a string-mode document.
///
/// `chunks` is the already-built literal chunk map.
pub fn string_bootstrap<T: Serialize + ?Sized>(chunks: &T) -> Result<String, serde_json::Error> {
    Ok(format!(
        "<script id=\"{}\">{}='string';{}={};</script>",
        RUNTIME_SCRIPT_ID,
        MODE_GLOBAL,
        CHUNKS_GLOBAL,
        to_script_json(chunks)?
    ))
}

/// Bootstrap script for a stream-mode shell.
pub fn stream_bootstrap<S: AsRef<str>>(names: &[S]) -> Result<String, serde_json::Error> {
    let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    Ok(format!(
        "<script id=\"{}\">{}='stream';{};{}({});</script>",
        RUNTIME_SCRIPT_ID,
        MODE_GLOBAL,
        STREAM_RUNTIME,
        CREATE_CONNECTIONS,
        to_script_json(&names)?
    ))
}

/// Settlement script resolving a connection.
pub fn resolve_script(name: &str, value: &Value) -> Result<String, serde_json::Error> {
    Ok(format!(
        "<script>{}[{}].resolve({})</script>",
        CONNECTIONS_GLOBAL,
        to_script_json(name)?,
        to_script_json(value)?
    ))
}

/// Settlement script rejecting a connection.
pub fn reject_script(name: &str, message: Option<&str>) -> Result<String, serde_json::Error> {
    let message = match message {
        Some(m) => to_script_json(m)?,
        None => String::new(),
    };
    Ok(format!(
        "<script>{}[{}].reject({})</script>",
        CONNECTIONS_GLOBAL,
        to_script_json(name)?,
        message
    ))
}

/// Extract every swsr call from an HTML document or fragment, in order.
///
/// Scripts that are not part of the swsr protocol are skipped.
pub fn parse_document(html: &str) -> Result<Vec<ScriptCall>, WireError> {
    let mut calls = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = html[cursor..].find("<script") {
        let open = cursor + offset;
        let body_start = html[open..]
            .find('>')
            .map(|i| open + i + 1)
            .ok_or(WireError::Unterminated(open))?;
        let body_end = html[body_start..]
            .find("</script>")
            .map(|i| body_start + i)
            .ok_or(WireError::Unterminated(open))?;

        parse_script(&html[body_start..body_end], &mut calls)?;
        cursor = body_end + "</script>".len();
    }

    Ok(calls)
}

fn parse_script(body: &str, calls: &mut Vec<ScriptCall>) -> Result<(), WireError> {
    if let Some(rest) = body.strip_prefix(MODE_GLOBAL) {
        return parse_bootstrap(rest, calls);
    }
    if let Some(rest) = body.strip_prefix(CONNECTIONS_GLOBAL) {
        calls.push(parse_settlement(rest)?);
    }
    Ok(())
}

fn parse_bootstrap(rest: &str, calls: &mut Vec<ScriptCall>) -> Result<(), WireError> {
    let rest = rest
        .strip_prefix("='")
        .ok_or_else(|| WireError::malformed("bootstrap", "missing mode assignment"))?;
    let end = rest
        .find('\'')
        .ok_or_else(|| WireError::malformed("bootstrap", "unterminated mode"))?;
    let mode: RenderMode = rest[..end]
        .parse()
        .map_err(|e: crate::UnknownRenderMode| WireError::malformed("bootstrap", e.to_string()))?;
    calls.push(ScriptCall::Mode(mode));

    let rest = rest[end + 1..].trim_start_matches(';');
    match mode {
        RenderMode::String => {
            let payload = rest
                .strip_prefix(CHUNKS_GLOBAL)
                .and_then(|r| r.strip_prefix('='))
                .and_then(|r| r.trim_end().strip_suffix(';'))
                .ok_or_else(|| WireError::malformed("bootstrap", "missing chunk map"))?;
            calls.push(ScriptCall::EmbedChunks(serde_json::from_str(payload)?));
        }
        RenderMode::Stream => {
            let call = format!("{}(", CREATE_CONNECTIONS);
            let start = rest
                .rfind(&call)
                .ok_or_else(|| WireError::malformed("bootstrap", "missing registry creation"))?;
            let payload = rest[start + call.len()..]
                .trim_end()
                .strip_suffix(");")
                .ok_or_else(|| WireError::malformed("bootstrap", "unterminated registry creation"))?;
            calls.push(ScriptCall::CreateConnections(serde_json::from_str(payload)?));
        }
    }

    Ok(())
}

fn parse_settlement(rest: &str) -> Result<ScriptCall, WireError> {
    let rest = rest
        .strip_prefix('[')
        .ok_or_else(|| WireError::malformed("settlement", "missing connection key"))?;

    // The key is a JSON string; find the `]` that closes a valid one.
    let mut search = 0;
    let (name, rest) = loop {
        let close = rest[search..]
            .find("\"]")
            .map(|i| search + i + 1)
            .ok_or_else(|| WireError::malformed("settlement", "unterminated connection key"))?;
        if let Ok(name) = serde_json::from_str::<String>(&rest[..close]) {
            break (name, &rest[close + 1..]);
        }
        search = close;
    };

    let payload = |method: &str| {
        rest.strip_prefix(method)
            .and_then(|r| r.strip_prefix('('))
            .and_then(|r| r.trim_end().strip_suffix(')'))
    };

    if let Some(json) = payload(".resolve") {
        let value = serde_json::from_str(json)?;
        return Ok(ScriptCall::Resolve { name, value });
    }
    if let Some(json) = payload(".reject") {
        let message = if json.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(json)?)
        };
        return Ok(ScriptCall::Reject { name, message });
    }

    Err(WireError::malformed("settlement", format!("unknown call on '{}'", name)))
}
