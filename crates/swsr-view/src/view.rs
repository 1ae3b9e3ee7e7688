//! View tree.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use swsr_core::RenderError;
use swsr_data::Chunk;

/// A node of the component tree.
#[derive(Clone)]
pub enum View {
    /// Text content, escaped on output.
    Text(String),
    /// Pre-rendered markup, written as is.
    Raw(String),
    /// An element with attributes and children.
    Element(Element),
    /// A list of sibling views.
    Fragment(Vec<View>),
    /// A component evaluated at render time.
    Lazy(Lazy),
    /// A boundary that renders a chunk once it is available.
    Use(Use),
}

impl View {
    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a raw markup node.
    pub fn raw(html: impl Into<String>) -> Self {
        Self::Raw(html.into())
    }

    /// Create a fragment.
    pub fn fragment(children: impl IntoIterator<Item = View>) -> Self {
        Self::Fragment(children.into_iter().collect())
    }

    /// Create an empty view.
    pub fn empty() -> Self {
        Self::Fragment(Vec::new())
    }

    /// Create a component evaluated at render time.
    pub fn lazy<F>(component: F) -> Self
    where
        F: Fn() -> Result<View, RenderError> + Send + Sync + 'static,
    {
        Self::Lazy(Lazy(Arc::new(component)))
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Use> for View {
    fn from(boundary: Use) -> Self {
        Self::Use(boundary)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Raw(html) => f.debug_tuple("Raw").field(html).finish(),
            Self::Element(el) => el.fmt(f),
            Self::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
            Self::Use(boundary) => boundary.fmt(f),
        }
    }
}

/// An HTML element.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<View>,
}

impl Element {
    /// Create an element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Add a child.
    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Add several children.
    pub fn children(mut self, children: impl IntoIterator<Item = View>) -> Self {
        self.children.extend(children);
        self
    }

    /// Check if the element has no closing tag.
    pub fn is_void(&self) -> bool {
        matches!(
            self.tag.as_str(),
            "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
                | "source" | "track" | "wbr"
        )
    }
}

/// Component evaluated at render time.
#[derive(Clone)]
pub struct Lazy(Arc<dyn Fn() -> Result<View, RenderError> + Send + Sync>);

impl Lazy {
    /// Evaluate the component.
    pub fn render(&self) -> Result<View, RenderError> {
        (self.0)()
    }
}

/// What to render when a chunk failed.
#[derive(Clone)]
pub enum Rejected {
    /// A fixed replacement.
    Static(Box<View>),
    /// A replacement built from the failure message.
    With(Arc<dyn Fn(Option<&str>) -> View + Send + Sync>),
}

impl Rejected {
    /// Build the fallback for a failure message.
    pub fn render(&self, message: Option<&str>) -> View {
        match self {
            Self::Static(view) => (**view).clone(),
            Self::With(f) => f(message),
        }
    }
}

/// Boundary rendering a chunk.
///
/// Renders `children` with the chunk's data once it is resolved, `pending`
/// while it is not, and `rejected` (or nothing) when it failed.
#[derive(Clone)]
pub struct Use {
    pub(crate) name: Option<String>,
    pub(crate) chunk: Chunk,
    pub(crate) pending: Option<Box<View>>,
    pub(crate) rejected: Option<Rejected>,
    pub(crate) children: Arc<dyn Fn(&Value) -> View + Send + Sync>,
}

impl Use {
    /// Create a boundary for a chunk.
    pub fn new<F>(chunk: Chunk, children: F) -> Self
    where
        F: Fn(&Value) -> View + Send + Sync + 'static,
    {
        Self {
            name: None,
            chunk,
            pending: None,
            rejected: None,
            children: Arc::new(children),
        }
    }

    /// Name the boundary after its chunk, for error messages.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the view shown while the chunk is pending.
    pub fn pending(mut self, view: impl Into<View>) -> Self {
        self.pending = Some(Box::new(view.into()));
        self
    }

    /// Set a fixed view shown when the chunk failed.
    pub fn rejected(mut self, view: impl Into<View>) -> Self {
        self.rejected = Some(Rejected::Static(Box::new(view.into())));
        self
    }

    /// Set a view built from the failure message.
    pub fn rejected_with<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&str>) -> View + Send + Sync + 'static,
    {
        self.rejected = Some(Rejected::With(Arc::new(f)));
        self
    }

    /// Get the boundary's chunk.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub(crate) fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }

    pub(crate) fn render_resolved(&self, value: &Value) -> View {
        (self.children)(value)
    }

    pub(crate) fn render_rejected(&self, message: Option<&str>) -> View {
        self.rejected
            .as_ref()
            .map(|r| r.render(message))
            .unwrap_or_else(View::empty)
    }

    pub(crate) fn render_pending(&self) -> View {
        self.pending
            .as_deref()
            .cloned()
            .unwrap_or_else(View::empty)
    }
}

impl fmt::Debug for Use {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Use")
            .field("name", &self.name)
            .field("chunk", &self.chunk)
            .finish_non_exhaustive()
    }
}
