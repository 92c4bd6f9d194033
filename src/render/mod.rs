//! Renderers and their selection
//!
//! - `registry`: the [`Renderer`] capability and the ordered registry
//! - `builtin`: renderers for the fixed MIME catalog
//! - `script`: opt-in script evaluation behind a [`ScriptEngine`]
//! - `resolver`: picks the richest renderable representation of a bundle

mod builtin;
mod registry;
mod resolver;
mod script;

pub use builtin::{
    ConsoleTextRenderer, HtmlRenderer, ImageRenderer, LatexRenderer, MarkdownRenderer,
    PdfRenderer, StreamRenderer, SvgRenderer, TracebackRenderer, CONSOLE_TEXT, STREAM, TRACEBACK,
};
pub use registry::{FnRenderer, Renderer, RendererRegistry};
pub(crate) use resolver::render_as;
pub use resolver::{DisplayOrder, MimeBundleResolver, Resolved, Selection, DEFAULT_DISPLAY_ORDER};
pub use script::{ScriptEngine, ScriptRenderer};
