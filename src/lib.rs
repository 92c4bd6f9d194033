//! Display Area Library
//!
//! Renders the outputs of an interactive-computing kernel (streams, rich
//! MIME bundles, errors) into a visual area and keeps a serializable log of
//! what was shown.
//!
//! - `core`: Kernel messages, output records, MIME bundles, fragments, display tree
//! - `ansi`: ANSI SGR to markup transcoder
//! - `text`: Carriage-return flattening and URL autolinking
//! - `render`: Renderer trait, registry, built-in renderers, bundle resolution
//! - `sink`: Render target trait and failure isolation
//! - `area`: The output area controller
//! - `app`: Configuration

pub mod ansi;
pub mod app;
pub mod area;
pub mod core;
pub mod error;
pub mod render;
pub mod sink;
pub mod text;

pub use area::{AppendOutcome, Handled, NoopTypesetter, OutputArea, PendingRender, Typesetter};
pub use error::{AttachError, RenderError, ScriptError};
