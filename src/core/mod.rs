//! Output data model
//!
//! Platform-independent types shared by the pipeline:
//! - Kernel messages and their projection into output records
//! - MIME bundles and their validation
//! - Rendered fragments and the in-memory display tree
//! - Deterministic snapshots of what is displayed

mod bundle;
mod fragment;
mod message;
mod record;
mod snapshot;
mod tree;

pub use bundle::{
    Metadata, MimeBundle, MimeData, APPLICATION_JAVASCRIPT, APPLICATION_JSON, APPLICATION_PDF,
    IMAGE_JPEG, IMAGE_PNG, IMAGE_SVG, TEXT_HTML, TEXT_LATEX, TEXT_MARKDOWN, TEXT_PLAIN,
    TYPESET_TYPES,
};
pub use fragment::{Fragment, Node};
pub use message::{Header, KernelMessage, MessageKind};
pub use record::{
    DisplayData, ErrorOutput, ExecuteResult, OutputRecord, OutputType, StreamOutput,
    UnrecognizedOutput,
};
pub use snapshot::{FragmentSnapshot, Snapshot};
pub use tree::{DisplayTree, SlotId};
