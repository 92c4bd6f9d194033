//! MIME bundles
//!
//! A bundle maps MIME types to competing representations of one result,
//! plus per-type rendering hints. Bundles are built from each message,
//! validated, handed to the resolver and then dropped; the output record is
//! what gets stored.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

/// MIME type -> payload
pub type MimeData = Map<String, Value>;
/// MIME type -> rendering hints
pub type Metadata = Map<String, Value>;

pub const APPLICATION_JAVASCRIPT: &str = "application/javascript";
pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_PDF: &str = "application/pdf";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_SVG: &str = "image/svg+xml";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_LATEX: &str = "text/latex";
pub const TEXT_MARKDOWN: &str = "text/markdown";
pub const TEXT_PLAIN: &str = "text/plain";

/// Types whose output needs a typesetting pass once attached
pub const TYPESET_TYPES: [&str; 3] = [TEXT_LATEX, TEXT_HTML, TEXT_MARKDOWN];

/// The data and metadata of one display_data/execute_result output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MimeBundle {
    pub data: MimeData,
    pub metadata: Metadata,
}

impl MimeBundle {
    pub fn new(data: MimeData, metadata: Metadata) -> Self {
        Self { data, metadata }
    }

    /// Build a bundle from loosely typed message fields.
    ///
    /// A missing or non-object `data`/`metadata` becomes an empty map.
    pub fn from_parts(data: Option<&Value>, metadata: Option<&Value>) -> Self {
        Self {
            data: coerce_map("data", data),
            metadata: coerce_map("metadata", metadata),
        }
    }

    /// Drop every non-string payload except `application/json`
    pub fn validate(mut self) -> Self {
        self.data.retain(|mimetype, value| {
            if mimetype == APPLICATION_JSON || value.is_string() {
                true
            } else {
                warn!("Invalid type for {}: {}", mimetype, value);
                false
            }
        });
        self
    }

    pub fn payload(&self, mimetype: &str) -> Option<&Value> {
        self.data.get(mimetype)
    }

    pub fn contains(&self, mimetype: &str) -> bool {
        self.data.contains_key(mimetype)
    }

    /// Hints for one type; empty when absent or not an object
    pub fn metadata_for(&self, mimetype: &str) -> Metadata {
        match self.metadata.get(mimetype) {
            Some(Value::Object(map)) => map.clone(),
            _ => Metadata::new(),
        }
    }

    pub fn mimetypes(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn coerce_map(field: &str, value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            warn!("mimebundle {} is not an object: {}", field, other);
            Map::new()
        }
        None => {
            warn!("mimebundle missing {}", field);
            Map::new()
        }
    }
}

/// Deserialize a map field, accepting any JSON value and coercing
/// non-objects to an empty map
pub(crate) fn lenient_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => Map::new(),
        Some(other) => {
            warn!("Expected an object, found {}", other);
            Map::new()
        }
    })
}
