//! Deterministic display snapshots
//!
//! A snapshot captures what an output area shows, one entry per visual
//! child, in a serializable form. Two areas fed the same outputs must
//! produce equal snapshots.

use serde::{Deserialize, Serialize};

use super::fragment::Fragment;
use super::tree::DisplayTree;

/// A snapshot of a display tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Visible children in order
    pub fragments: Vec<FragmentSnapshot>,
    /// Slots still waiting for a deferred render
    #[serde(default)]
    pub pending: usize,
}

/// Snapshot of one visual child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentSnapshot {
    /// Output kind, e.g. `output_text`, `output_html`, `output_error`
    pub kind: String,
    /// Serialized markup
    pub html: String,
}

impl From<&Fragment> for FragmentSnapshot {
    fn from(fragment: &Fragment) -> Self {
        FragmentSnapshot {
            kind: fragment.kind().unwrap_or("unknown").to_string(),
            html: fragment.to_html(),
        }
    }
}

impl Snapshot {
    pub fn from_tree(tree: &DisplayTree) -> Self {
        Snapshot {
            fragments: tree.children().map(FragmentSnapshot::from).collect(),
            pending: tree.pending(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Kinds of the visible children in order
    pub fn kinds(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.kind.as_str()).collect()
    }

    /// Compare rendered kinds and markup, ignoring pending slots
    pub fn content_equals(&self, other: &Snapshot) -> bool {
        self.fragments == other.fragments
    }
}
