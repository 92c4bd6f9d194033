//! Kernel messages
//!
//! Only the `header.msg_type` and `content` parts of the envelope are read.
//! Output-bearing messages are projected into [`OutputRecord`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::bundle::MimeBundle;
use super::record::OutputRecord;

/// Message kinds that are expected on the output channel but carry no output
const IGNORED_KINDS: [&str; 4] = ["status", "execute_input", "comm_open", "comm_msg"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub msg_type: String,
}

/// An incoming kernel message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelMessage {
    pub header: Header,
    #[serde(default)]
    pub content: Value,
}

/// What a message asks the output area to do
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    /// `clear_output`, optionally deferred until the next output
    Clear { wait: bool },
    /// A message carrying one output
    Output(OutputRecord),
    /// A known message kind with nothing to display
    Ignored,
    /// A message kind this crate does not handle
    Unknown(String),
}

impl KernelMessage {
    pub fn new(msg_type: impl Into<String>, content: Value) -> Self {
        Self {
            header: Header {
                msg_type: msg_type.into(),
            },
            content,
        }
    }

    pub fn msg_type(&self) -> &str {
        &self.header.msg_type
    }

    /// Classify the message and project its content
    pub fn classify(&self) -> MessageKind {
        let content = &self.content;
        match self.msg_type() {
            "clear_output" => MessageKind::Clear {
                wait: content.get("wait").and_then(Value::as_bool).unwrap_or(false),
            },
            "stream" => MessageKind::Output(OutputRecord::stream(
                self.string_field("name"),
                self.string_field("text"),
            )),
            "display_data" => {
                let bundle = MimeBundle::from_parts(content.get("data"), content.get("metadata"));
                MessageKind::Output(OutputRecord::display_data(bundle.data, bundle.metadata))
            }
            "execute_result" => {
                let bundle = MimeBundle::from_parts(content.get("data"), content.get("metadata"));
                MessageKind::Output(OutputRecord::execute_result(
                    bundle.data,
                    bundle.metadata,
                    content.get("execution_count").and_then(Value::as_u64),
                ))
            }
            "error" => {
                let traceback = match content.get("traceback") {
                    Some(Value::Array(lines)) => lines
                        .iter()
                        .map(|line| match line {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect(),
                    Some(other) => {
                        warn!("error traceback is not a list: {}", other);
                        Vec::new()
                    }
                    None => Vec::new(),
                };
                MessageKind::Output(OutputRecord::error(
                    self.string_field("ename"),
                    self.string_field("evalue"),
                    traceback,
                ))
            }
            kind if IGNORED_KINDS.contains(&kind) => MessageKind::Ignored,
            kind => MessageKind::Unknown(kind.to_string()),
        }
    }

    /// A string field of the content, empty (with a warning) when missing
    fn string_field(&self, field: &str) -> String {
        match self.content.get(field) {
            Some(Value::String(s)) => s.clone(),
            other => {
                warn!(
                    "{} message has invalid {} field: {:?}",
                    self.msg_type(),
                    field,
                    other
                );
                String::new()
            }
        }
    }
}
