//! Output records
//!
//! The serializable log of what an output area has shown. Records use the
//! notebook output JSON shape, tagged by `output_type`. Unknown output types
//! are kept verbatim so that a saved document round-trips.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::bundle::{lenient_map, Metadata, MimeBundle, MimeData};

/// The kind of an output record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Stream,
    DisplayData,
    ExecuteResult,
    Error,
    Unrecognized,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputType::Stream => "stream",
            OutputType::DisplayData => "display_data",
            OutputType::ExecuteResult => "execute_result",
            OutputType::Error => "error",
            OutputType::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

/// stdout/stderr text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamOutput {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "multiline_text")]
    pub text: String,
}

/// A displayed MIME bundle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayData {
    #[serde(default, deserialize_with = "lenient_map")]
    pub data: MimeData,
    #[serde(default, deserialize_with = "lenient_map")]
    pub metadata: Metadata,
}

/// The value of an executed expression
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecuteResult {
    #[serde(default, deserialize_with = "lenient_map")]
    pub data: MimeData,
    #[serde(default, deserialize_with = "lenient_map")]
    pub metadata: Metadata,
    #[serde(default)]
    pub execution_count: Option<u64>,
}

/// A raised exception
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorOutput {
    #[serde(default)]
    pub ename: String,
    #[serde(default)]
    pub evalue: String,
    #[serde(default)]
    pub traceback: Vec<String>,
}

impl ErrorOutput {
    /// Traceback lines joined as console text, or `None` when empty
    pub fn traceback_text(&self) -> Option<String> {
        if self.traceback.is_empty() {
            return None;
        }
        let mut text = String::new();
        for line in &self.traceback {
            text.push_str(line);
            text.push('\n');
        }
        text.push('\n');
        Some(text)
    }
}

/// An output of a type this crate does not know, kept as-is
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnrecognizedOutput {
    #[serde(default)]
    pub output_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One logged unit of kernel output
#[derive(Debug, Clone, PartialEq)]
pub enum OutputRecord {
    Stream(StreamOutput),
    DisplayData(DisplayData),
    ExecuteResult(ExecuteResult),
    Error(ErrorOutput),
    Unrecognized(UnrecognizedOutput),
}

impl OutputRecord {
    pub fn stream(name: impl Into<String>, text: impl Into<String>) -> Self {
        OutputRecord::Stream(StreamOutput {
            name: name.into(),
            text: text.into(),
        })
    }

    pub fn display_data(data: MimeData, metadata: Metadata) -> Self {
        OutputRecord::DisplayData(DisplayData { data, metadata })
    }

    pub fn execute_result(data: MimeData, metadata: Metadata, execution_count: Option<u64>) -> Self {
        OutputRecord::ExecuteResult(ExecuteResult {
            data,
            metadata,
            execution_count,
        })
    }

    pub fn error(
        ename: impl Into<String>,
        evalue: impl Into<String>,
        traceback: Vec<String>,
    ) -> Self {
        OutputRecord::Error(ErrorOutput {
            ename: ename.into(),
            evalue: evalue.into(),
            traceback,
        })
    }

    pub fn output_type(&self) -> OutputType {
        match self {
            OutputRecord::Stream(_) => OutputType::Stream,
            OutputRecord::DisplayData(_) => OutputType::DisplayData,
            OutputRecord::ExecuteResult(_) => OutputType::ExecuteResult,
            OutputRecord::Error(_) => OutputType::Error,
            OutputRecord::Unrecognized(_) => OutputType::Unrecognized,
        }
    }

    /// The bundle of a display_data or execute_result record
    pub fn bundle(&self) -> Option<MimeBundle> {
        match self {
            OutputRecord::DisplayData(output) => Some(MimeBundle::new(
                output.data.clone(),
                output.metadata.clone(),
            )),
            OutputRecord::ExecuteResult(output) => Some(MimeBundle::new(
                output.data.clone(),
                output.metadata.clone(),
            )),
            _ => None,
        }
    }

    /// Replace the data of a bundle-carrying record with validated data
    pub(crate) fn set_data(&mut self, data: MimeData) {
        match self {
            OutputRecord::DisplayData(output) => output.data = data,
            OutputRecord::ExecuteResult(output) => output.data = data,
            _ => {}
        }
    }

    /// Serialize a record list to pretty JSON
    pub fn list_to_json(records: &[OutputRecord]) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(records)
    }

    /// Parse a record list from JSON
    pub fn list_from_json(json: &str) -> Result<Vec<OutputRecord>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(tag = "output_type", rename_all = "snake_case")]
        enum Tagged<'a> {
            Stream(&'a StreamOutput),
            DisplayData(&'a DisplayData),
            ExecuteResult(&'a ExecuteResult),
            Error(&'a ErrorOutput),
        }

        match self {
            OutputRecord::Stream(output) => Tagged::Stream(output).serialize(serializer),
            OutputRecord::DisplayData(output) => Tagged::DisplayData(output).serialize(serializer),
            OutputRecord::ExecuteResult(output) => {
                Tagged::ExecuteResult(output).serialize(serializer)
            }
            OutputRecord::Error(output) => Tagged::Error(output).serialize(serializer),
            OutputRecord::Unrecognized(output) => output.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for OutputRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(D::Error::custom("output record must be a JSON object"));
        }
        let output_type = value
            .get("output_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let record = match output_type.as_str() {
            "stream" => serde_json::from_value(value).map(OutputRecord::Stream),
            "display_data" => serde_json::from_value(value).map(OutputRecord::DisplayData),
            "execute_result" => serde_json::from_value(value).map(OutputRecord::ExecuteResult),
            "error" => serde_json::from_value(value).map(OutputRecord::Error),
            _ => serde_json::from_value(value).map(OutputRecord::Unrecognized),
        };
        record.map_err(D::Error::custom)
    }
}

/// Notebook files may store text as a list of lines
fn multiline_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        One(String),
        Lines(Vec<String>),
    }

    Ok(match Option::<Text>::deserialize(deserializer)? {
        Some(Text::One(text)) => text,
        Some(Text::Lines(lines)) => lines.concat(),
        None => String::new(),
    })
}
