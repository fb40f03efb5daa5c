pub mod citation;
pub mod datacite;
pub mod lom_xml;
pub mod markup;
pub mod ui_json;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use citation::*;
pub use datacite::*;
pub use lom_xml::*;
pub use markup::{
    ElementFactory, MarkupAttribute, MarkupNode, NamespaceMap, XML_NAMESPACE, XSI_NAMESPACE,
    is_xml_name, is_xml_text, to_xml_string,
};
pub use ui_json::*;

/// Errors raised while turning a record into one of its output formats
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    /// A source value that is neither mapping, sequence, string nor integer
    #[error("Unexpected value of type {type_name} when building XML")]
    UnsupportedValueType { type_name: &'static str },

    /// A sub-field required by the record schema is absent
    #[error("Missing field '{field}' in '{key}'")]
    MissingField { key: String, field: String },

    /// A sequence reached the converter without an element to stamp it into
    #[error("Sequence found without an element template (parent '{tag}')")]
    SequenceWithoutTemplate { tag: String },

    /// A mapping key or attribute name that is not an XML name
    #[error("Invalid XML element name '{name}'")]
    InvalidName { name: String },

    /// Text containing characters XML 1.0 does not allow
    #[error("Text of '{tag}' contains characters not allowed in XML")]
    InvalidText { tag: String },

    #[error("XML writing error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output formats a record can be exported to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    LomXml,
    Datacite,
    UiJson,
    Citation,
}

impl OutputFormat {
    /// MIME type the format is usually served with
    pub fn mimetype(&self) -> &'static str {
        match self {
            OutputFormat::LomXml => "application/x-lom+xml",
            OutputFormat::Datacite => "application/vnd.datacite.datacite+json",
            OutputFormat::UiJson => "application/vnd.inveniolom.v1+json",
            OutputFormat::Citation => "text/x-bibliography",
        }
    }
}

/// Name of a JSON value's type, as reported in conversion errors
pub(crate) fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "integer",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}
