//! JSON-for-UI serialization
//!
//! Adds a `ui` object to a record document holding the values templates
//! display directly: resolved langstrings, contributor names, localized dates.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::{SerializerError, value_type_name};
use crate::types::LomMetadata;

/// Prefix turning a DOI into its resolver URL
pub const DOI_RESOLVER: &str = "https://doi.org/";

/// Serializer inserting the UI representation next to the stored record
#[derive(Debug, Clone)]
pub struct LomUiJsonSerializer {
    object_key: String,
}

impl Default for LomUiJsonSerializer {
    fn default() -> Self {
        Self {
            object_key: "ui".to_string(),
        }
    }
}

impl LomUiJsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key the UI object is stored under
    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    /// Add the UI object to one record document
    pub fn dump_obj(&self, mut obj: Value) -> Result<Value, SerializerError> {
        let ui = ui_object(&obj);
        match obj.as_object_mut() {
            Some(map) => {
                map.insert(self.object_key.clone(), ui);
                Ok(obj)
            }
            None => Err(SerializerError::UnsupportedValueType {
                type_name: value_type_name(&obj),
            }),
        }
    }

    /// Add the UI object to every hit of a search result (`hits.hits`)
    pub fn dump_list(&self, mut obj_list: Value) -> Result<Value, SerializerError> {
        let hits = obj_list
            .pointer_mut("/hits/hits")
            .ok_or_else(|| SerializerError::MissingField {
                key: "hits".to_string(),
                field: "hits".to_string(),
            })?;
        let records = match hits.take() {
            Value::Array(records) => records,
            other => {
                return Err(SerializerError::UnsupportedValueType {
                    type_name: value_type_name(&other),
                });
            }
        };
        *hits = Value::Array(
            records
                .into_iter()
                .map(|record| self.dump_obj(record))
                .collect::<Result<Vec<_>, _>>()?,
        );
        Ok(obj_list)
    }

    pub fn serialize_object(&self, obj: Value) -> Result<String, SerializerError> {
        Ok(serde_json::to_string_pretty(&self.dump_obj(obj)?)?)
    }

    pub fn serialize_object_list(&self, obj_list: Value) -> Result<String, SerializerError> {
        Ok(serde_json::to_string_pretty(&self.dump_list(obj_list)?)?)
    }
}

fn ui_object(record: &Value) -> Value {
    let metadata = record.get("metadata").unwrap_or(&Value::Null);
    let lom = LomMetadata::new(metadata);
    let title = lom.title();
    let doi = record
        .pointer("/pids/doi/identifier")
        .and_then(Value::as_str)
        .filter(|doi| !doi.is_empty());

    json!({
        "title": title.as_ref().map(|t| t.text.clone()),
        "title_lang": title.and_then(|t| t.lang),
        "descriptions": lom.descriptions().into_iter().map(|d| d.text).collect::<Vec<_>>(),
        "keywords": lom.keywords().into_iter().map(|k| k.text).collect::<Vec<_>>(),
        "languages": lom.languages(),
        "contributors": lom.contributors(),
        "resource_type": record.get("resource_type").cloned().unwrap_or(Value::Null),
        "learning_resource_type": lom.learning_resource_type(),
        "format": lom.formats(),
        "location": lom.location().map(|(_, url)| url),
        "rights": {"url": lom.rights_url()},
        "doi": doi,
        "doi_url": doi.map(|doi| format!("{}{}", DOI_RESOLVER, doi)),
        "is_draft": record.get("is_draft").and_then(Value::as_bool).unwrap_or(false),
        "created_date_l10n_long": date_l10n_long(record.get("created")),
        "updated_date_l10n_long": date_l10n_long(record.get("updated")),
    })
}

/// `2024-01-05T10:00:00+00:00` -> `January 5, 2024`
fn date_l10n_long(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc).format("%B %-d, %Y").to_string())
}
