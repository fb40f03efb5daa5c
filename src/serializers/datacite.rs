//! LOM to DataCite 4.4 JSON serialization

use chrono::Datelike;
use serde_json::{Value, json};

use super::SerializerError;
use crate::types::{LomMetadata, RecordItem, ResourceType};

pub const DATACITE_SCHEMA_VERSION: &str = "http://datacite.org/schema/kernel-4";

/// DataCite `resourceTypeGeneral` of a LOM resource type
pub fn resource_type_general(resource_type: Option<ResourceType>) -> &'static str {
    match resource_type {
        Some(ResourceType::Course) | Some(ResourceType::Unit) => "Collection",
        Some(ResourceType::Link) => "InteractiveResource",
        Some(ResourceType::File) | Some(ResourceType::Upload) => "Text",
        None => "Other",
    }
}

/// Serializer producing DataCite 4.4 JSON for a LOM record
#[derive(Debug, Clone)]
pub struct LomToDataCite44Serializer {
    publisher: String,
}

impl LomToDataCite44Serializer {
    pub fn new(publisher: impl Into<String>) -> Self {
        Self {
            publisher: publisher.into(),
        }
    }

    pub fn dump(&self, record: &RecordItem) -> Result<Value, SerializerError> {
        let lom = LomMetadata::new(record.metadata());
        let title = lom.title().ok_or_else(|| SerializerError::MissingField {
            key: "general".to_string(),
            field: "title".to_string(),
        })?;

        let mut titles = json!({"title": title.text});
        if let Some(lang) = title.lang.filter(|l| l != "x-none") {
            titles["lang"] = json!(lang);
        }

        let creators: Vec<Value> = lom
            .authors()
            .into_iter()
            .map(|author| {
                let (family, given) = author.name_parts();
                let mut creator = json!({
                    "name": author.fullname,
                    "nameType": "Personal",
                    "familyName": family,
                });
                if let Some(given) = given {
                    creator["givenName"] = json!(given);
                }
                creator
            })
            .collect();

        let mut data = json!({
            "types": {
                "resourceTypeGeneral": resource_type_general(record.resource_type()),
                "resourceType": record.resource_type().map(|t| t.to_string()),
            },
            "creators": creators,
            "titles": [titles],
            "publisher": self.publisher,
            "schemaVersion": DATACITE_SCHEMA_VERSION,
        });

        let mut dates = Vec::new();
        if let Some(created) = record.created() {
            data["publicationYear"] = json!(created.year().to_string());
            dates.push(json!({
                "date": created.format("%Y-%m-%d").to_string(),
                "dateType": "Issued",
            }));
        }
        if let Some(updated) = record.updated() {
            dates.push(json!({
                "date": updated.format("%Y-%m-%d").to_string(),
                "dateType": "Updated",
            }));
        }
        if !dates.is_empty() {
            data["dates"] = json!(dates);
        }

        let subjects: Vec<Value> = lom
            .keywords()
            .into_iter()
            .map(|k| json!({"subject": k.text}))
            .collect();
        if !subjects.is_empty() {
            data["subjects"] = json!(subjects);
        }

        if let Some(language) = lom.languages().into_iter().next() {
            data["language"] = json!(language);
        }

        if let Some(doi) = record.doi() {
            data["doi"] = json!(doi);
            data["identifiers"] = json!([{"identifier": doi, "identifierType": "DOI"}]);
        }

        if let Some(url) = lom.rights_url() {
            data["rightsList"] = json!([{"rights": url, "rightsUri": url}]);
        }

        let descriptions: Vec<Value> = lom
            .descriptions()
            .into_iter()
            .map(|d| {
                let mut description = json!({
                    "description": d.text,
                    "descriptionType": "Abstract",
                });
                if let Some(lang) = d.lang.filter(|l| l != "x-none") {
                    description["lang"] = json!(lang);
                }
                description
            })
            .collect();
        if !descriptions.is_empty() {
            data["descriptions"] = json!(descriptions);
        }

        let formats = lom.formats();
        if !formats.is_empty() {
            data["formats"] = json!(formats);
        }

        Ok(data)
    }

    pub fn serialize_object(&self, record: &RecordItem) -> Result<String, SerializerError> {
        Ok(serde_json::to_string_pretty(&self.dump(record)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_general() {
        assert_eq!(resource_type_general(Some(ResourceType::Course)), "Collection");
        assert_eq!(resource_type_general(Some(ResourceType::Link)), "InteractiveResource");
        assert_eq!(resource_type_general(None), "Other");
    }

    #[test]
    fn test_missing_title_is_an_error() {
        let record = RecordItem::from_json(json!({"id": "x", "metadata": {"general": {}}})).unwrap();
        let err = LomToDataCite44Serializer::new("Repo").dump(&record).unwrap_err();
        assert!(matches!(err, SerializerError::MissingField { field, .. } if field == "title"));
    }
}
