//! Read-only view over LOM metadata JSON
//!
//! LOM keeps most human-readable values as `{"langstring": {"#text", "lang"}}`
//! and allows many fields to be either a single value or a list. The accessors
//! here flatten both shapes so serializers can read titles, contributors and
//! technical data without caring how a record happened to store them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static VCARD_FN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^FN(?:;[^:\r\n]*)?:([^\r\n]*)\r?$").expect("Failed to compile vCard FN regex")
});

/// Language-tagged text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangString {
    pub text: String,
    pub lang: Option<String>,
}

/// Contributor of a learning object, resolved from its vCard entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub fullname: String,
    pub role: String,
}

impl Contributor {
    /// `(family, given)` split of the full name, last word taken as family name
    pub fn name_parts(&self) -> (String, Option<String>) {
        let mut words: Vec<&str> = self.fullname.split_whitespace().collect();
        match words.pop() {
            Some(family) if !words.is_empty() => (family.to_string(), Some(words.join(" "))),
            Some(family) => (family.to_string(), None),
            None => (String::new(), None),
        }
    }
}

/// Borrowed view over a record's `metadata` tree
#[derive(Debug, Clone, Copy)]
pub struct LomMetadata<'a>(&'a Value);

impl<'a> LomMetadata<'a> {
    pub fn new(metadata: &'a Value) -> Self {
        Self(metadata)
    }

    pub fn title(&self) -> Option<LangString> {
        self.0
            .pointer("/general/title")
            .and_then(|title| items(title).next())
            .and_then(langstring)
    }

    pub fn descriptions(&self) -> Vec<LangString> {
        self.langstrings_at("/general/description")
    }

    pub fn keywords(&self) -> Vec<LangString> {
        self.langstrings_at("/general/keyword")
    }

    pub fn languages(&self) -> Vec<String> {
        self.strings_at("/general/language")
    }

    /// Contributors in document order, one per vCard entity
    pub fn contributors(&self) -> Vec<Contributor> {
        let Some(contribute) = self.0.pointer("/lifecycle/contribute") else {
            return Vec::new();
        };
        items(contribute)
            .flat_map(|entry| {
                let role = entry
                    .pointer("/role/value")
                    .and_then(langstring)
                    .map(|l| l.text)
                    .unwrap_or_default();
                entry
                    .get("entity")
                    .map(|entities| items(entities).filter_map(Value::as_str).collect::<Vec<_>>())
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(vcard_fullname)
                    .map(move |fullname| Contributor {
                        fullname,
                        role: role.clone(),
                    })
            })
            .collect()
    }

    /// Contributors whose role is `Author`, all contributors if there is none
    pub fn authors(&self) -> Vec<Contributor> {
        let contributors = self.contributors();
        let authors: Vec<Contributor> = contributors
            .iter()
            .filter(|c| c.role.eq_ignore_ascii_case("author"))
            .cloned()
            .collect();
        if authors.is_empty() {
            contributors
        } else {
            authors
        }
    }

    /// License URL, read from `rights.url` or a URL-valued rights description
    pub fn rights_url(&self) -> Option<String> {
        if let Some(url) = self.0.pointer("/rights/url").and_then(Value::as_str) {
            return Some(url.to_string());
        }
        self.0
            .pointer("/rights/description")
            .and_then(langstring)
            .map(|l| l.text)
            .filter(|text| url::Url::parse(text).is_ok())
    }

    pub fn formats(&self) -> Vec<String> {
        self.strings_at("/technical/format")
    }

    /// Location of the resource together with its type, e.g. `("URL", "https://..")`
    pub fn location(&self) -> Option<(String, String)> {
        let location = self
            .0
            .pointer("/technical/location")
            .and_then(|l| items(l).next())?;
        let text = location.get("#text").and_then(Value::as_str)?;
        let kind = location
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("URL");
        Some((kind.to_string(), text.to_string()))
    }

    pub fn learning_resource_type(&self) -> Option<String> {
        self.0
            .pointer("/educational/learningresourcetype/id")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn langstrings_at(&self, pointer: &str) -> Vec<LangString> {
        self.0
            .pointer(pointer)
            .map(|v| items(v).filter_map(langstring).collect())
            .unwrap_or_default()
    }

    fn strings_at(&self, pointer: &str) -> Vec<String> {
        self.0
            .pointer(pointer)
            .map(|v| {
                items(v)
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Iterate a value that may be a single item or a list of items
fn items(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(list) => Box::new(list.iter()),
        Value::Null => Box::new(std::iter::empty()),
        single => Box::new(std::iter::once(single)),
    }
}

/// Read `{"langstring": {"#text": .., "lang": ..}}`
fn langstring(value: &Value) -> Option<LangString> {
    let inner = value.get("langstring")?;
    let text = inner.get("#text").and_then(Value::as_str)?;
    Some(LangString {
        text: text.to_string(),
        lang: inner.get("lang").and_then(Value::as_str).map(str::to_string),
    })
}

/// Full name (`FN`) of a vCard, or the raw entity when it is not a vCard
pub fn vcard_fullname(entity: &str) -> Option<String> {
    if !entity.trim_start().starts_with("BEGIN:VCARD") {
        let name = entity.trim();
        return (!name.is_empty()).then(|| name.to_string());
    }
    VCARD_FN_REGEX
        .captures(entity)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> Value {
        json!({
            "general": {
                "title": {"langstring": {"#text": "Intro to Rust", "lang": "en"}},
                "description": [
                    {"langstring": {"#text": "First", "lang": "en"}},
                    {"langstring": {"#text": "Zweite"}}
                ],
                "keyword": {"langstring": {"#text": "ownership", "lang": "en"}},
                "language": ["en", "de"]
            },
            "lifecycle": {
                "contribute": [
                    {
                        "role": {"value": {"langstring": {"#text": "Author", "lang": "x-none"}}},
                        "entity": ["BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Jane Doe\r\nEND:VCARD\r\n"]
                    },
                    {
                        "role": {"value": {"langstring": {"#text": "Editor", "lang": "x-none"}}},
                        "entity": "Max Mustermann"
                    }
                ]
            },
            "rights": {"description": {"langstring": {"#text": "https://creativecommons.org/licenses/by/4.0/", "lang": "x-none"}}},
            "technical": {"format": ["text/html"], "location": {"type": "URL", "#text": "https://example.org"}},
            "educational": {"learningresourcetype": {"id": "https://w3id.org/kim/hcrt/course"}}
        })
    }

    #[test]
    fn test_general_fields() {
        let value = metadata();
        let lom = LomMetadata::new(&value);
        assert_eq!(lom.title().unwrap().text, "Intro to Rust");
        assert_eq!(lom.title().unwrap().lang.as_deref(), Some("en"));
        assert_eq!(lom.descriptions().len(), 2);
        assert_eq!(lom.descriptions()[1].lang, None);
        assert_eq!(lom.keywords()[0].text, "ownership");
        assert_eq!(lom.languages(), vec!["en", "de"]);
    }

    #[test]
    fn test_contributors_and_authors() {
        let value = metadata();
        let lom = LomMetadata::new(&value);
        let contributors = lom.contributors();
        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0].fullname, "Jane Doe");
        assert_eq!(contributors[1].role, "Editor");
        assert_eq!(lom.authors().len(), 1);
        assert_eq!(
            contributors[0].name_parts(),
            ("Doe".to_string(), Some("Jane".to_string()))
        );
    }

    #[test]
    fn test_technical_and_rights() {
        let value = metadata();
        let lom = LomMetadata::new(&value);
        assert_eq!(
            lom.rights_url().as_deref(),
            Some("https://creativecommons.org/licenses/by/4.0/")
        );
        assert_eq!(lom.formats(), vec!["text/html"]);
        assert_eq!(
            lom.location(),
            Some(("URL".to_string(), "https://example.org".to_string()))
        );
        assert_eq!(
            lom.learning_resource_type().as_deref(),
            Some("https://w3id.org/kim/hcrt/course")
        );
    }

    #[test]
    fn test_empty_metadata() {
        let value = Value::Null;
        let lom = LomMetadata::new(&value);
        assert!(lom.title().is_none());
        assert!(lom.contributors().is_empty());
        assert!(lom.rights_url().is_none());
    }

    #[test]
    fn test_vcard_with_parameters() {
        let card = "BEGIN:VCARD\nVERSION:3.0\nFN;CHARSET=UTF-8:Ada Lovelace\nEND:VCARD";
        assert_eq!(vcard_fullname(card).as_deref(), Some("Ada Lovelace"));
        assert_eq!(vcard_fullname("BEGIN:VCARD\nEND:VCARD"), None);
    }
}
