//! Citation strings for LOM records
//!
//! Records are first mapped to a CSL-JSON item, then rendered in one of a few
//! built-in styles.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};

use super::SerializerError;
use super::ui_json::DOI_RESOLVER;
use crate::types::{Contributor, LomMetadata, RecordItem};

/// Supported citation styles
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    #[default]
    Apa,
    Harvard,
    Chicago,
}

/// Serializer rendering a record as a citation string
#[derive(Debug, Clone)]
pub struct LomToCitationStringSerializer {
    style: CitationStyle,
    publisher: String,
}

impl LomToCitationStringSerializer {
    pub fn new(style: CitationStyle, publisher: impl Into<String>) -> Self {
        Self {
            style,
            publisher: publisher.into(),
        }
    }

    /// CSL-JSON item of the record
    pub fn to_csl_json(&self, record: &RecordItem) -> Result<Value, SerializerError> {
        let lom = LomMetadata::new(record.metadata());
        let title = lom.title().ok_or_else(|| SerializerError::MissingField {
            key: "general".to_string(),
            field: "title".to_string(),
        })?;

        let authors: Vec<Value> = lom
            .authors()
            .iter()
            .map(|author| match author.name_parts() {
                (family, Some(given)) => json!({"family": family, "given": given}),
                (family, None) => json!({"literal": family}),
            })
            .collect();

        let mut item = json!({
            "id": record.id().value(),
            "type": "webpage",
            "title": title.text,
            "author": authors,
            "publisher": self.publisher,
        });
        if let Some(created) = record.created() {
            item["issued"] =
                json!({"date-parts": [[created.year(), created.month(), created.day()]]});
        }
        if let Some(doi) = record.doi() {
            item["DOI"] = json!(doi);
        }
        if let Some((_, url)) = lom.location() {
            item["URL"] = json!(url);
        }
        if let Some(language) = lom.languages().into_iter().next() {
            item["language"] = json!(language);
        }
        Ok(item)
    }

    /// Render the citation string in the configured style
    pub fn serialize_object(&self, record: &RecordItem) -> Result<String, SerializerError> {
        let lom = LomMetadata::new(record.metadata());
        let title = lom
            .title()
            .ok_or_else(|| SerializerError::MissingField {
                key: "general".to_string(),
                field: "title".to_string(),
            })?
            .text;
        let authors = lom.authors();
        let year = record
            .created()
            .map(|c| c.year().to_string())
            .unwrap_or_else(|| "n.d.".to_string());
        let link = record
            .doi()
            .map(|doi| format!("{}{}", DOI_RESOLVER, doi))
            .or_else(|| lom.location().map(|(_, url)| url));

        let citation = match self.style {
            CitationStyle::Apa => {
                let mut s = String::new();
                if !authors.is_empty() {
                    s.push_str(&join_names(&authors, apa_name, ", & "));
                    s.push(' ');
                }
                s.push_str(&format!("({}). {}. {}.", year, title, self.publisher));
                if let Some(link) = link {
                    s.push_str(&format!(" {}", link));
                }
                s
            }
            CitationStyle::Harvard => {
                let mut s = String::new();
                if !authors.is_empty() {
                    s.push_str(&join_names(&authors, apa_name, " and "));
                    s.push(' ');
                }
                s.push_str(&format!("({}) {}. {}.", year, title, self.publisher));
                if let Some(link) = link {
                    s.push_str(&format!(" Available at: {}", link));
                }
                s
            }
            CitationStyle::Chicago => {
                let mut s = String::new();
                if !authors.is_empty() {
                    s.push_str(&join_names(&authors, chicago_name, ", and "));
                    s.push_str(". ");
                }
                s.push_str(&format!("\"{}.\" {}, {}.", title, self.publisher, year));
                if let Some(link) = link {
                    s.push_str(&format!(" {}.", link));
                }
                s
            }
        };
        Ok(citation)
    }
}

/// `Jane Mary Doe` -> `Doe, J. M.`
fn apa_name(contributor: &Contributor) -> String {
    match contributor.name_parts() {
        (family, Some(given)) => {
            let initials: Vec<String> = given
                .split_whitespace()
                .filter_map(|part| part.chars().next())
                .map(|c| format!("{}.", c))
                .collect();
            format!("{}, {}", family, initials.join(" "))
        }
        (family, None) => family,
    }
}

/// `Jane Doe` -> `Doe, Jane`
fn chicago_name(contributor: &Contributor) -> String {
    match contributor.name_parts() {
        (family, Some(given)) => format!("{}, {}", family, given),
        (family, None) => family,
    }
}

/// Join names with commas, using `last_sep` before the final one
fn join_names(
    authors: &[Contributor],
    format_name: fn(&Contributor) -> String,
    last_sep: &str,
) -> String {
    let names: Vec<String> = authors.iter().map(format_name).collect();
    match names.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}{}{}", rest.join(", "), last_sep, last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}
