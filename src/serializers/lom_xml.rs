//! LOM-XML serialization
//!
//! Walks a record's metadata JSON and mirrors it as a namespaced element tree.
//! Mapping keys become element names (lower-cased), sequences become repeated
//! sibling elements, and strings and integers become element text. Three keys
//! get special treatment:
//!
//! - `identifier`: the stored value is dropped and replaced by two generated
//!   identifiers, the repository-local one and the DOI
//! - `langstring`: `{"lang": .., "#text": ..}` becomes text plus `xml:lang`
//! - `location`: `{"type": .., "#text": ..}` becomes text plus `xml:lang`
//!   holding the location type

use serde_json::{Map, Value, json};

use super::markup::{
    ElementFactory, MarkupNode, NamespaceMap, XML_NAMESPACE, XSI_NAMESPACE, check_name, check_text,
};
use super::{SerializerError, value_type_name};
use crate::types::RecordItem;

/// Namespace of the LOM elements
pub const LOM_NAMESPACE: &str = "https://oer-repo.uibk.ac.at/lom";

/// `xsi:schemaLocation` of the LOM root element
pub const LOM_SCHEMA_LOCATION: &str = "https://w3id.org/oerbase/profiles/lomuibk/latest/ \
     https://w3id.org/oerbase/profiles/lomuibk/latest/lom-uibk.xsd";

/// Language marker of generated identifier entries
const NO_LANGUAGE: &str = "x-none";

/// Catalog name of the DOI identifier entry
const DOI_CATALOG: &str = "DOI";

/// External identifiers needed to synthesize the `identifier` elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionContext {
    /// Local record identifier
    pub lom_id: String,
    /// Catalog of the local identifier, e.g. `oai:repo.example.org`
    pub oaiserver_id_prefix: String,
    /// Persistent identifier, when the record has one
    pub doi: Option<String>,
}

impl ConversionContext {
    pub fn new(
        lom_id: impl Into<String>,
        oaiserver_id_prefix: impl Into<String>,
        doi: Option<String>,
    ) -> Self {
        Self {
            lom_id: lom_id.into(),
            oaiserver_id_prefix: oaiserver_id_prefix.into(),
            doi,
        }
    }

    fn repository_identifier(&self) -> Value {
        json!([{
            "catalog": self.oaiserver_id_prefix,
            "entry": {
                "langstring": {
                    "lang": NO_LANGUAGE,
                    "#text": self.lom_id,
                }
            },
        }])
    }

    fn repository_doi_identifier(&self) -> Value {
        json!([{
            "catalog": DOI_CATALOG,
            "entry": {
                "langstring": {
                    "lang": NO_LANGUAGE,
                    "#text": self.doi.as_deref().unwrap_or_default(),
                }
            },
        }])
    }
}

/// Element factory for the LOM namespace with `lom` and `xsi` prefixes
pub fn lom_element_factory() -> ElementFactory {
    ElementFactory::new(
        LOM_NAMESPACE,
        NamespaceMap::new()
            .bind("lom", LOM_NAMESPACE)
            .bind("xsi", XSI_NAMESPACE),
    )
}

/// Convert `value` into `parent` and hand `parent` back
pub fn convert(
    value: &Value,
    mut parent: MarkupNode,
    context: &ConversionContext,
) -> Result<MarkupNode, SerializerError> {
    let builder = TreeBuilder {
        factory: lom_element_factory(),
        context,
    };
    builder.build(value, &mut parent, None)?;
    Ok(parent)
}

struct TreeBuilder<'a> {
    factory: ElementFactory,
    context: &'a ConversionContext,
}

impl TreeBuilder<'_> {
    fn build(
        &self,
        value: &Value,
        parent: &mut MarkupNode,
        inner_tag: Option<&MarkupNode>,
    ) -> Result<(), SerializerError> {
        match value {
            Value::Object(map) => self.build_mapping(map, parent),
            Value::Array(items) => {
                let template = inner_tag.ok_or_else(|| SerializerError::SequenceWithoutTemplate {
                    tag: parent.tag().to_string(),
                })?;
                for item in items {
                    let mut local_tag = template.clone();
                    self.build(item, &mut local_tag, None)?;
                    parent.append(local_tag);
                }
                Ok(())
            }
            Value::String(text) => {
                check_text(parent.tag(), text)?;
                parent.set_text(text.as_str());
                Ok(())
            }
            Value::Number(n) if n.is_i64() || n.is_u64() => {
                parent.set_text(n.to_string());
                Ok(())
            }
            other => Err(SerializerError::UnsupportedValueType {
                type_name: value_type_name(other),
            }),
        }
    }

    fn build_mapping(
        &self,
        map: &Map<String, Value>,
        parent: &mut MarkupNode,
    ) -> Result<(), SerializerError> {
        for (key, value) in map {
            match key.as_str() {
                "identifier" => {
                    let template = self.factory.element("identifier");
                    for identifiers in [
                        self.context.repository_identifier(),
                        self.context.repository_doi_identifier(),
                    ] {
                        self.build(&identifiers, parent, Some(&template))?;
                    }
                }
                "langstring" => self.build_langstring(value, parent)?,
                "location" => self.build_location(value, parent)?,
                _ => {
                    let tag = key.to_lowercase();
                    check_name(&tag)?;
                    let template = self.factory.element(&tag);
                    match value {
                        Value::Array(_) => self.build(value, parent, Some(&template))?,
                        single => {
                            let wrapped = Value::Array(vec![single.clone()]);
                            self.build(&wrapped, parent, Some(&template))?
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// `{"lang": "en", "#text": "..."}`, `lang` optional
    fn build_langstring(
        &self,
        value: &Value,
        parent: &mut MarkupNode,
    ) -> Result<(), SerializerError> {
        let fields = as_mapping(value)?;
        let mut tag = self
            .factory
            .element("langstring")
            .with_text(text_field("langstring", fields, "#text")?);
        if fields.contains_key("lang") {
            tag.set_attribute(
                Some(XML_NAMESPACE),
                "lang",
                text_field("langstring", fields, "lang")?,
            );
        }
        parent.append(tag);
        Ok(())
    }

    /// `{"type": "URL", "#text": "..."}`; the type lands in `xml:lang`
    fn build_location(&self, value: &Value, parent: &mut MarkupNode) -> Result<(), SerializerError> {
        let fields = as_mapping(value)?;
        let tag = self
            .factory
            .element("location")
            .with_text(text_field("location", fields, "#text")?)
            .with_attribute(
                Some(XML_NAMESPACE),
                "lang",
                text_field("location", fields, "type")?,
            );
        parent.append(tag);
        Ok(())
    }
}

fn as_mapping(value: &Value) -> Result<&Map<String, Value>, SerializerError> {
    value
        .as_object()
        .ok_or_else(|| SerializerError::UnsupportedValueType {
            type_name: value_type_name(value),
        })
}

fn text_field(
    key: &str,
    fields: &Map<String, Value>,
    field: &str,
) -> Result<String, SerializerError> {
    match fields.get(field) {
        None => Err(SerializerError::MissingField {
            key: key.to_string(),
            field: field.to_string(),
        }),
        Some(Value::String(s)) => {
            check_text(key, s)?;
            Ok(s.clone())
        }
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Some(other) => Err(SerializerError::UnsupportedValueType {
            type_name: value_type_name(other),
        }),
    }
}

/// LOM-XML serializer for one record's metadata
#[derive(Debug, Clone)]
pub struct LomXmlSerializer {
    metadata: Value,
    context: ConversionContext,
}

impl LomXmlSerializer {
    pub fn new(metadata: Value, context: ConversionContext) -> Self {
        Self { metadata, context }
    }

    /// Serializer for a stored record, using its id and DOI
    pub fn for_record(record: &RecordItem, oaiserver_id_prefix: &str) -> Self {
        Self::new(
            record.metadata().clone(),
            ConversionContext::new(
                record.id().value(),
                oaiserver_id_prefix,
                record.doi().map(str::to_string),
            ),
        )
    }

    /// Root `lom` element with namespace declarations and schema location
    pub fn root_element() -> MarkupNode {
        lom_element_factory().root("lom").with_attribute(
            Some(XSI_NAMESPACE),
            "schemaLocation",
            LOM_SCHEMA_LOCATION,
        )
    }

    /// Build the element tree of the record
    pub fn serialize_object_xml(&self) -> Result<MarkupNode, SerializerError> {
        tracing::debug!("Serializing record '{}' to LOM-XML", self.context.lom_id);
        convert(&self.metadata, Self::root_element(), &self.context)
    }

    /// Serialize the record into an XML document
    pub fn serialize_object(&self, indent: bool) -> Result<String, SerializerError> {
        let root = self.serialize_object_xml()?;
        super::markup::to_xml_string(&root, indent)
    }
}
