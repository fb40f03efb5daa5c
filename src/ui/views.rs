//! Record views
//!
//! Views compose the decorators: they resolve the preview flag, the record or
//! draft and its files, then render one of the output formats.

use serde::Serialize;
use serde_json::Value;

use super::decorators::{QueryArgs, ViewArgs, pass_is_preview, pass_record_files, pass_record_or_draft};
use crate::config::LomConfig;
use crate::serializers::{
    CitationStyle, LomToCitationStringSerializer, LomToDataCite44Serializer, LomUiJsonSerializer,
    LomXmlSerializer, OutputFormat, SerializerError,
};
use crate::services::{RecordsService, ServiceError};
use crate::types::{FileList, Identity, RecordId, RecordItem};

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Serializer(#[from] SerializerError),
}

/// What the record detail page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPage {
    /// Record document with its `ui` object
    pub record: Value,
    /// `None` when the identity may not see the files
    pub files: Option<FileList>,
    pub is_preview: bool,
}

/// Record detail page for `pid_value`
pub fn record_detail<S>(
    service: &S,
    identity: &Identity,
    query: &QueryArgs,
    pid_value: RecordId,
) -> Result<RecordPage, ViewError>
where
    S: RecordsService + ?Sized,
{
    pass_is_preview(query, pid_value, |args| -> Result<RecordPage, ViewError> {
        let record = pass_record_or_draft(service, identity, &args, |_, record| record)?;
        let files = pass_record_files(service, identity, &args, |_, files| files)?;
        let record = LomUiJsonSerializer::new().dump_obj(record.into_data())?;

        Ok(RecordPage {
            record,
            files,
            is_preview: args.is_preview,
        })
    })
}

/// Export a record (or its draft when previewing) in `format`
///
/// `style` only applies to citations and defaults to the configured style.
pub fn record_export<S>(
    service: &S,
    identity: &Identity,
    args: &ViewArgs,
    format: OutputFormat,
    style: Option<CitationStyle>,
    config: &LomConfig,
) -> Result<String, ViewError>
where
    S: RecordsService + ?Sized,
{
    let record = pass_record_or_draft(service, identity, args, |_, record| record)?;
    tracing::debug!("Exporting '{}' as {}", record.id(), format);
    Ok(render(record, format, style, config)?)
}

fn render(
    record: RecordItem,
    format: OutputFormat,
    style: Option<CitationStyle>,
    config: &LomConfig,
) -> Result<String, SerializerError> {
    match format {
        OutputFormat::LomXml => {
            LomXmlSerializer::for_record(&record, &config.oaiserver_id_prefix).serialize_object(true)
        }
        OutputFormat::Datacite => {
            LomToDataCite44Serializer::new(config.publisher.as_str()).serialize_object(&record)
        }
        OutputFormat::UiJson => LomUiJsonSerializer::new().serialize_object(record.into_data()),
        OutputFormat::Citation => LomToCitationStringSerializer::new(
            style.unwrap_or(config.citation_style),
            config.publisher.as_str(),
        )
        .serialize_object(&record),
    }
}
