//! View wrappers fetching what a record page needs
//!
//! Each wrapper resolves one piece of input (preview flag, record, files) and
//! hands it to the wrapped view. The records service is passed in by the
//! caller.

use std::collections::BTreeMap;

use crate::services::{RecordsService, ServiceError};
use crate::types::{FileList, Identity, RecordId, RecordItem};

/// Query-string arguments of a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs(BTreeMap<String, String>);

impl QueryArgs {
    /// Parse `a=1&b=two`; a leading `?` is ignored, later keys win
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }
}

/// Arguments a record view is called with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewArgs {
    pub pid_value: RecordId,
    pub is_preview: bool,
}

impl ViewArgs {
    pub fn new(pid_value: RecordId) -> Self {
        Self {
            pid_value,
            is_preview: false,
        }
    }
}

/// Whether the request asks for the draft preview (`?preview=1`)
pub fn is_preview(query: &QueryArgs) -> bool {
    query.get("preview") == Some("1")
}

/// Call `view` with `is_preview` taken from the query
pub fn pass_is_preview<R>(
    query: &QueryArgs,
    pid_value: RecordId,
    view: impl FnOnce(ViewArgs) -> R,
) -> R {
    view(ViewArgs {
        pid_value,
        is_preview: is_preview(query),
    })
}

/// Call `view` with the record, or with the draft when previewing
///
/// A preview of a record without a draft shows the published record.
pub fn pass_record_or_draft<S, R>(
    service: &S,
    identity: &Identity,
    args: &ViewArgs,
    view: impl FnOnce(&ViewArgs, RecordItem) -> R,
) -> Result<R, ServiceError>
where
    S: RecordsService + ?Sized,
{
    let record_item = if args.is_preview {
        match service.read_draft(identity, &args.pid_value) {
            Err(e) if e.is_not_found() => {
                tracing::debug!("No draft '{}', previewing record", args.pid_value);
                service.read(identity, &args.pid_value)?
            }
            other => other?,
        }
    } else {
        service.read(identity, &args.pid_value)?
    };

    Ok(view(args, record_item))
}

/// Call `view` with the record's files, `None` when the identity may not list them
pub fn pass_record_files<S, R>(
    service: &S,
    identity: &Identity,
    args: &ViewArgs,
    view: impl FnOnce(&ViewArgs, Option<FileList>) -> R,
) -> Result<R, ServiceError>
where
    S: RecordsService + ?Sized,
{
    let listed = if args.is_preview {
        match service.list_draft_files(identity, &args.pid_value) {
            Err(e) if e.is_not_found() => service.list_files(identity, &args.pid_value),
            other => other,
        }
    } else {
        service.list_files(identity, &args.pid_value)
    };

    let files = match listed {
        Ok(files) => Some(files),
        Err(e) if e.is_permission_denied() => {
            tracing::debug!("Files of '{}' hidden: {}", args.pid_value, e);
            None
        }
        Err(e) => return Err(e),
    };

    Ok(view(args, files))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_args_parse() {
        let query = QueryArgs::parse("?preview=1&q=linear%20algebra&q=last");
        assert_eq!(query.get("preview"), Some("1"));
        assert_eq!(query.get("q"), Some("last"));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_is_preview_only_for_one() {
        assert!(is_preview(&QueryArgs::default().with("preview", "1")));
        assert!(!is_preview(&QueryArgs::default().with("preview", "true")));
        assert!(!is_preview(&QueryArgs::default()));
    }

    #[test]
    fn test_pass_is_preview() {
        let query = QueryArgs::parse("preview=1");
        let args = pass_is_preview(&query, RecordId::from("a"), |args| args);
        assert!(args.is_preview);
        assert_eq!(args.pid_value, RecordId::from("a"));
    }
}
