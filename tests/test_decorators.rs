//! Integration tests for the view wrappers and record views

use lom_records::config::LomConfig;
use lom_records::serializers::{CitationStyle, OutputFormat};
use lom_records::services::RecordsService;
use lom_records::types::Identity;
use lom_records::ui::{
    QueryArgs, ViewArgs, ViewError, pass_is_preview, pass_record_files, pass_record_or_draft,
    record_detail, record_export,
};

use test_util::{create_test_service, create_test_temp_dir, publish_record, record_id, sample_record};

fn preview_args(id: &str) -> ViewArgs {
    ViewArgs {
        pid_value: record_id(id),
        is_preview: true,
    }
}

#[test]
fn test_preview_reads_draft() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);
    let owner = Identity::user("1");
    let mut data = sample_record("aaaaa-11111");
    data["metadata"]["general"]["title"]["langstring"]["#text"] = "Draft title".into();
    service.create_draft(&owner, data).unwrap();

    let is_draft = pass_record_or_draft(&service, &owner, &preview_args("aaaaa-11111"), |_, record| {
        record.is_draft()
    })
    .unwrap();

    assert!(is_draft);
}

#[test]
fn test_preview_falls_back_to_record() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);
    let system = Identity::system();
    publish_record(&service, &system, sample_record("aaaaa-11111"));

    let record = pass_record_or_draft(&service, &system, &preview_args("aaaaa-11111"), |_, record| {
        record
    })
    .unwrap();

    assert!(!record.is_draft());
    assert_eq!(record.id(), &record_id("aaaaa-11111"));
}

#[test]
fn test_missing_record_is_not_found() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);

    for args in [preview_args("zzzzz-99999"), ViewArgs::new(record_id("zzzzz-99999"))] {
        let err = pass_record_or_draft(&service, &Identity::system(), &args, |_, _| ()).unwrap_err();
        assert!(err.is_not_found());
    }
}

#[test]
fn test_files_hidden_on_permission_denied() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);
    let owner = Identity::user("1");
    let mut data = sample_record("aaaaa-11111");
    data["access"]["files"] = "restricted".into();
    publish_record(&service, &owner, data);
    let args = ViewArgs::new(record_id("aaaaa-11111"));

    let hidden = pass_record_files(&service, &Identity::Anonymous, &args, |_, files| files).unwrap();
    let shown = pass_record_files(&service, &owner, &args, |_, files| files).unwrap();

    assert!(hidden.is_none());
    assert_eq!(shown.map(|files| files.len()), Some(1));
}

#[test]
fn test_preview_files_fall_back_to_record() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);
    let system = Identity::system();
    publish_record(&service, &system, sample_record("aaaaa-11111"));

    let files = pass_record_files(&service, &system, &preview_args("aaaaa-11111"), |_, files| files)
        .unwrap()
        .unwrap();

    assert_eq!(files.entries[0].key, "slides.pdf");
}

#[test]
fn test_record_detail_composes_wrappers() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);
    let system = Identity::system();
    publish_record(&service, &system, sample_record("aaaaa-11111"));

    let page = record_detail(
        &service,
        &Identity::Anonymous,
        &QueryArgs::parse("?preview=1"),
        record_id("aaaaa-11111"),
    )
    .unwrap();

    assert!(page.is_preview);
    assert_eq!(page.record["ui"]["title"], "Introduction to Soil Mechanics");
    assert_eq!(page.files.map(|f| f.len()), Some(1));
}

#[test]
fn test_wrappers_accept_trait_objects() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);
    publish_record(&service, &Identity::system(), sample_record("aaaaa-11111"));
    let service: &dyn RecordsService = &service;

    let args = pass_is_preview(&QueryArgs::default(), record_id("aaaaa-11111"), |args| args);
    let title = pass_record_or_draft(service, &Identity::Anonymous, &args, |_, record| {
        record.metadata()["general"]["title"]["langstring"]["#text"].clone()
    })
    .unwrap();

    assert_eq!(title, "Introduction to Soil Mechanics");
}

#[test]
fn test_record_export_formats() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);
    let system = Identity::system();
    publish_record(&service, &system, sample_record("aaaaa-11111"));
    let config = LomConfig {
        data_dir: temp_dir.path().to_path_buf(),
        oaiserver_id_prefix: "oai:repo.example.org".to_string(),
        publisher: "Example University".to_string(),
        citation_style: CitationStyle::Apa,
    };
    let args = ViewArgs::new(record_id("aaaaa-11111"));
    let export = |format, style| record_export(&service, &system, &args, format, style, &config);

    let xml = export(OutputFormat::LomXml, None).unwrap();
    assert!(xml.contains("<lom:catalog>oai:repo.example.org</lom:catalog>"));

    let datacite = export(OutputFormat::Datacite, None).unwrap();
    assert!(datacite.contains("\"publisher\": \"Example University\""));

    let ui = export(OutputFormat::UiJson, None).unwrap();
    assert!(ui.contains("\"doi_url\": \"https://doi.org/10.5072/aaaaa-11111\""));

    let apa = export(OutputFormat::Citation, None).unwrap();
    assert!(apa.starts_with("Gruber, A. M. (2023)."));
    let chicago = export(OutputFormat::Citation, Some(CitationStyle::Chicago)).unwrap();
    assert!(chicago.starts_with("Gruber, Anna Maria."));
}

#[test]
fn test_record_export_missing_record() {
    let temp_dir = create_test_temp_dir();
    let service = create_test_service(&temp_dir);
    let err = record_export(
        &service,
        &Identity::system(),
        &ViewArgs::new(record_id("zzzzz-99999")),
        OutputFormat::LomXml,
        None,
        &LomConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ViewError::Service(e) if e.is_not_found()));
}
