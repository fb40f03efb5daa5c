//! Integration tests for loading the configuration
//!
//! These tests change process environment variables and therefore run serially.

use serial_test::serial;
use std::path::PathBuf;

use lom_records::config::{
    ENV_CITATION_STYLE, ENV_DATA_DIR, ENV_OAISERVER_ID_PREFIX, ENV_PUBLISHER, LomConfig,
};
use lom_records::serializers::CitationStyle;

use test_util::create_test_temp_dir;

fn clear_env() {
    for key in [
        ENV_DATA_DIR,
        ENV_OAISERVER_ID_PREFIX,
        ENV_PUBLISHER,
        ENV_CITATION_STYLE,
    ] {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
#[serial]
fn test_load_file_then_environment() {
    clear_env();
    let temp_dir = create_test_temp_dir();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        "data_dir = \"/var/lib/lom\"\npublisher = \"From File\"\ncitation_style = \"harvard\"\n",
    )
    .unwrap();
    unsafe { std::env::set_var(ENV_PUBLISHER, "From Env") };

    let config = LomConfig::load(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.data_dir, PathBuf::from("/var/lib/lom"));
    assert_eq!(config.publisher, "From Env");
    assert_eq!(config.citation_style, CitationStyle::Harvard);
}

#[test]
#[serial]
fn test_environment_overrides_data_dir() {
    clear_env();
    let temp_dir = create_test_temp_dir();
    unsafe {
        std::env::set_var(ENV_DATA_DIR, temp_dir.path());
        std::env::set_var(ENV_OAISERVER_ID_PREFIX, "oai:env.example.org");
    }

    let config = LomConfig::load(None).unwrap();
    clear_env();

    assert_eq!(config.data_dir, temp_dir.path());
    assert_eq!(config.oaiserver_id_prefix, "oai:env.example.org");
}

#[test]
#[serial]
fn test_missing_explicit_file_fails() {
    clear_env();
    let temp_dir = create_test_temp_dir();
    let result = LomConfig::load(Some(&temp_dir.path().join("missing.toml")));
    assert!(result.is_err());
}
