/// Settings loaded from a TOML file and the environment
pub mod config;

/// Record serializers: LOM-XML, DataCite, UI JSON and citation strings
pub mod serializers;

/// Record storage, indexing, access checks and demo fixtures
pub mod services;

/// Core type definitions and domain models used throughout the library
pub mod types;

/// View wrappers and record views
pub mod ui;
