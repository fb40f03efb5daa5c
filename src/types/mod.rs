//! Core type definitions for LOM records
//!
//! Records are stored and passed around as JSON documents. The types here put
//! names on the parts of those documents the rest of the crate relies on:
//! identifiers, access levels, file manifests and the LOM metadata tree.

pub mod metadata;
pub mod record;

pub use metadata::*;
pub use record::*;
