//! Configuration
//!
//! Settings come from a TOML file and may be overridden by environment
//! variables:
//!
//! | key                   | environment              |
//! |-----------------------|--------------------------|
//! | `data_dir`            | `LOM_DATA_DIR`           |
//! | `oaiserver_id_prefix` | `LOM_OAISERVER_ID_PREFIX`|
//! | `publisher`           | `LOM_PUBLISHER`          |
//! | `citation_style`      | `LOM_CITATION_STYLE`     |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::serializers::CitationStyle;

pub const ENV_DATA_DIR: &str = "LOM_DATA_DIR";
pub const ENV_OAISERVER_ID_PREFIX: &str = "LOM_OAISERVER_ID_PREFIX";
pub const ENV_PUBLISHER: &str = "LOM_PUBLISHER";
pub const ENV_CITATION_STYLE: &str = "LOM_CITATION_STYLE";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings of the LOM records module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LomConfig {
    /// Directory holding records, drafts and indices
    pub data_dir: PathBuf,
    /// Catalog of repository-local identifiers in LOM-XML
    pub oaiserver_id_prefix: String,
    /// Publisher named in DataCite and citations
    pub publisher: String,
    /// Default citation style
    pub citation_style: CitationStyle,
}

impl Default for LomConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            oaiserver_id_prefix: "oai:lom-records".to_string(),
            publisher: "LOM Repository".to_string(),
            citation_style: CitationStyle::default(),
        }
    }
}

impl LomConfig {
    /// Load from `path`, else from the default config file when present, else defaults;
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply overrides looked up by environment variable name
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = lookup(ENV_OAISERVER_ID_PREFIX) {
            self.oaiserver_id_prefix = prefix;
        }
        if let Some(publisher) = lookup(ENV_PUBLISHER) {
            self.publisher = publisher;
        }
        if let Some(style) = lookup(ENV_CITATION_STYLE) {
            self.citation_style = style.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CITATION_STYLE,
                value: style,
            })?;
        }
        Ok(())
    }
}

/// `<config dir>/lom-records/config.toml`, e.g. `~/.config/lom-records/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lom-records").join("config.toml"))
}

/// `<data dir>/lom-records`, e.g. `~/.local/share/lom-records`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lom-records")
}
