use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::options::{find_option, ConfigItem, ConfigOption};

/// An ingestion job: one source, one sink, and the tables to move.
///
/// Parsed from a TOML job file. Options are kept as ordered arrays of
/// `{ name, value }` so declaration order (and first-match lookups) survive
/// parsing. The run-wide settings are optional; the CLI can supply them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    /// Default ingestion mode for every table ("full", "daily", "incrementally").
    pub mode: Option<String>,
    /// Output format, before alias resolution.
    pub format: Option<String>,
    /// Output root; each table lands under `<location>/<tableName>`.
    pub location: Option<String>,
    /// Root under which registered schema documents live.
    pub schemas_location: Option<String>,

    pub source: ConfigItem,

    #[serde(default)]
    pub sink: ConfigItem,

    #[serde(default)]
    pub tables: Vec<TableEntry>,
}

/// One `[[tables]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(default)]
    pub options: Vec<ConfigOption>,
}

impl TableEntry {
    /// The declared `tableName`, if any. Absence is reported by the ingestion
    /// step that needs it, not here.
    pub fn table_name(&self) -> Option<&str> {
        find_option("tableName", &self.options).map(|o| o.value.as_str())
    }
}

impl JobFile {
    /// Parse a job from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, CoreError> {
        let job: Self = toml::from_str(toml_str)?;
        job.validate()?;
        Ok(job)
    }

    /// Load a job from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.source.name.trim().is_empty() {
            return Err(CoreError::InvalidJob("source must have a name".into()));
        }
        if self.tables.is_empty() {
            tracing::warn!(source = %self.source.name, "job declares no tables");
        }
        Ok(())
    }
}
