//! Migration request and result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::MigratorError;
use crate::settings::Settings;

/// What to do when an imported connection id already exists in the target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionStrategy {
    /// Abort the whole import before writing anything
    #[default]
    Stop,
    /// Leave the existing row untouched
    Skip,
    /// Replace the existing row
    Overwrite,
}

impl CollisionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for CollisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionStrategy {
    type Err = MigratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(MigratorError::InvalidStrategy(s.to_string())),
        }
    }
}

/// Export parameters
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Restrict the export to these ids; empty means everything
    pub connection_ids: Vec<String>,
    /// Interchange file to write
    pub output_path: PathBuf,
    /// Transport key; a fresh one is generated when absent
    pub transport_key: Option<String>,
}

impl ExportRequest {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    /// Request writing to `file`, placed under the configured export dir when relative
    pub fn from_settings(settings: &Settings, file: impl AsRef<Path>) -> Self {
        Self::new(settings.export_path(file))
    }
}

/// Export outcome
///
/// `transport_key` is the key the file was sealed with and has to reach
/// whoever performs the import out of band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,
    pub output_path: PathBuf,
    pub connection_count: usize,
    pub exported_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Import parameters
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Interchange file to read
    pub input_path: PathBuf,
    /// Key the interchange file was sealed with
    pub transport_key: String,
    pub collision_strategy: CollisionStrategy,
    /// Prepended to every imported id; falls back to the target profile's prefix
    pub id_prefix: Option<String>,
    /// Restrict the import to these ids (before prefixing); empty means everything
    pub connection_ids: Vec<String>,
}

impl ImportRequest {
    pub fn new(input_path: impl Into<PathBuf>, transport_key: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            transport_key: transport_key.into(),
            collision_strategy: CollisionStrategy::default(),
            id_prefix: None,
            connection_ids: Vec::new(),
        }
    }

    /// Request using the configured default collision strategy
    pub fn from_settings(
        settings: &Settings,
        input_path: impl Into<PathBuf>,
        transport_key: impl Into<String>,
    ) -> Self {
        Self::new(input_path, transport_key).with_strategy(settings.default_collision_strategy)
    }

    pub fn with_strategy(mut self, strategy: CollisionStrategy) -> Self {
        self.collision_strategy = strategy;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }
}

/// Import outcome
///
/// On failure the counts still describe the rows already written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub imported_count: usize,
    pub skipped_count: usize,
    pub overwritten_count: usize,
    pub imported_ids: Vec<String>,
    pub skipped_ids: Vec<String>,
    pub overwritten_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResult {
    pub(crate) fn record_imported(&mut self, id: String) {
        self.imported_ids.push(id);
        self.imported_count += 1;
    }

    pub(crate) fn record_skipped(&mut self, id: String) {
        self.skipped_ids.push(id);
        self.skipped_count += 1;
    }

    pub(crate) fn record_overwritten(&mut self, id: String) {
        self.overwritten_ids.push(id);
        self.overwritten_count += 1;
    }

    /// Total rows written to the target
    pub fn written_count(&self) -> usize {
        self.imported_count + self.overwritten_count
    }
}
