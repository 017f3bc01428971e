//! Configuration type definitions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::traits::ReadOptions;
use crate::writer::DEFAULT_BULK_SIZE;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the data comes from.
    pub source: SourceConfig,

    /// Dump behavior.
    #[serde(default)]
    pub dump: DumpConfig,
}

/// Source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path of the JSON snapshot to dump.
    pub snapshot: PathBuf,
}

/// Dump behavior configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Rows per INSERT statement (default: 100).
    #[serde(default)]
    pub bulk_size: Option<usize>,

    /// Skip DDL output.
    #[serde(default)]
    pub no_ddl: bool,

    /// Skip data output.
    #[serde(default)]
    pub no_data: bool,

    /// Read timestamp for a consistent snapshot (RFC 3339).
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Tables to dump. Empty means all tables.
    #[serde(default)]
    pub tables: Vec<String>,
}

impl DumpConfig {
    /// Rows per INSERT statement with the default applied.
    pub fn effective_bulk_size(&self) -> usize {
        self.bulk_size.unwrap_or(DEFAULT_BULK_SIZE)
    }

    /// Read options derived from this configuration.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            timestamp: self.timestamp,
            tables: self.tables.clone(),
        }
    }
}
