//! JSON snapshot source.
//!
//! A snapshot is an export of one consistent read of a database:
//!
//! ```json
//! {
//!   "ddls": ["CREATE TABLE t1 (Id INT64 NOT NULL) PRIMARY KEY (Id)"],
//!   "tables": [
//!     {
//!       "name": "t1",
//!       "parent": null,
//!       "columns": ["Id"],
//!       "rows": [[{"type": {"code": "INT64"}, "value": "1"}]]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::schema::{Table, TableRow};
use crate::core::traits::{DumpSource, ReadOptions};
use crate::core::value::RawColumn;
use crate::error::{DumpError, Result};

use super::stream_rows;

/// Snapshot file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub ddls: Vec<String>,

    #[serde(default)]
    pub tables: Vec<SnapshotTable>,
}

/// One table of a snapshot with its rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTable {
    pub name: String,

    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub rows: Vec<Vec<RawColumn>>,
}

impl SnapshotTable {
    fn table_row(&self) -> TableRow {
        TableRow {
            name: self.name.clone(),
            parent_name: self.parent.clone(),
            columns: self.columns.clone(),
        }
    }
}

/// Source reading from a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Arc<Snapshot>,
}

impl SnapshotSource {
    /// Wrap an already loaded snapshot.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    /// Load a snapshot file.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let source = Self::from_json(&content)?;
        debug!(
            "Loaded snapshot {} ({} DDLs, {} tables)",
            path.display(),
            source.snapshot.ddls.len(),
            source.snapshot.tables.len()
        );
        Ok(source)
    }

    /// Parse snapshot JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot))
    }

    fn find(&self, name: &str) -> Option<&SnapshotTable> {
        self.snapshot.tables.iter().find(|t| t.name == name)
    }

    fn warn_on_timestamp(opts: &ReadOptions) {
        if let Some(ts) = opts.timestamp {
            warn!(
                "Snapshot sources cannot read at a timestamp; ignoring {}",
                ts.to_rfc3339()
            );
        }
    }
}

#[async_trait]
impl DumpSource for SnapshotSource {
    async fn fetch_ddls(&self) -> Result<Vec<String>> {
        Ok(self.snapshot.ddls.clone())
    }

    async fn fetch_table_rows(&self, opts: &ReadOptions) -> Result<Vec<TableRow>> {
        Self::warn_on_timestamp(opts);
        let mut rows: Vec<TableRow> = self
            .snapshot
            .tables
            .iter()
            .filter(|t| opts.includes(&t.name))
            .map(SnapshotTable::table_row)
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn read_table(
        &self,
        table: &Table,
        _opts: &ReadOptions,
    ) -> mpsc::Receiver<Result<Vec<RawColumn>>> {
        match self.find(&table.name) {
            Some(t) => stream_rows(t.rows.clone(), None),
            None => stream_rows(
                Vec::new(),
                Some(DumpError::fetch(format!(
                    "table {} not found in snapshot",
                    table.name
                ))),
            ),
        }
    }

    fn source_type(&self) -> &str {
        "snapshot"
    }
}
