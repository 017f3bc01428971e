//! In-memory source.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::schema::{Table, TableRow};
use crate::core::traits::{DumpSource, ReadOptions};
use crate::core::value::RawColumn;
use crate::error::{DumpError, Result};

use super::stream_rows;

/// Source holding DDLs, schema rows and table data in memory.
///
/// ```
/// use serde_json::json;
/// use spanner_dump::core::{RawColumn, SpannerType, TableRow, TypeCode};
/// use spanner_dump::source::MemorySource;
///
/// let source = MemorySource::new()
///     .with_ddl("CREATE TABLE t1 (Id INT64 NOT NULL) PRIMARY KEY (Id)")
///     .with_table(TableRow::new("t1", None, &["Id"]))
///     .with_rows(
///         "t1",
///         vec![vec![RawColumn::new(SpannerType::scalar(TypeCode::Int64), json!("1"))]],
///     );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    ddls: Vec<String>,
    tables: Vec<TableRow>,
    rows: HashMap<String, Vec<Vec<RawColumn>>>,
    failures: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ddl(mut self, ddl: impl Into<String>) -> Self {
        self.ddls.push(ddl.into());
        self
    }

    pub fn with_table(mut self, row: TableRow) -> Self {
        self.tables.push(row);
        self
    }

    /// Append rows to a table's data.
    pub fn with_rows(mut self, table: impl Into<String>, rows: Vec<Vec<RawColumn>>) -> Self {
        self.rows.entry(table.into()).or_default().extend(rows);
        self
    }

    /// Make the stream of `table` fail with a fetch error after its rows.
    pub fn with_failure(mut self, table: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(table.into(), message.into());
        self
    }
}

#[async_trait]
impl DumpSource for MemorySource {
    async fn fetch_ddls(&self) -> Result<Vec<String>> {
        Ok(self.ddls.clone())
    }

    async fn fetch_table_rows(&self, opts: &ReadOptions) -> Result<Vec<TableRow>> {
        let mut rows: Vec<TableRow> = self
            .tables
            .iter()
            .filter(|t| opts.includes(&t.name))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn read_table(
        &self,
        table: &Table,
        _opts: &ReadOptions,
    ) -> mpsc::Receiver<Result<Vec<RawColumn>>> {
        let rows = self.rows.get(&table.name).cloned().unwrap_or_default();
        let failure = self
            .failures
            .get(&table.name)
            .map(|msg| DumpError::Fetch(msg.clone()));
        stream_rows(rows, failure)
    }

    fn source_type(&self) -> &str {
        "memory"
    }
}
