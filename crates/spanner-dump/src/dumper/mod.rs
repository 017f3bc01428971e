//! Dump orchestrator - main workflow coordinator.
//!
//! Writes the DDL statements, then every table's rows as bulk INSERT
//! statements, parents before interleaved children.

use std::io::Write;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::DumpConfig;
use crate::core::schema::{Table, TableForest};
use crate::core::traits::{DumpSource, ReadOptions};
use crate::ddl::filter_ddls;
use crate::encode::encode_raw_row;
use crate::error::{DumpError, Result};
use crate::writer::{BufferedWriter, WriteStats};

/// Per-table result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: String,
    pub rows: u64,
    pub statements: u64,
}

/// Result of a dump run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpSummary {
    /// DDL statements written.
    pub ddls: usize,

    /// Tables dumped.
    pub tables: usize,

    /// Rows written.
    pub rows: u64,

    /// INSERT statements written.
    pub statements: u64,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the dump started.
    pub started_at: DateTime<Utc>,

    /// When the dump completed.
    pub completed_at: DateTime<Utc>,

    /// Per-table counters, in output order.
    pub table_summaries: Vec<TableSummary>,
}

/// Dump orchestrator.
///
/// Processes one table and one row at a time, in the order the source
/// returns them. Owns the output for the duration of the dump.
pub struct Dumper<S, W> {
    source: S,
    out: W,
    config: DumpConfig,
}

impl<S: DumpSource, W: Write> Dumper<S, W> {
    pub fn new(source: S, out: W, config: DumpConfig) -> Self {
        Self {
            source,
            out,
            config,
        }
    }

    /// Give back the output.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Run the dump: DDLs unless `no_ddl`, data unless `no_data`.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<DumpSummary> {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!(
            "Starting dump from {} source",
            self.source.source_type()
        );

        let ddls = if self.config.no_ddl {
            debug!("Skipping DDLs");
            0
        } else {
            self.dump_ddls().await?
        };

        let table_summaries = if self.config.no_data {
            debug!("Skipping data");
            Vec::new()
        } else {
            self.dump_tables(cancel).await?
        };

        self.out.flush()?;

        let summary = DumpSummary {
            ddls,
            tables: table_summaries.len(),
            rows: table_summaries.iter().map(|t| t.rows).sum(),
            statements: table_summaries.iter().map(|t| t.statements).sum(),
            duration_seconds: timer.elapsed().as_secs_f64(),
            started_at,
            completed_at: Utc::now(),
            table_summaries,
        };

        info!(
            "Dump complete: {} DDLs, {} tables, {} rows in {:.2}s",
            summary.ddls, summary.tables, summary.rows, summary.duration_seconds
        );
        Ok(summary)
    }

    /// Write each DDL statement terminated by `;` and a newline. Returns the
    /// number of statements written.
    pub async fn dump_ddls(&mut self) -> Result<usize> {
        let ddls = self.source.fetch_ddls().await?;
        let selected = filter_ddls(&ddls, &self.config.tables);
        info!("Writing {} of {} DDL statements", selected.len(), ddls.len());

        for ddl in &selected {
            self.out.write_all(ddl.as_bytes())?;
            self.out.write_all(b";\n")?;
        }
        Ok(selected.len())
    }

    /// Dump every table's rows, parents first.
    pub async fn dump_tables(&mut self, cancel: &CancellationToken) -> Result<Vec<TableSummary>> {
        let opts = self.config.read_options();
        let rows = self.source.fetch_table_rows(&opts).await?;
        let forest = TableForest::build(rows)?;
        info!("Dumping {} tables", forest.len());

        let mut summaries = Vec::with_capacity(forest.len());
        for table in forest.iter() {
            if cancel.is_cancelled() {
                return Err(DumpError::Cancelled);
            }

            let stats = match self.dump_table(table, &opts, cancel).await {
                Ok(stats) => stats,
                Err(DumpError::Cancelled) => return Err(DumpError::Cancelled),
                Err(e) => return Err(DumpError::table(&table.name, e)),
            };

            debug!(
                "Table {}: {} rows in {} statements",
                table.name, stats.rows, stats.statements
            );
            summaries.push(TableSummary {
                table: table.name.clone(),
                rows: stats.rows,
                statements: stats.statements,
            });
        }

        Ok(summaries)
    }

    async fn dump_table(
        &mut self,
        table: &Table,
        opts: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<WriteStats> {
        let bulk_size = self.config.effective_bulk_size();
        let mut rx = self.source.read_table(table, opts);
        let mut writer = BufferedWriter::new(table, &mut self.out, bulk_size);

        loop {
            let row = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DumpError::Cancelled),
                row = rx.recv() => row,
            };
            let Some(row) = row else { break };
            let row = row?;

            if row.len() != table.columns.len() {
                return Err(DumpError::fetch(format!(
                    "row has {} columns, expected {}",
                    row.len(),
                    table.columns.len()
                )));
            }

            let values = encode_raw_row(&row)?;
            writer.write(&values)?;
        }

        writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::TableRow;
    use crate::core::types::{SpannerType, TypeCode};
    use crate::core::value::RawColumn;
    use crate::source::MemorySource;
    use serde_json::{json, Value};

    fn int(v: i64) -> RawColumn {
        RawColumn::new(SpannerType::scalar(TypeCode::Int64), json!(v.to_string()))
    }

    fn string(v: Value) -> RawColumn {
        RawColumn::new(SpannerType::scalar(TypeCode::String), v)
    }

    fn config(bulk_size: usize) -> DumpConfig {
        DumpConfig {
            bulk_size: Some(bulk_size),
            ..Default::default()
        }
    }

    async fn dump(source: MemorySource, config: DumpConfig) -> (Result<DumpSummary>, String) {
        let mut dumper = Dumper::new(source, Vec::new(), config);
        let result = dumper.run(&CancellationToken::new()).await;
        let out = String::from_utf8(dumper.into_inner()).unwrap();
        (result, out)
    }

    fn t1_source() -> MemorySource {
        MemorySource::new()
            .with_table(TableRow::new("t1", None, &["Id", "StrCol"]))
            .with_rows(
                "t1",
                vec![
                    vec![int(1), string(json!("foo"))],
                    vec![int(2), string(Value::Null)],
                ],
            )
    }

    #[tokio::test]
    async fn test_end_to_end_bulk_size_one() {
        let (result, out) = dump(t1_source(), config(1)).await;
        let summary = result.unwrap();

        assert_eq!(
            out,
            "INSERT INTO `t1` (`Id`, `StrCol`) VALUES (1, \"foo\");\n\
             INSERT INTO `t1` (`Id`, `StrCol`) VALUES (2, NULL);\n"
        );
        assert_eq!(summary.tables, 1);
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.statements, 2);
    }

    #[tokio::test]
    async fn test_final_flush_of_remainder() {
        let (result, out) = dump(t1_source(), DumpConfig::default()).await;
        result.unwrap();
        assert_eq!(
            out,
            "INSERT INTO `t1` (`Id`, `StrCol`) VALUES (1, \"foo\"), (2, NULL);\n"
        );
    }

    #[tokio::test]
    async fn test_ddls_then_parents_before_children() {
        let source = MemorySource::new()
            .with_ddl("CREATE TABLE Albums (SingerId INT64, AlbumId INT64) PRIMARY KEY (SingerId, AlbumId), INTERLEAVE IN PARENT Singers")
            .with_ddl("CREATE TABLE Singers (SingerId INT64) PRIMARY KEY (SingerId)")
            .with_table(TableRow::new("Albums", Some("Singers"), &["SingerId", "AlbumId"]))
            .with_table(TableRow::new("Singers", None, &["SingerId"]))
            .with_table(TableRow::new("Venues", None, &["VenueId"]))
            .with_rows("Albums", vec![vec![int(1), int(10)]])
            .with_rows("Singers", vec![vec![int(1)]]);

        let (result, out) = dump(source, DumpConfig::default()).await;
        let summary = result.unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("CREATE TABLE Albums") && lines[0].ends_with(';'));
        assert!(lines[1].starts_with("CREATE TABLE Singers"));
        assert_eq!(lines[2], "INSERT INTO `Singers` (`SingerId`) VALUES (1);");
        assert_eq!(
            lines[3],
            "INSERT INTO `Albums` (`SingerId`, `AlbumId`) VALUES (1, 10);"
        );

        let order: Vec<&str> = summary
            .table_summaries
            .iter()
            .map(|t| t.table.as_str())
            .collect();
        assert_eq!(order, vec!["Singers", "Albums", "Venues"]);
        assert_eq!(summary.table_summaries[2].statements, 0);
        assert_eq!(summary.ddls, 2);
    }

    #[tokio::test]
    async fn test_no_ddl_and_no_data() {
        let source = t1_source().with_ddl("CREATE TABLE t1 (Id INT64) PRIMARY KEY (Id)");

        let (result, out) = dump(
            source.clone(),
            DumpConfig {
                no_ddl: true,
                ..Default::default()
            },
        )
        .await;
        assert_eq!(result.unwrap().ddls, 0);
        assert!(out.starts_with("INSERT INTO"));

        let (result, out) = dump(
            source,
            DumpConfig {
                no_data: true,
                ..Default::default()
            },
        )
        .await;
        assert_eq!(result.unwrap().tables, 0);
        assert_eq!(out, "CREATE TABLE t1 (Id INT64) PRIMARY KEY (Id);\n");
    }

    #[tokio::test]
    async fn test_table_filter_applies_to_ddls_and_data() {
        let source = t1_source()
            .with_ddl("CREATE TABLE t1 (Id INT64) PRIMARY KEY (Id)")
            .with_ddl("CREATE TABLE t2 (Id INT64) PRIMARY KEY (Id)")
            .with_table(TableRow::new("t2", None, &["Id"]))
            .with_rows("t2", vec![vec![int(7)]]);

        let (result, out) = dump(
            source,
            DumpConfig {
                tables: vec!["t2".into()],
                ..Default::default()
            },
        )
        .await;
        result.unwrap();
        assert_eq!(
            out,
            "CREATE TABLE t2 (Id INT64) PRIMARY KEY (Id);\nINSERT INTO `t2` (`Id`) VALUES (7);\n"
        );
    }

    #[tokio::test]
    async fn test_encode_error_wrapped_with_table() {
        let source = MemorySource::new()
            .with_table(TableRow::new("s", None, &["Payload"]))
            .with_rows(
                "s",
                vec![vec![RawColumn::new(
                    SpannerType::scalar(TypeCode::Struct),
                    json!([]),
                )]],
            );

        let (result, out) = dump(source, DumpConfig::default()).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            DumpError::Table { ref table, ref source } if table == "s" && matches!(**source, DumpError::Encode(_))
        ));
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA_ERROR);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_valid_prefix() {
        let source = t1_source().with_failure("t1", "stream reset");

        let (result, out) = dump(source, config(1)).await;
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_FETCH_ERROR);
        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with(";\n"));
    }

    #[tokio::test]
    async fn test_row_width_mismatch() {
        let source = MemorySource::new()
            .with_table(TableRow::new("t", None, &["A", "B"]))
            .with_rows("t", vec![vec![int(1)]]);

        let (result, _) = dump(source, DumpConfig::default()).await;
        let err = result.unwrap_err();
        assert!(err.format_detailed().contains("row has 1 columns, expected 2"));
    }

    #[tokio::test]
    async fn test_schema_cycle_fails() {
        let source = MemorySource::new()
            .with_table(TableRow::new("a", Some("b"), &[]))
            .with_table(TableRow::new("b", Some("a"), &[]));

        let (result, _) = dump(source, DumpConfig::default()).await;
        assert!(matches!(result.unwrap_err(), DumpError::Schema(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_tables() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut dumper = Dumper::new(t1_source(), Vec::new(), DumpConfig::default());
        let err = dumper.run(&cancel).await.unwrap_err();
        assert!(matches!(err, DumpError::Cancelled));
        assert_eq!(err.exit_code(), crate::error::EXIT_CANCELLED);
        assert!(dumper.into_inner().is_empty());
    }
}
