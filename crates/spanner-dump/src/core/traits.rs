//! Source abstraction for dumps.
//!
//! A [`DumpSource`] hands over everything the dumper needs from a database:
//! the DDL statements, one schema row per table, and a stream of raw rows per
//! table. Reads are expected to come from one consistent snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::Result;

use super::schema::{Table, TableRow};
use super::value::RawColumn;

/// Channel capacity for streamed rows.
pub const ROW_CHANNEL_CAPACITY: usize = 256;

/// Options shared by every read of one dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Read timestamp. `None` reads the latest data.
    pub timestamp: Option<DateTime<Utc>>,

    /// Tables to read. Empty means all tables.
    pub tables: Vec<String>,
}

impl ReadOptions {
    /// Whether `name` passes the table filter.
    pub fn includes(&self, name: &str) -> bool {
        self.tables.is_empty() || self.tables.iter().any(|t| t == name)
    }
}

/// Read schema and data from a source database.
///
/// # Streaming
///
/// [`read_table`](DumpSource::read_table) returns a bounded channel receiver.
/// Implementations feed it from a background task, so a slow output applies
/// backpressure to the reader. Closing the channel ends the table; an `Err`
/// item aborts it.
#[async_trait]
pub trait DumpSource: Send + Sync {
    /// DDL statements of the database, without trailing semicolons.
    async fn fetch_ddls(&self) -> Result<Vec<String>>;

    /// One row per table, in table name order, restricted to
    /// `opts.tables` when that is non-empty.
    async fn fetch_table_rows(&self, opts: &ReadOptions) -> Result<Vec<TableRow>>;

    /// Start streaming the rows of `table`. Each item holds the row's
    /// columns in `table.columns` order.
    fn read_table(&self, table: &Table, opts: &ReadOptions)
        -> mpsc::Receiver<Result<Vec<RawColumn>>>;

    /// Source type identifier (e.g. "memory", "snapshot").
    fn source_type(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_options_includes() {
        let all = ReadOptions::default();
        assert!(all.includes("Singers"));

        let some = ReadOptions {
            tables: vec!["Singers".into(), "Albums".into()],
            ..Default::default()
        };
        assert!(some.includes("Albums"));
        assert!(!some.includes("Songs"));
    }
}
