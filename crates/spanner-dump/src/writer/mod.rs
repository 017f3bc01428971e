//! Bulk INSERT statement writer.
//!
//! Encoded rows are buffered per table and written as multi-row
//! `INSERT INTO ... VALUES (...), (...);` statements, one statement per
//! `bulk_size` rows.

use std::io::Write;

use tracing::debug;

use crate::core::schema::Table;
use crate::error::Result;

/// Rows per INSERT statement when not configured.
///
/// Keeps each statement well under Spanner's per-commit mutation limit
/// (20,000) for typical column counts.
pub const DEFAULT_BULK_SIZE: usize = 100;

/// Counters for one table's statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Rows written in flushed statements.
    pub rows: u64,
    /// INSERT statements written.
    pub statements: u64,
}

/// Writer that groups one table's rows into bulk INSERT statements.
///
/// Not thread-safe: an instance serves exactly one table and one caller, and
/// is dropped once the table is done.
pub struct BufferedWriter<'a, W: Write> {
    out: &'a mut W,
    table: &'a Table,
    quoted_columns: String,
    buffer: Vec<String>,
    bulk_size: usize,
    stats: WriteStats,
}

impl<'a, W: Write> BufferedWriter<'a, W> {
    /// Create a writer for `table`. A `bulk_size` of 0 means
    /// [`DEFAULT_BULK_SIZE`].
    pub fn new(table: &'a Table, out: &'a mut W, bulk_size: usize) -> Self {
        let bulk_size = if bulk_size == 0 {
            DEFAULT_BULK_SIZE
        } else {
            bulk_size
        };
        Self {
            out,
            table,
            quoted_columns: table.quoted_column_list(),
            buffer: Vec::with_capacity(bulk_size),
            bulk_size,
            stats: WriteStats::default(),
        }
    }

    /// Buffer one encoded row. Flushes when the buffer reaches the bulk size.
    pub fn write(&mut self, values: &[String]) -> Result<()> {
        self.buffer.push(format!("({})", values.join(", ")));
        if self.buffer.len() >= self.bulk_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write buffered rows as one INSERT statement. No-op when nothing is
    /// buffered.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        // ", " between tuples, plus the fixed statement text.
        let mut n = self.buffer.len() * 2;
        n += self.quoted_columns.len() + self.table.name.len();
        n += 32;
        n += self.buffer.iter().map(String::len).sum::<usize>();

        let mut statement = String::with_capacity(n);
        statement.push_str("INSERT INTO `");
        statement.push_str(&self.table.name);
        statement.push_str("` (");
        statement.push_str(&self.quoted_columns);
        statement.push_str(") VALUES ");
        statement.push_str(&self.buffer.join(", "));
        statement.push_str(";\n");

        self.out.write_all(statement.as_bytes())?;

        let rows = self.buffer.len() as u64;
        self.stats.rows += rows;
        self.stats.statements += 1;
        self.buffer.clear();
        debug!("Flushed {} rows into {}", rows, self.table.name);
        Ok(())
    }

    /// Number of rows waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Counters so far (flushed rows only).
    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Flush the remainder and return the table's counters.
    pub fn finish(mut self) -> Result<WriteStats> {
        self.flush()?;
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t1() -> Table {
        Table::new("t1", vec!["Id".to_string(), "StrCol".to_string()])
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_bulk_size_one() {
        let table = t1();
        let mut out = Vec::new();
        let mut writer = BufferedWriter::new(&table, &mut out, 1);
        writer.write(&row(&["1", "\"foo\""])).unwrap();
        writer.write(&row(&["2", "NULL"])).unwrap();
        let stats = writer.finish().unwrap();

        assert_eq!(
            output(out),
            "INSERT INTO `t1` (`Id`, `StrCol`) VALUES (1, \"foo\");\n\
             INSERT INTO `t1` (`Id`, `StrCol`) VALUES (2, NULL);\n"
        );
        assert_eq!(stats, WriteStats { rows: 2, statements: 2 });
    }

    #[test]
    fn test_auto_flush_at_threshold() {
        let table = t1();
        let mut out = Vec::new();
        let mut writer = BufferedWriter::new(&table, &mut out, 3);

        writer.write(&row(&["1", "\"a\""])).unwrap();
        writer.write(&row(&["2", "\"b\""])).unwrap();
        assert_eq!(writer.pending(), 2);
        assert_eq!(writer.stats().statements, 0);

        writer.write(&row(&["3", "\"c\""])).unwrap();
        assert_eq!(writer.pending(), 0);
        assert_eq!(writer.stats(), WriteStats { rows: 3, statements: 1 });
        drop(writer);

        assert_eq!(
            output(out),
            "INSERT INTO `t1` (`Id`, `StrCol`) VALUES (1, \"a\"), (2, \"b\"), (3, \"c\");\n"
        );
    }

    #[test]
    fn test_remainder_needs_flush() {
        let table = t1();
        let mut out = Vec::new();
        let mut writer = BufferedWriter::new(&table, &mut out, 2);
        for i in 1..=5 {
            writer.write(&row(&[&i.to_string(), "NULL"])).unwrap();
        }
        assert_eq!(writer.pending(), 1);
        assert_eq!(writer.stats().statements, 2);

        writer.flush().unwrap();
        assert_eq!(writer.pending(), 0);
        assert_eq!(writer.stats(), WriteStats { rows: 5, statements: 3 });
        drop(writer);

        let text = output(out);
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("VALUES (5, NULL);\n"));
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let table = t1();
        let mut out = Vec::new();
        let mut writer = BufferedWriter::new(&table, &mut out, 10);
        writer.flush().unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.stats(), WriteStats::default());
        assert_eq!(writer.finish().unwrap(), WriteStats::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_columns() {
        let table = Table::new("Empty", vec![]);
        let mut out = Vec::new();
        let mut writer = BufferedWriter::new(&table, &mut out, 10);
        writer.write(&[]).unwrap();
        writer.finish().unwrap();
        assert_eq!(output(out), "INSERT INTO `Empty` () VALUES ();\n");
    }

    #[test]
    fn test_zero_bulk_size_uses_default() {
        let table = t1();
        let mut out = Vec::new();
        let mut writer = BufferedWriter::new(&table, &mut out, 0);
        for i in 0..DEFAULT_BULK_SIZE - 1 {
            writer.write(&row(&[&i.to_string(), "NULL"])).unwrap();
        }
        assert_eq!(writer.pending(), DEFAULT_BULK_SIZE - 1);
        writer.write(&row(&["last", "NULL"])).unwrap();
        assert_eq!(writer.pending(), 0);
    }
}
