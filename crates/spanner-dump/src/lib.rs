//! # spanner-dump
//!
//! Export a Spanner database as a replayable SQL script.
//!
//! The output is the database's DDL statements followed by its data as
//! bulk `INSERT` statements:
//!
//! - **Exact literals**: every value renders as a literal that reads back to
//!   the same value (shortest round-trip floats, hex-escaped bytes,
//!   nanosecond timestamps)
//! - **Interleave order**: parent tables are dumped before their
//!   interleaved children
//! - **Bulk statements**: rows are grouped into multi-row `INSERT`s of a
//!   configurable size
//! - **Table filter**: restrict DDLs and data to selected tables
//!
//! ## Example
//!
//! ```rust,no_run
//! use spanner_dump::{Config, Dumper, SnapshotSource};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> spanner_dump::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let source = SnapshotSource::open(&config.source.snapshot).await?;
//!     let mut dumper = Dumper::new(source, std::io::stdout().lock(), config.dump);
//!     let summary = dumper.run(&CancellationToken::new()).await?;
//!     eprintln!("Dumped {} rows", summary.rows);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod ddl;
pub mod dumper;
pub mod encode;
pub mod error;
pub mod source;
pub mod writer;

// Re-exports for convenient access
pub use crate::core::{ColumnValue, DumpSource, RawColumn, ReadOptions, Table, TableForest, TableRow};
pub use config::{Config, DumpConfig, SourceConfig};
pub use ddl::parse_table_name_from_ddl;
pub use dumper::{DumpSummary, Dumper, TableSummary};
pub use encode::{encode_raw, encode_value};
pub use error::{DumpError, Result};
pub use source::{MemorySource, SnapshotSource};
pub use writer::{BufferedWriter, WriteStats, DEFAULT_BULK_SIZE};
