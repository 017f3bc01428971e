//! Core types shared by the dump pipeline.
//!
//! - [`types`]: Spanner type descriptors
//! - [`value`]: raw wire values and their typed decoding
//! - [`schema`]: table metadata and the interleave forest
//! - [`traits`]: the [`DumpSource`] seam implemented by `source` modules

pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

pub use schema::{Table, TableForest, TableIter, TableRow};
pub use traits::{DumpSource, ReadOptions};
pub use types::{SpannerType, TypeCode};
pub use value::{decode_row, ArrayValue, ColumnValue, RawColumn};
