//! Dump sources.
//!
//! - [`MemorySource`]: tables and rows built up in code
//! - [`SnapshotSource`]: a JSON snapshot file exported from a database

mod memory;
mod snapshot;

pub use memory::MemorySource;
pub use snapshot::{Snapshot, SnapshotSource, SnapshotTable};

use tokio::sync::mpsc;

use crate::core::traits::ROW_CHANNEL_CAPACITY;
use crate::core::value::RawColumn;
use crate::error::{DumpError, Result};

/// Stream `rows` through a bounded channel from a background task, followed
/// by `failure` if one is given.
///
/// Stops early when the receiver is dropped.
pub(crate) fn stream_rows(
    rows: Vec<Vec<RawColumn>>,
    failure: Option<DumpError>,
) -> mpsc::Receiver<Result<Vec<RawColumn>>> {
    let (tx, rx) = mpsc::channel(ROW_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        for row in rows {
            if tx.send(Ok(row)).await.is_err() {
                return;
            }
        }
        if let Some(e) = failure {
            let _ = tx.send(Err(e)).await;
        }
    });

    rx
}
