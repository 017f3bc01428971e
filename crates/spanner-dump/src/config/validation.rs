//! Configuration validation.

use super::{Config, DumpConfig};
use crate::error::{DumpError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.snapshot.as_os_str().is_empty() {
        return Err(DumpError::Config("source.snapshot is required".into()));
    }

    validate_dump(&config.dump)
}

/// Validate the dump section on its own (used when no config file is given).
pub fn validate_dump(dump: &DumpConfig) -> Result<()> {
    if let Some(0) = dump.bulk_size {
        return Err(DumpError::Config("dump.bulk_size must be at least 1".into()));
    }

    for table in &dump.tables {
        if table.is_empty() {
            return Err(DumpError::Config(
                "dump.tables must not contain empty names".into(),
            ));
        }
        if table.contains('\0') {
            return Err(DumpError::Config(format!(
                "dump.tables contains an invalid name: {:?}",
                table
            )));
        }
    }

    if dump.no_ddl && dump.no_data {
        tracing::warn!("Both no_ddl and no_data are set; the dump will be empty");
    }

    Ok(())
}
