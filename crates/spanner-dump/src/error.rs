//! Error types for the dump library.

use thiserror::Error;

/// Exit code for configuration errors (bad flags, invalid YAML, missing fields).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for values or schema rows that cannot be turned into statements.
pub const EXIT_DATA_ERROR: u8 = 2;
/// Exit code for failures reading from the source.
pub const EXIT_FETCH_ERROR: u8 = 3;
/// Exit code for output or file errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code when the dump was interrupted (128 + SIGINT).
pub const EXIT_CANCELLED: u8 = 130;

/// Main error type for dump operations.
#[derive(Error, Debug)]
pub enum DumpError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A column value could not be rendered as a literal.
    ///
    /// Raised for STRUCT-typed columns and for raw values that do not
    /// match their declared type.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Schema rows could not be assembled into a table forest.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Reading DDLs, schema rows or table rows from the source failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Dumping a specific table failed.
    #[error("Failed to dump table {table}")]
    Table {
        table: String,
        #[source]
        source: Box<DumpError>,
    },

    /// IO error (output stream, snapshot and config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dump was cancelled (SIGINT, etc.)
    #[error("Dump cancelled")]
    Cancelled,
}

impl DumpError {
    /// Create an Encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        DumpError::Encode(message.into())
    }

    /// Create a Fetch error.
    pub fn fetch(message: impl Into<String>) -> Self {
        DumpError::Fetch(message.into())
    }

    /// Wrap an error with the name of the table being dumped.
    pub fn table(table: impl Into<String>, source: DumpError) -> Self {
        DumpError::Table {
            table: table.into(),
            source: Box::new(source),
        }
    }

    /// Process exit code for this error.
    ///
    /// Table errors report the code of the underlying failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            DumpError::Config(_) | DumpError::Yaml(_) => EXIT_CONFIG_ERROR,
            DumpError::Encode(_) | DumpError::Schema(_) => EXIT_DATA_ERROR,
            DumpError::Fetch(_) | DumpError::Json(_) => EXIT_FETCH_ERROR,
            DumpError::Table { source, .. } => source.exit_code(),
            DumpError::Io(_) => EXIT_IO_ERROR,
            DumpError::Cancelled => EXIT_CANCELLED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_error_reports_inner_exit_code() {
        let err = DumpError::table("Singers", DumpError::encode("bad value"));
        assert_eq!(err.exit_code(), EXIT_DATA_ERROR);

        let err = DumpError::table("Singers", DumpError::Cancelled);
        assert_eq!(err.exit_code(), EXIT_CANCELLED);
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let err = DumpError::table("Albums", DumpError::fetch("session expired"));
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Failed to dump table Albums\n"));
        assert!(detailed.contains("Caused by:\n  1: Fetch error: session expired"));
    }

    #[test]
    fn test_io_error_exit_code() {
        let err: DumpError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
    }
}
