//! Table name extraction from DDL statements.
//!
//! Used to restrict DDL passthrough to the tables selected for a dump.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the table a `CREATE TABLE`, `ALTER TABLE` or `CREATE INDEX`
/// statement applies to. Keywords are case-insensitive and may be separated
/// by any whitespace; names may be back-quoted.
static TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^\s*(?:CREATE\s+TABLE(?:\s+IF\s+NOT\s+EXISTS)?|ALTER\s+TABLE|CREATE\s+(?:UNIQUE\s+)?(?:NULL_FILTERED\s+)?INDEX(?:\s+IF\s+NOT\s+EXISTS)?\s+`?\w+`?\s+ON)\s+`?(\w+)`?",
    )
    .expect("table name pattern is valid")
});

/// Extract the table name a DDL statement applies to.
///
/// Returns `None` for statements that are not about a table (views, change
/// streams, ...) or that cannot be parsed.
pub fn parse_table_name_from_ddl(ddl: &str) -> Option<String> {
    TABLE_NAME_RE
        .captures(ddl)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Keep only the statements that apply to one of `tables`.
///
/// An empty `tables` keeps everything. With a filter, statements whose table
/// cannot be determined are dropped.
pub fn filter_ddls<'a>(ddls: &'a [String], tables: &[String]) -> Vec<&'a str> {
    ddls.iter()
        .map(String::as_str)
        .filter(|ddl| {
            tables.is_empty()
                || parse_table_name_from_ddl(ddl).is_some_and(|name| tables.contains(&name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_name_from_ddl() {
        let cases = [
            (
                "create table",
                "CREATE TABLE table_name_1 (\n  column1 STRING(32) NOT NULL,\n  column2 TIMESTAMP NOT NULL OPTIONS (\n    allow_commit_timestamp = true\n  ),\n) PRIMARY KEY(column1);",
                "table_name_1",
            ),
            (
                "create table, table include reserved words",
                "CREATE TABLE `table_name_1` (\n  column1 STRING(32) NOT NULL,\n) PRIMARY KEY(column1);",
                "table_name_1",
            ),
            (
                "create table, include multiple spaces",
                "   CREATE   TABLE    table_name_1     (\n  column1 STRING(32) NOT NULL,\n) PRIMARY KEY(column1);",
                "table_name_1",
            ),
            (
                "create table if not exists",
                "CREATE TABLE IF NOT EXISTS Singers (SingerId INT64) PRIMARY KEY(SingerId)",
                "Singers",
            ),
            (
                "create unique index",
                "CREATE UNIQUE INDEX table_name_1_column2_a ON table_name_1(column2);",
                "table_name_1",
            ),
            (
                "create null filtered index",
                "CREATE NULL_FILTERED INDEX AlbumsByTitle ON Albums(AlbumTitle)",
                "Albums",
            ),
            (
                "create index",
                "CREATE INDEX table_name_1_column2_a ON table_name_1(column2);",
                "table_name_1",
            ),
            (
                "create index, index name include reserved words",
                "CREATE INDEX `order` ON TABLE(`by`)",
                "TABLE",
            ),
            (
                "create index, table name include reserved words",
                "CREATE INDEX `order` ON `TABLE`(`by`)",
                "TABLE",
            ),
            (
                "create index, include multiple spaces",
                "  CREATE   INDEX    `order`   ON    TABLE(`by`)",
                "TABLE",
            ),
            (
                "alter table",
                "ALTER TABLE t5 ADD FOREIGN KEY(T6Id) REFERENCES t6(Id);",
                "t5",
            ),
            (
                "alter table, table name include reserved words",
                "ALTER TABLE `t5` ADD FOREIGN KEY(T6Id) REFERENCES t6(Id);",
                "t5",
            ),
            (
                "alter table, include multiple spaces",
                "  ALTER  TABLE \r\n `t5`   ADD   FOREIGN   KEY(T6Id) REFERENCES t6(Id);",
                "t5",
            ),
            ("lower case keywords", "create table lower_t (Id INT64) PRIMARY KEY(Id)", "lower_t"),
        ];

        for (desc, ddl, want) in cases {
            assert_eq!(
                parse_table_name_from_ddl(ddl).as_deref(),
                Some(want),
                "{}",
                desc
            );
        }
    }

    #[test]
    fn test_parse_non_table_ddl() {
        assert_eq!(parse_table_name_from_ddl("CREATE VIEW v SQL SECURITY INVOKER AS SELECT 1"), None);
        assert_eq!(parse_table_name_from_ddl("CREATE CHANGE STREAM s FOR ALL"), None);
        assert_eq!(parse_table_name_from_ddl(""), None);
    }

    #[test]
    fn test_filter_ddls() {
        let ddls = vec![
            "CREATE TABLE t1 (Id INT64) PRIMARY KEY(Id)".to_string(),
            "CREATE TABLE t2 (Id INT64) PRIMARY KEY(Id)".to_string(),
            "CREATE INDEX t2_by_id ON t2(Id)".to_string(),
            "CREATE VIEW v SQL SECURITY INVOKER AS SELECT 1".to_string(),
        ];

        assert_eq!(filter_ddls(&ddls, &[]).len(), 4);

        let kept = filter_ddls(&ddls, &["t2".to_string()]);
        assert_eq!(
            kept,
            vec![
                "CREATE TABLE t2 (Id INT64) PRIMARY KEY(Id)",
                "CREATE INDEX t2_by_id ON t2(Id)",
            ]
        );
    }
}
