//! Table metadata and the parent/child table forest.
//!
//! Spanner interleaves child tables in their parents, so a child's rows may
//! only be inserted once the parent rows exist. Schema rows arrive flat, each
//! naming its parent; [`TableForest::build`] turns them into owned trees and
//! [`TableForest::iter`] walks them parents-first.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DumpError, Result};

/// One row of the schema query: a table, its parent and its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Table name.
    pub name: String,

    /// Parent table name. `None` or empty for root tables.
    #[serde(default, alias = "parent")]
    pub parent_name: Option<String>,

    /// Column names in declaration order.
    #[serde(default)]
    pub columns: Vec<String>,
}

impl TableRow {
    pub fn new(name: impl Into<String>, parent_name: Option<&str>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            parent_name: parent_name.map(str::to_string),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Parent name, treating an empty string as no parent.
    pub fn parent(&self) -> Option<&str> {
        self.parent_name.as_deref().filter(|p| !p.is_empty())
    }
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Column names in declaration order; row values arrive in this order.
    pub columns: Vec<String>,

    /// Interleaved child tables, in schema order.
    pub child_tables: Vec<Table>,
}

impl Table {
    /// Create a table without children.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            child_tables: Vec::new(),
        }
    }

    /// Back-quoted table name.
    pub fn quoted_name(&self) -> String {
        format!("`{}`", self.name)
    }

    /// Back-quoted, comma separated column list. Empty for a table without
    /// columns.
    pub fn quoted_column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("`{}`", c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Query that reads every row of the table with columns in declaration
    /// order.
    pub fn select_statement(&self) -> String {
        format!(
            "SELECT {} FROM {}",
            self.quoted_column_list(),
            self.quoted_name()
        )
    }
}

/// Ordered forest of tables; roots in schema order, children nested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableForest {
    roots: Vec<Table>,
}

impl TableForest {
    /// Build the forest from flat schema rows.
    ///
    /// Rows keep their input order at every level. A row whose parent is not
    /// in `rows` (for example because the parent was filtered out) becomes a
    /// root.
    ///
    /// # Errors
    ///
    /// Returns `DumpError::Schema` for duplicate table names and for rows
    /// that cannot be reached from any root (parent cycles).
    pub fn build(rows: Vec<TableRow>) -> Result<Self> {
        let mut names = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !names.insert(row.name.as_str()) {
                return Err(DumpError::Schema(format!(
                    "duplicate table name in schema: {}",
                    row.name
                )));
            }
        }

        let mut root_ids = Vec::new();
        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            match row.parent() {
                Some(parent) if names.contains(parent) => {
                    children.entry(parent.to_string()).or_default().push(idx);
                }
                Some(parent) => {
                    warn!(
                        "Table {} references missing parent {}, dumping it as a root table",
                        row.name, parent
                    );
                    root_ids.push(idx);
                }
                None => root_ids.push(idx),
            }
        }

        let mut slots: Vec<Option<TableRow>> = rows.into_iter().map(Some).collect();
        let roots: Vec<Table> = root_ids
            .iter()
            .filter_map(|&idx| attach(idx, &mut slots, &children))
            .collect();

        let unreachable: Vec<String> = slots.into_iter().flatten().map(|row| row.name).collect();
        if !unreachable.is_empty() {
            return Err(DumpError::Schema(format!(
                "tables form a parent cycle: {}",
                unreachable.join(", ")
            )));
        }

        let forest = Self { roots };
        debug!(
            "Built table forest: {} tables, {} roots",
            forest.len(),
            forest.roots.len()
        );
        Ok(forest)
    }

    /// Root tables.
    pub fn roots(&self) -> &[Table] {
        &self.roots
    }

    /// Depth-first, parents-first iterator over every table.
    pub fn iter(&self) -> TableIter<'_> {
        TableIter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Visit every table parents-first, stopping at the first error.
    pub fn traverse<E, F>(&self, mut visit: F) -> std::result::Result<(), E>
    where
        F: FnMut(&Table) -> std::result::Result<(), E>,
    {
        for table in self.iter() {
            visit(table)?;
        }
        Ok(())
    }

    /// Total number of tables at every level.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find a table anywhere in the forest.
    pub fn find(&self, name: &str) -> Option<&Table> {
        self.iter().find(|t| t.name == name)
    }
}

impl<'a> IntoIterator for &'a TableForest {
    type Item = &'a Table;
    type IntoIter = TableIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order iterator returned by [`TableForest::iter`].
pub struct TableIter<'a> {
    stack: Vec<&'a Table>,
}

impl<'a> Iterator for TableIter<'a> {
    type Item = &'a Table;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.stack.pop()?;
        self.stack.extend(table.child_tables.iter().rev());
        Some(table)
    }
}

/// Take row `idx` and recursively attach its children. Each row is taken at
/// most once.
fn attach(
    idx: usize,
    slots: &mut [Option<TableRow>],
    children: &HashMap<String, Vec<usize>>,
) -> Option<Table> {
    let row = slots[idx].take()?;
    let child_tables = match children.get(&row.name) {
        Some(ids) => ids
            .iter()
            .filter_map(|&child| attach(child, slots, children))
            .collect(),
        None => Vec::new(),
    };
    Some(Table {
        name: row.name,
        columns: row.columns,
        child_tables,
    })
}
