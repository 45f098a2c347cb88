//! Schema introspection
//!
//! Reads column metadata for one table from a [`CatalogSource`] and
//! normalizes it across PostgreSQL, MySQL/MariaDB, SQLite and SQL Server.
//!
//! Introspection never fails: an unsupported dialect, an unreachable database
//! or a missing table all produce an empty column list and a warning.
//!
//! # Example
//!
//! ```rust,no_run
//! use acton_forge::schema::{ColumnQuery, SchemaIntrospector, SqlxCatalog};
//!
//! let catalog = SqlxCatalog::connect("sqlite://./dev.db");
//! let introspector = SchemaIntrospector::new(&catalog);
//! for column in introspector.columns(&ColumnQuery::new("invoices")) {
//!     println!("{column}");
//! }
//! ```

pub mod catalog;
pub mod column;
pub mod constraint;
pub mod dialect;

pub use catalog::{CatalogQuery, CatalogRow, CatalogSource, MemoryCatalog, QueryKind, SqlxCatalog};
pub use column::{ColumnDescriptor, ColumnType};
pub use dialect::Dialect;

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::detect::EnumBinding;

/// Detector findings applied to introspected columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityHint {
    /// Columns holding per-locale translations
    pub translatable: BTreeSet<String>,
    /// Enum types already bound to columns
    pub enum_bindings: BTreeMap<String, EnumBinding>,
}

/// Which columns to read
#[derive(Debug, Clone)]
pub struct ColumnQuery {
    /// Table to describe
    pub table: String,
    /// Columns to drop besides the primary key
    pub excluded: Vec<String>,
    /// Detector findings to apply
    pub hint: EntityHint,
}

impl ColumnQuery {
    /// Describe `table`, excluding the timestamp columns
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            excluded: vec!["created_at".to_string(), "updated_at".to_string()],
            hint: EntityHint::default(),
        }
    }

    /// Replace the excluded column list
    #[must_use]
    pub fn excluding<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Apply detector findings
    #[must_use]
    pub fn with_hint(mut self, hint: EntityHint) -> Self {
        self.hint = hint;
        self
    }
}

/// Reads normalized column metadata
pub struct SchemaIntrospector<'a> {
    source: &'a dyn CatalogSource,
}

impl<'a> SchemaIntrospector<'a> {
    /// Create an introspector over a catalog
    #[must_use]
    pub fn new(source: &'a dyn CatalogSource) -> Self {
        Self { source }
    }

    /// Columns of the queried table, in declaration order
    ///
    /// Primary-key and excluded columns are dropped. Any failure yields an
    /// empty list.
    #[must_use]
    pub fn columns(&self, query: &ColumnQuery) -> Vec<ColumnDescriptor> {
        let Some(dialect) = self.source.dialect() else {
            warn!(table = %query.table, "No usable database dialect, skipping introspection");
            return Vec::new();
        };
        if query.table.trim().is_empty() {
            debug!("Empty table name, skipping introspection");
            return Vec::new();
        }

        let described = match dialect.describe(self.source, &query.table) {
            Ok(described) => described,
            Err(err) => {
                warn!(table = %query.table, %dialect, error = %err, "Schema introspection failed");
                return Vec::new();
            }
        };

        let columns: Vec<ColumnDescriptor> = described
            .into_iter()
            .filter(|column| !column.primary)
            .map(|column| column.descriptor)
            .filter(|column| !query.excluded.contains(&column.name))
            .map(|mut column| {
                column.translatable = query.hint.translatable.contains(&column.name);
                if let Some(binding) = query.hint.enum_bindings.get(&column.name) {
                    column.enum_binding = Some(binding.clone());
                }
                column
            })
            .collect();

        debug!(table = %query.table, %dialect, count = columns.len(), "Introspected columns");
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BindingSource;

    fn sqlite_catalog() -> MemoryCatalog {
        let column = |name: &str, ty: &str, notnull: &str, pk: &str| {
            CatalogRow::from_pairs([
                ("name", Some(name)),
                ("type", Some(ty)),
                ("notnull", Some(notnull)),
                ("pk", Some(pk)),
            ])
        };
        MemoryCatalog::new(Dialect::Sqlite).with_rows(
            QueryKind::Columns,
            "posts",
            vec![
                column("id", "INTEGER", "1", "1"),
                column("title", "TEXT", "0", "0"),
                column("kind", "varchar", "1", "0"),
                column("created_at", "datetime", "0", "0"),
            ],
        )
    }

    #[test]
    fn test_primary_and_excluded_columns_are_dropped() {
        let catalog = sqlite_catalog();
        let columns = SchemaIntrospector::new(&catalog).columns(&ColumnQuery::new("posts"));
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["title", "kind"]);
    }

    #[test]
    fn test_custom_exclusions() {
        let catalog = sqlite_catalog();
        let columns = SchemaIntrospector::new(&catalog)
            .columns(&ColumnQuery::new("posts").excluding(["kind"]));
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["title", "created_at"]);
    }

    #[test]
    fn test_hint_is_applied() {
        let catalog = sqlite_catalog();
        let mut hint = EntityHint::default();
        hint.translatable.insert("title".to_string());
        hint.enum_bindings.insert(
            "kind".to_string(),
            EnumBinding::new("crate::enums::post_kind::PostKind", BindingSource::Cast),
        );

        let columns =
            SchemaIntrospector::new(&catalog).columns(&ColumnQuery::new("posts").with_hint(hint));
        assert!(columns[0].translatable);
        assert_eq!(
            columns[1].enum_binding.as_ref().map(|b| b.source),
            Some(BindingSource::Cast)
        );
    }

    #[test]
    fn test_unknown_table_is_empty() {
        let catalog = sqlite_catalog();
        assert!(SchemaIntrospector::new(&catalog)
            .columns(&ColumnQuery::new("missing"))
            .is_empty());
    }

    #[test]
    fn test_failing_catalog_degrades_to_empty() {
        let catalog = SqlxCatalog::connect("mssql://localhost/app");
        assert!(SchemaIntrospector::new(&catalog)
            .columns(&ColumnQuery::new("invoices"))
            .is_empty());
    }
}
