//! Dialect-specific metadata queries
//!
//! Each dialect reads its own catalog and reduces the answers to
//! [`TableColumn`]s. Nullability and uniqueness mean the same thing
//! everywhere: `nullable` when the column accepts NULL, `unique` when the
//! column alone forms a unique constraint or unique index.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::catalog::{CatalogQuery, CatalogRow, CatalogSource, QueryKind};
use super::column::{ColumnDescriptor, ColumnType};
use super::constraint::{check_allowed_values, check_clauses, parse_enum_type};
use crate::error::ForgeResult;

/// Supported database dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL
    Postgres,
    /// MySQL or MariaDB
    MySql,
    /// SQLite
    Sqlite,
    /// Microsoft SQL Server
    SqlServer,
}

impl Dialect {
    /// Dialect selected by a connection URL's scheme
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::schema::Dialect;
    /// assert_eq!(Dialect::from_url("postgresql://localhost/app"), Some(Dialect::Postgres));
    /// assert_eq!(Dialect::from_url("mariadb://localhost/app"), Some(Dialect::MySql));
    /// assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
    /// assert_eq!(Dialect::from_url("sqlserver://localhost"), Some(Dialect::SqlServer));
    /// assert_eq!(Dialect::from_url("oracle://localhost"), None);
    /// ```
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let lowered = url.trim().to_ascii_lowercase();
        if lowered.starts_with("postgres://") || lowered.starts_with("postgresql://") {
            Some(Self::Postgres)
        } else if lowered.starts_with("mysql://") || lowered.starts_with("mariadb://") {
            Some(Self::MySql)
        } else if lowered.starts_with("sqlite:") {
            Some(Self::Sqlite)
        } else if lowered.starts_with("mssql://") || lowered.starts_with("sqlserver://") {
            Some(Self::SqlServer)
        } else {
            None
        }
    }

    /// Describe every column of `table`, primary keys included
    pub(crate) fn describe(
        self,
        source: &dyn CatalogSource,
        table: &str,
    ) -> ForgeResult<Vec<TableColumn>> {
        match self {
            Self::Postgres => describe_postgres(source, table),
            Self::MySql => describe_mysql(source, table),
            Self::Sqlite => describe_sqlite(source, table),
            Self::SqlServer => describe_sql_server(source, table),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlserver",
        };
        f.write_str(name)
    }
}

/// A described column plus its primary-key membership
#[derive(Debug, Clone)]
pub(crate) struct TableColumn {
    pub descriptor: ColumnDescriptor,
    pub primary: bool,
}

/// SQL for the PostgreSQL column listing
pub const POSTGRES_COLUMNS: &str = "\
SELECT column_name::text AS column_name, data_type::text AS data_type, \
udt_name::text AS udt_name, is_nullable::text AS is_nullable, \
character_maximum_length::text AS character_maximum_length \
FROM information_schema.columns \
WHERE table_schema = current_schema() AND table_name = $1 \
ORDER BY ordinal_position";

/// SQL for PostgreSQL unique indexes and constraints
pub const POSTGRES_UNIQUE_INDEXES: &str = "\
SELECT i.relname::text AS index_name, a.attname::text AS column_name, \
ix.indisprimary::text AS is_primary \
FROM pg_index ix \
JOIN pg_class t ON t.oid = ix.indrelid \
JOIN pg_class i ON i.oid = ix.indexrelid \
JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
WHERE t.relname = $1 AND ix.indisunique \
AND t.relnamespace = current_schema()::regnamespace";

/// SQL for PostgreSQL check constraint definitions
pub const POSTGRES_CHECKS: &str = "\
SELECT pg_get_constraintdef(c.oid)::text AS definition \
FROM pg_constraint c JOIN pg_class t ON c.conrelid = t.oid \
WHERE t.relname = $1 AND c.contype = 'c' \
AND t.relnamespace = current_schema()::regnamespace";

/// SQL for the labels of a PostgreSQL enum type
pub const POSTGRES_ENUM_LABELS: &str = "\
SELECT e.enumlabel::text AS label \
FROM pg_type t JOIN pg_enum e ON e.enumtypid = t.oid \
WHERE t.typname = $1 ORDER BY e.enumsortorder";

/// SQL for the SQLite column listing
pub const SQLITE_COLUMNS: &str =
    "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?) ORDER BY cid";

/// SQL for the SQLite index list
pub const SQLITE_INDEX_LIST: &str =
    "SELECT name, \"unique\", origin FROM pragma_index_list(?)";

/// SQL for the columns of one SQLite index
pub const SQLITE_INDEX_COLUMNS: &str = "SELECT name FROM pragma_index_info(?) ORDER BY seqno";

/// SQL for the SQLite table definition
pub const SQLITE_TABLE_SQL: &str =
    "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?";

/// SQL for the SQL Server column listing
pub const SQL_SERVER_COLUMNS: &str = "\
SELECT c.name AS name, t.name AS type_name, \
CAST(c.max_length AS varchar(10)) AS max_length, \
CAST(c.is_nullable AS varchar(1)) AS is_nullable \
FROM sys.columns c JOIN sys.types t ON c.user_type_id = t.user_type_id \
WHERE c.object_id = OBJECT_ID(@P1) ORDER BY c.column_id";

/// SQL for SQL Server unique indexes and constraints
pub const SQL_SERVER_UNIQUE_INDEXES: &str = "\
SELECT i.name AS index_name, c.name AS column_name, \
CAST(i.is_primary_key AS varchar(1)) AS is_primary \
FROM sys.indexes i \
JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id \
JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id \
WHERE i.object_id = OBJECT_ID(@P1) AND i.is_unique = 1";

/// SQL for SQL Server check constraint definitions
pub const SQL_SERVER_CHECKS: &str = "\
SELECT cc.definition AS definition FROM sys.check_constraints cc \
WHERE cc.parent_object_id = OBJECT_ID(@P1)";

/// MySQL column listing; the table is inlined as a quoted identifier
#[must_use]
pub fn mysql_columns(table: &str) -> String {
    format!("SHOW COLUMNS FROM `{}`", table.replace('`', "``"))
}

#[derive(Debug, Default)]
struct IndexMembership {
    primary: BTreeSet<String>,
    unique: BTreeSet<String>,
}

impl IndexMembership {
    /// Group `(index_name, column_name, is_primary)` rows by index
    fn from_rows(rows: &[CatalogRow]) -> Self {
        let mut indexes: BTreeMap<&str, (Vec<&str>, bool)> = BTreeMap::new();
        for row in rows {
            let (Some(index), Some(column)) = (row.get("index_name"), row.get("column_name"))
            else {
                continue;
            };
            let entry = indexes.entry(index).or_default();
            entry.0.push(column);
            entry.1 |= row.flag("is_primary");
        }

        let mut membership = Self::default();
        for (columns, primary) in indexes.into_values() {
            membership.record(&columns, primary);
        }
        membership
    }

    fn record(&mut self, columns: &[&str], primary: bool) {
        if primary {
            self.primary.extend(columns.iter().map(ToString::to_string));
        } else if let [single] = columns {
            self.unique.insert((*single).to_string());
        }
    }
}

fn check_definitions(rows: &[CatalogRow]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get("definition"))
        .map(ToString::to_string)
        .collect()
}

fn allowed_from_checks(checks: &[String], column: &str) -> Vec<String> {
    checks
        .iter()
        .find_map(|definition| check_allowed_values(definition, column))
        .unwrap_or_default()
}

/// Length declared in a type spelling such as `varchar(50)`
fn declared_length(spelling: &str) -> Option<u32> {
    let open = spelling.find('(')?;
    let close = spelling[open..].find(')')? + open;
    spelling[open + 1..close].trim().parse().ok()
}

fn finish(
    table: &str,
    name: &str,
    spelling: &str,
    allowed_values: Vec<String>,
    nullable: bool,
    max_length: Option<u32>,
) -> ColumnDescriptor {
    let column_type = if allowed_values.is_empty() {
        ColumnType::from_sql(spelling)
    } else {
        ColumnType::Enum
    };
    let max_length = max_length.filter(|_| column_type.is_textual());

    let mut descriptor = ColumnDescriptor::new(table, name, column_type);
    descriptor.nullable = nullable;
    descriptor.max_length = max_length;
    descriptor.allowed_values = allowed_values;
    descriptor
}

fn describe_postgres(source: &dyn CatalogSource, table: &str) -> ForgeResult<Vec<TableColumn>> {
    let rows = source.fetch(&CatalogQuery::new(QueryKind::Columns, table, POSTGRES_COLUMNS))?;
    let indexes = IndexMembership::from_rows(&source.fetch(&CatalogQuery::new(
        QueryKind::UniqueIndexes,
        table,
        POSTGRES_UNIQUE_INDEXES,
    ))?);
    let checks = check_definitions(&source.fetch(&CatalogQuery::new(
        QueryKind::CheckConstraints,
        table,
        POSTGRES_CHECKS,
    ))?);

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(name) = row.get("column_name") else {
            continue;
        };
        let data_type = row.get("data_type").unwrap_or_default();

        let (spelling, mut allowed) = if data_type.eq_ignore_ascii_case("USER-DEFINED") {
            let udt = row.get("udt_name").unwrap_or_default();
            let labels = source
                .fetch(&CatalogQuery::new(QueryKind::EnumLabels, udt, POSTGRES_ENUM_LABELS))?
                .iter()
                .filter_map(|label| label.get("label"))
                .map(ToString::to_string)
                .collect();
            (udt, labels)
        } else {
            (data_type, Vec::new())
        };
        if allowed.is_empty() {
            allowed = allowed_from_checks(&checks, name);
        }

        let max_length = row
            .integer("character_maximum_length")
            .and_then(|length| u32::try_from(length).ok());
        let mut descriptor = finish(
            table,
            name,
            spelling,
            allowed,
            row.get("is_nullable").is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            max_length,
        );
        descriptor.unique = indexes.unique.contains(name);
        columns.push(TableColumn {
            primary: indexes.primary.contains(name),
            descriptor,
        });
    }
    Ok(columns)
}

fn describe_sqlite(source: &dyn CatalogSource, table: &str) -> ForgeResult<Vec<TableColumn>> {
    let rows = source.fetch(&CatalogQuery::new(QueryKind::Columns, table, SQLITE_COLUMNS))?;

    let mut indexes = IndexMembership::default();
    for index in source.fetch(&CatalogQuery::new(QueryKind::IndexList, table, SQLITE_INDEX_LIST))? {
        let Some(index_name) = index.get("name") else {
            continue;
        };
        if !index.flag("unique") || index.get("origin") == Some("pk") {
            continue;
        }
        let members = source.fetch(&CatalogQuery::new(
            QueryKind::IndexColumns,
            index_name,
            SQLITE_INDEX_COLUMNS,
        ))?;
        let names: Vec<&str> = members.iter().filter_map(|member| member.get("name")).collect();
        indexes.record(&names, false);
    }

    let checks: Vec<String> = source
        .fetch(&CatalogQuery::new(QueryKind::TableDefinition, table, SQLITE_TABLE_SQL))?
        .iter()
        .filter_map(|row| row.get("sql"))
        .flat_map(check_clauses)
        .collect();

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(name) = row.get("name") else {
            continue;
        };
        let spelling = row.get("type").unwrap_or_default();
        let mut descriptor = finish(
            table,
            name,
            spelling,
            allowed_from_checks(&checks, name),
            !row.flag("notnull"),
            declared_length(spelling),
        );
        descriptor.unique = indexes.unique.contains(name);
        columns.push(TableColumn {
            primary: row.integer("pk").is_some_and(|position| position > 0),
            descriptor,
        });
    }
    Ok(columns)
}

fn describe_mysql(source: &dyn CatalogSource, table: &str) -> ForgeResult<Vec<TableColumn>> {
    let rows = source.fetch(
        &CatalogQuery::new(QueryKind::Columns, table, mysql_columns(table)).without_binds(),
    )?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(name) = row.get("field") else {
            continue;
        };
        let spelling = row.get("type").unwrap_or_default();
        let key = row.get("key").unwrap_or_default();
        let mut descriptor = finish(
            table,
            name,
            spelling,
            parse_enum_type(spelling).unwrap_or_default(),
            row.get("null").is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            declared_length(spelling),
        );
        descriptor.unique = key.eq_ignore_ascii_case("UNI");
        columns.push(TableColumn {
            primary: key.eq_ignore_ascii_case("PRI"),
            descriptor,
        });
    }
    Ok(columns)
}

fn describe_sql_server(source: &dyn CatalogSource, table: &str) -> ForgeResult<Vec<TableColumn>> {
    let rows = source.fetch(&CatalogQuery::new(QueryKind::Columns, table, SQL_SERVER_COLUMNS))?;
    let indexes = IndexMembership::from_rows(&source.fetch(&CatalogQuery::new(
        QueryKind::UniqueIndexes,
        table,
        SQL_SERVER_UNIQUE_INDEXES,
    ))?);
    let checks = check_definitions(&source.fetch(&CatalogQuery::new(
        QueryKind::CheckConstraints,
        table,
        SQL_SERVER_CHECKS,
    ))?);

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(name) = row.get("name") else {
            continue;
        };
        let spelling = row.get("type_name").unwrap_or_default();
        let wide = matches!(spelling.to_ascii_lowercase().as_str(), "nvarchar" | "nchar");
        let max_length = row
            .integer("max_length")
            .filter(|bytes| *bytes > 0)
            .map(|bytes| if wide { bytes / 2 } else { bytes })
            .and_then(|length| u32::try_from(length).ok());

        let mut descriptor = finish(
            table,
            name,
            spelling,
            allowed_from_checks(&checks, name),
            row.flag("is_nullable"),
            max_length,
        );
        descriptor.unique = indexes.unique.contains(name);
        columns.push(TableColumn {
            primary: indexes.primary.contains(name),
            descriptor,
        });
    }
    Ok(columns)
}
