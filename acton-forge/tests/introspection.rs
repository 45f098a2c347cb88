//! Integration tests for schema introspection
//!
//! The same `invoices` table is described through each dialect's catalog
//! encoding and must normalize to the same column facts.

use acton_forge::schema::{
    CatalogRow, ColumnDescriptor, ColumnQuery, ColumnType, Dialect, MemoryCatalog, QueryKind,
    SchemaIntrospector, SqlxCatalog,
};

fn row(pairs: &[(&str, Option<&str>)]) -> CatalogRow {
    CatalogRow::from_pairs(pairs.iter().copied())
}

fn postgres() -> MemoryCatalog {
    let column = |name, data_type, nullable, length| {
        row(&[
            ("column_name", Some(name)),
            ("data_type", Some(data_type)),
            ("udt_name", Some("varchar")),
            ("is_nullable", Some(nullable)),
            ("character_maximum_length", length),
        ])
    };
    let index = |index, column, primary| {
        row(&[
            ("index_name", Some(index)),
            ("column_name", Some(column)),
            ("is_primary", Some(primary)),
        ])
    };

    MemoryCatalog::new(Dialect::Postgres)
        .with_rows(
            QueryKind::Columns,
            "invoices",
            vec![
                column("id", "bigint", "NO", None),
                column("number", "character varying", "NO", Some("50")),
                column("status", "character varying", "NO", Some("255")),
                column("customer_id", "bigint", "YES", None),
            ],
        )
        .with_rows(
            QueryKind::UniqueIndexes,
            "invoices",
            vec![
                index("invoices_pkey", "id", "true"),
                index("invoices_number_unique", "number", "false"),
            ],
        )
        .with_rows(
            QueryKind::CheckConstraints,
            "invoices",
            vec![row(&[(
                "definition",
                Some("CHECK (((status)::text = ANY ((ARRAY['draft'::character varying, 'sent'::character varying, 'paid'::character varying])::text[])))"),
            )])],
        )
}

fn mysql() -> MemoryCatalog {
    let column = |field, ty, null, key| {
        row(&[
            ("Field", Some(field)),
            ("Type", Some(ty)),
            ("Null", Some(null)),
            ("Key", Some(key)),
            ("Default", None),
        ])
    };

    MemoryCatalog::new(Dialect::MySql).with_rows(
        QueryKind::Columns,
        "invoices",
        vec![
            column("id", "bigint(20) unsigned", "NO", "PRI"),
            column("number", "varchar(50)", "NO", "UNI"),
            column("status", "enum('draft','sent','paid')", "NO", ""),
            column("customer_id", "bigint(20) unsigned", "YES", "MUL"),
        ],
    )
}

fn sqlite() -> MemoryCatalog {
    let column = |name, ty, notnull, pk| {
        row(&[
            ("name", Some(name)),
            ("type", Some(ty)),
            ("notnull", Some(notnull)),
            ("pk", Some(pk)),
        ])
    };

    MemoryCatalog::new(Dialect::Sqlite)
        .with_rows(
            QueryKind::Columns,
            "invoices",
            vec![
                column("id", "INTEGER", "1", "1"),
                column("number", "varchar(50)", "1", "0"),
                column("status", "varchar", "1", "0"),
                column("customer_id", "INTEGER", "0", "0"),
            ],
        )
        .with_rows(
            QueryKind::IndexList,
            "invoices",
            vec![row(&[
                ("name", Some("sqlite_autoindex_invoices_1")),
                ("unique", Some("1")),
                ("origin", Some("u")),
            ])],
        )
        .with_rows(
            QueryKind::IndexColumns,
            "sqlite_autoindex_invoices_1",
            vec![row(&[("name", Some("number"))])],
        )
        .with_rows(
            QueryKind::TableDefinition,
            "invoices",
            vec![row(&[(
                "sql",
                Some(r#"CREATE TABLE "invoices" ("id" integer primary key autoincrement not null, "number" varchar(50) not null unique, "status" varchar check ("status" in ('draft', 'sent', 'paid')) not null, "customer_id" integer null)"#),
            )])],
        )
}

fn sql_server() -> MemoryCatalog {
    let column = |name, ty, length, nullable| {
        row(&[
            ("name", Some(name)),
            ("type_name", Some(ty)),
            ("max_length", Some(length)),
            ("is_nullable", Some(nullable)),
        ])
    };
    let index = |index, column, primary| {
        row(&[
            ("index_name", Some(index)),
            ("column_name", Some(column)),
            ("is_primary", Some(primary)),
        ])
    };

    MemoryCatalog::new(Dialect::SqlServer)
        .with_rows(
            QueryKind::Columns,
            "invoices",
            vec![
                column("id", "bigint", "8", "0"),
                column("number", "nvarchar", "100", "0"),
                column("status", "nvarchar", "510", "0"),
                column("customer_id", "bigint", "8", "1"),
            ],
        )
        .with_rows(
            QueryKind::UniqueIndexes,
            "invoices",
            vec![
                index("PK_invoices", "id", "1"),
                index("UQ_invoices_number", "number", "0"),
            ],
        )
        .with_rows(
            QueryKind::CheckConstraints,
            "invoices",
            vec![row(&[(
                "definition",
                Some("([status]=N'draft' OR [status]=N'sent' OR [status]=N'paid')"),
            )])],
        )
}

fn describe(catalog: &MemoryCatalog) -> Vec<ColumnDescriptor> {
    SchemaIntrospector::new(catalog).columns(&ColumnQuery::new("invoices"))
}

fn facts(columns: &[ColumnDescriptor]) -> Vec<(String, bool, bool, usize)> {
    columns
        .iter()
        .map(|column| {
            (
                column.name.clone(),
                column.nullable,
                column.unique,
                column.allowed_values.len(),
            )
        })
        .collect()
}

#[test]
fn test_dialects_normalize_identically() {
    let expected = vec![
        ("number".to_string(), false, true, 0),
        ("status".to_string(), false, false, 3),
        ("customer_id".to_string(), true, false, 0),
    ];

    for (dialect, catalog) in [
        ("postgres", postgres()),
        ("mysql", mysql()),
        ("sqlite", sqlite()),
        ("sqlserver", sql_server()),
    ] {
        let columns = describe(&catalog);
        assert_eq!(facts(&columns), expected, "{dialect}");

        let number = &columns[0];
        assert_eq!(number.column_type, ColumnType::String, "{dialect}");
        assert_eq!(number.max_length, Some(50), "{dialect}");

        let status = &columns[1];
        assert_eq!(status.column_type, ColumnType::Enum, "{dialect}");
        assert_eq!(status.allowed_values, vec!["draft", "sent", "paid"], "{dialect}");
        assert!(status.is_enumerated(), "{dialect}");
    }
}

#[test]
fn test_unregistered_table_is_empty_for_every_dialect() {
    for catalog in [postgres(), mysql(), sqlite(), sql_server()] {
        let columns = SchemaIntrospector::new(&catalog).columns(&ColumnQuery::new("payments"));
        assert!(columns.is_empty());
    }
}

#[test]
fn test_live_sqlite_table() {
    let catalog = SqlxCatalog::try_connect("sqlite::memory:").unwrap();
    catalog
        .execute(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE invoices (
                 id INTEGER PRIMARY KEY,
                 number VARCHAR(50) NOT NULL UNIQUE,
                 status VARCHAR(10) NOT NULL CHECK (status IN ('draft', 'sent', 'paid')),
                 customer_id INTEGER NULL REFERENCES customers(id),
                 created_at TIMESTAMP,
                 updated_at TIMESTAMP
             );",
        )
        .unwrap();

    let columns = SchemaIntrospector::new(&catalog).columns(&ColumnQuery::new("invoices"));
    assert_eq!(
        facts(&columns),
        vec![
            ("number".to_string(), false, true, 0),
            ("status".to_string(), false, false, 3),
            ("customer_id".to_string(), true, false, 0),
        ]
    );
    assert_eq!(columns[0].max_length, Some(50));
    assert_eq!(columns[1].allowed_values, vec!["draft", "sent", "paid"]);
    assert_eq!(columns[2].column_type, ColumnType::Integer);
}

#[test]
fn test_unsupported_database_degrades_to_empty() {
    let catalog = SqlxCatalog::connect("oracle://scott@db/orcl");
    let columns = SchemaIntrospector::new(&catalog).columns(&ColumnQuery::new("invoices"));
    assert!(columns.is_empty());
}
