//! Typed placeholder sets, one per artifact kind
//!
//! Each context owns exactly the facts its template needs and turns them into
//! [`Placeholders`]. Code blocks that depend on the column list (struct
//! fields, SQL, bind calls) are assembled here so templates stay flat.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::detect::{MediaCardinality, MediaField};
use crate::naming::Naming;
use crate::schema::{ColumnDescriptor, ColumnType, Dialect};
use crate::template::{Placeholders, TemplateContext, TemplateValue};

const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Rust field for a column: identifier plus the attributes renaming it back
fn field_for(column: &str) -> (String, Vec<String>) {
    if RESERVED.contains(&column) {
        return (format!("r#{column}"), Vec::new());
    }
    let snake = Naming::to_snake_case(column);
    let ident = match snake.as_str() {
        "self" | "super" | "crate" => format!("{snake}_"),
        _ if Naming::is_identifier(&snake) => snake,
        _ => format!("field_{snake}"),
    };
    if ident == column {
        (ident, Vec::new())
    } else {
        (
            ident,
            vec![
                format!("#[serde(rename = \"{column}\")]"),
                format!("#[sqlx(rename = \"{column}\")]"),
            ],
        )
    }
}

/// Field identifier for a column
#[must_use]
pub fn field_ident(column: &str) -> String {
    field_for(column).0
}

/// Enum variant identifier for a stored value
fn variant_ident(value: &str) -> String {
    let pascal = Naming::to_pascal_case(value);
    if Naming::is_identifier(&pascal) && pascal != "Self" {
        pascal
    } else {
        format!("V{}", pascal.replace(|c: char| !c.is_ascii_alphanumeric(), ""))
    }
}

fn quote(text: &str) -> String {
    TemplateValue::text(text).literal()
}

/// Placeholders for the `enum` template
#[derive(Debug, Clone)]
pub struct EnumContext {
    /// Enum type name
    pub name: String,
    /// Table owning the column
    pub table: String,
    /// Column the enum describes
    pub column: String,
    /// Stored values, in order
    pub values: Vec<String>,
}

impl EnumContext {
    /// Variant identifiers paired with their values, collisions suffixed
    #[must_use]
    pub fn variants(&self) -> Vec<(String, String)> {
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        self.values
            .iter()
            .map(|value| {
                let ident = variant_ident(value);
                let count = seen.entry(ident.clone()).or_default();
                *count += 1;
                let ident = if *count == 1 { ident } else { format!("{ident}{count}") };
                (ident, value.clone())
            })
            .collect()
    }
}

impl TemplateContext for EnumContext {
    fn template(&self) -> &'static str {
        "enum"
    }

    fn placeholders(&self) -> Placeholders {
        let variants = self.variants();

        let mut declarations = String::new();
        let mut arms = String::new();
        for (ident, value) in &variants {
            let value = quote(value);
            let _ = writeln!(declarations, "    #[serde(rename = {value})]");
            let _ = writeln!(declarations, "    #[sqlx(rename = {value})]");
            let _ = writeln!(declarations, "    {ident},");
            let _ = writeln!(arms, "            Self::{ident} => {value},");
        }

        Placeholders::new()
            .with("name", self.name.as_str())
            .with("table", self.table.as_str())
            .with("column", self.column.as_str())
            .with("variants", declarations.trim_end())
            .with("arms", arms.trim_end())
            .with(
                "values",
                self.values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", "),
            )
    }
}

/// Related entity embedded in a transfer object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedTransferObject {
    /// Field name, the relationship accessor
    pub field: String,
    /// Identifier of the related transfer object
    pub identifier: String,
    /// Whether the relation holds many entities
    pub collection: bool,
}

/// Placeholders for the `transfer_object` template
#[derive(Debug, Clone)]
pub struct TransferObjectContext {
    /// Entity name
    pub entity: String,
    /// Backing table
    pub table: String,
    /// Introspected columns
    pub columns: Vec<ColumnDescriptor>,
    /// Embedded related transfer objects
    pub nested: Vec<NestedTransferObject>,
    /// Attached media fields
    pub media: Vec<MediaField>,
}

impl TemplateContext for TransferObjectContext {
    fn template(&self) -> &'static str {
        "transfer_object"
    }

    fn placeholders(&self) -> Placeholders {
        let mut fields = String::new();
        for column in &self.columns {
            let (ident, attributes) = field_for(&column.name);
            if column.translatable {
                let _ = writeln!(fields, "    /// Translations keyed by locale");
            }
            for attribute in attributes {
                let _ = writeln!(fields, "    {attribute}");
            }
            let _ = writeln!(fields, "    pub {ident}: {},", column.rust_type());
        }

        for media in &self.media {
            let accepts = media
                .mime
                .map(|mime| format!(", accepts {} files", mime.as_str()))
                .unwrap_or_default();
            let _ = writeln!(fields, "    /// `{}` media collection{accepts}", media.collection);
            let _ = writeln!(fields, "    #[sqlx(skip)]");
            match media.cardinality {
                MediaCardinality::Single => {
                    let _ = writeln!(fields, "    #[serde(default)]");
                    let _ = writeln!(fields, "    pub {}: Option<String>,", field_ident(&media.name));
                }
                MediaCardinality::Multiple => {
                    let _ = writeln!(fields, "    #[serde(default)]");
                    let _ = writeln!(fields, "    pub {}: Vec<String>,", field_ident(&media.name));
                }
            }
        }

        for nested in &self.nested {
            let _ = writeln!(fields, "    #[sqlx(skip)]");
            if nested.collection {
                let _ = writeln!(fields, "    #[serde(default, skip_serializing_if = \"Vec::is_empty\")]");
                let _ = writeln!(
                    fields,
                    "    pub {}: Vec<{}>,",
                    field_ident(&nested.field),
                    nested.identifier
                );
            } else {
                let _ = writeln!(fields, "    #[serde(default, skip_serializing_if = \"Option::is_none\")]");
                let _ = writeln!(
                    fields,
                    "    pub {}: Option<Box<{}>>,",
                    field_ident(&nested.field),
                    nested.identifier
                );
            }
        }

        Placeholders::new()
            .with("name", format!("{}Data", self.entity))
            .with("entity", self.entity.as_str())
            .with("table", self.table.as_str())
            .with("fields", fields.trim_end())
    }
}

/// Placeholders for the `validator` template
#[derive(Debug, Clone)]
pub struct ValidatorContext {
    /// Entity name
    pub entity: String,
    /// Backing table
    pub table: String,
    /// Introspected columns
    pub columns: Vec<ColumnDescriptor>,
    /// Foreign key column to the table it references
    pub foreign_keys: BTreeMap<String, String>,
}

impl ValidatorContext {
    /// Validation rules, keyed by column
    #[must_use]
    pub fn rules(&self) -> TemplateValue {
        TemplateValue::Map(
            self.columns
                .iter()
                .map(|column| (column.name.clone(), TemplateValue::List(self.column_rules(column))))
                .collect(),
        )
    }

    fn column_rules(&self, column: &ColumnDescriptor) -> Vec<TemplateValue> {
        let mut rules = vec![TemplateValue::text(if column.nullable {
            "nullable"
        } else {
            "required"
        })];

        let kind = if column.translatable {
            Some("array")
        } else {
            match column.column_type {
                ColumnType::String | ColumnType::Text => Some("string"),
                ColumnType::Integer | ColumnType::BigInteger => Some("integer"),
                ColumnType::Boolean => Some("boolean"),
                ColumnType::Float | ColumnType::Decimal => Some("numeric"),
                ColumnType::Date | ColumnType::DateTime | ColumnType::Time => Some("date"),
                ColumnType::Json => Some("json"),
                ColumnType::Uuid => Some("uuid"),
                ColumnType::Binary | ColumnType::Enum | ColumnType::Other(_) => None,
            }
        };
        rules.extend(kind.map(TemplateValue::text));

        if let (Some(max), false) = (column.max_length, column.translatable) {
            rules.push(TemplateValue::text(format!("max:{max}")));
        }
        if column.unique {
            rules.push(TemplateValue::text(format!("unique:{},{}", self.table, column.name)));
        }
        if let Some(related_table) = self.foreign_keys.get(&column.name) {
            rules.push(TemplateValue::text(format!("exists:{related_table},id")));
        }
        if let Some(binding) = &column.enum_binding {
            rules.push(TemplateValue::map([(
                "in",
                TemplateValue::raw(format!("{}::values()", binding.path)),
            )]));
        } else if !column.allowed_values.is_empty() {
            rules.push(TemplateValue::map([(
                "in",
                TemplateValue::list(column.allowed_values.iter().map(String::as_str)),
            )]));
        }
        rules
    }

    fn checks(&self) -> String {
        let mut checks = String::new();
        for column in self.columns.iter().filter(|c| !c.translatable) {
            let ident = field_ident(&column.name);
            let name = quote(&column.name);
            let textual = column.column_type.is_textual() && column.enum_binding.is_none();

            let mut conditions: Vec<(String, String)> = Vec::new();
            if textual && !column.nullable {
                conditions.push(("value.trim().is_empty()".to_string(), "required".to_string()));
            }
            if let (true, Some(max)) = (textual, column.max_length) {
                conditions.push((format!("value.chars().count() > {max}"), format!("max:{max}")));
            }
            if column.enum_binding.is_none() && !column.allowed_values.is_empty() {
                let allowed = column
                    .allowed_values
                    .iter()
                    .map(|v| quote(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                conditions.push((format!("![{allowed}].contains(&value.as_str())"), "in".to_string()));
            }
            if conditions.is_empty() {
                continue;
            }

            let indent = "            ";
            if column.nullable {
                let _ = writeln!(checks, "        if let Some(value) = &self.{ident} {{");
            } else {
                let _ = writeln!(checks, "        {{\n{indent}let value = &self.{ident};");
            }
            for (condition, rule) in conditions {
                let _ = writeln!(
                    checks,
                    "{indent}if {condition} {{\n{indent}    errors.push(ValidationError::new({name}, {}));\n{indent}}}",
                    quote(&rule)
                );
            }
            checks.push_str("        }\n");
        }
        checks.trim_end().to_string()
    }
}

impl TemplateContext for ValidatorContext {
    fn template(&self) -> &'static str {
        "validator"
    }

    fn placeholders(&self) -> Placeholders {
        let mut fields = String::new();
        for column in &self.columns {
            let (ident, attributes) = field_for(&column.name);
            for attribute in attributes.iter().filter(|a| a.starts_with("#[serde")) {
                let _ = writeln!(fields, "    {attribute}");
            }
            if column.nullable {
                let _ = writeln!(fields, "    #[serde(default)]");
            }
            let _ = writeln!(fields, "    pub {ident}: {},", column.rust_type());
        }

        Placeholders::new()
            .with("name", format!("{}Request", self.entity))
            .with("entity", self.entity.as_str())
            .with("fields", fields.trim_end())
            .with("rules", self.rules())
            .with("checks", self.checks())
    }
}

/// Placeholders for the `serializer` template
#[derive(Debug, Clone)]
pub struct SerializerContext {
    /// Entity name
    pub entity: String,
    /// Transfer object identifier
    pub data: String,
}

impl TemplateContext for SerializerContext {
    fn template(&self) -> &'static str {
        "serializer"
    }

    fn placeholders(&self) -> Placeholders {
        Placeholders::new()
            .with("name", format!("{}Resource", self.entity))
            .with("entity", self.entity.as_str())
            .with("kind", Naming::to_snake_case(&self.entity))
            .with("data", self.data.as_str())
    }
}

/// SQL parameter marker style
fn marker(dialect: Option<Dialect>, index: usize) -> String {
    match dialect {
        Some(Dialect::Postgres) => format!("${index}"),
        Some(Dialect::SqlServer) => format!("@p{index}"),
        Some(Dialect::MySql | Dialect::Sqlite) | None => "?".to_string(),
    }
}

/// Pool type generated handlers extract from router state
fn pool_type(dialect: Option<Dialect>) -> &'static str {
    match dialect {
        Some(Dialect::Postgres) => "sqlx::PgPool",
        Some(Dialect::MySql) => "sqlx::MySqlPool",
        Some(Dialect::Sqlite) => "sqlx::SqlitePool",
        Some(Dialect::SqlServer) | None => "sqlx::AnyPool",
    }
}

/// Placeholders for the `controller` template
#[derive(Debug, Clone)]
pub struct ControllerContext {
    /// Entity name
    pub entity: String,
    /// Backing table
    pub table: String,
    /// Writable columns
    pub columns: Vec<ColumnDescriptor>,
    /// Transfer object identifier
    pub data: String,
    /// Validator identifier
    pub request: String,
    /// Serializer identifier
    pub resource: String,
    /// Dialect of the live schema, if known
    pub dialect: Option<Dialect>,
    /// Filter out soft-deleted rows and offer `restore`
    pub soft_delete: bool,
    /// Accept a `q` search parameter
    pub search: bool,
}

impl ControllerContext {
    fn live_filter(&self) -> &'static str {
        if self.soft_delete {
            " AND deleted_at IS NULL"
        } else {
            ""
        }
    }

    fn searchable(&self) -> Vec<&ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|column| column.column_type.is_textual() && !column.translatable)
            .collect()
    }

    fn search_sql(&self) -> (String, usize) {
        let columns = self.searchable();
        if columns.is_empty() {
            return (self.list_sql(), 0);
        }

        let shared = matches!(self.dialect, Some(Dialect::Postgres));
        let clauses: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let index = if shared { 1 } else { idx + 1 };
                format!("{} LIKE {}", column.name, marker(self.dialect, index))
            })
            .collect();
        let binds = if shared { 1 } else { clauses.len() };

        (
            format!(
                "SELECT * FROM {} WHERE ({}){}",
                self.table,
                clauses.join(" OR "),
                self.live_filter()
            ),
            binds,
        )
    }

    fn list_sql(&self) -> String {
        if self.soft_delete {
            format!("SELECT * FROM {} WHERE deleted_at IS NULL", self.table)
        } else {
            format!("SELECT * FROM {}", self.table)
        }
    }

    fn binds(&self) -> String {
        self.columns
            .iter()
            .map(|column| format!("            .bind(&request.{})", field_ident(&column.name)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TemplateContext for ControllerContext {
    fn template(&self) -> &'static str {
        "controller"
    }

    fn placeholders(&self) -> Placeholders {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        let count = names.len();

        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            (1..=count)
                .map(|index| marker(self.dialect, index))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let update_sql = format!(
            "UPDATE {} SET {} WHERE id = {}{}",
            self.table,
            names
                .iter()
                .enumerate()
                .map(|(idx, name)| format!("{name} = {}", marker(self.dialect, idx + 1)))
                .collect::<Vec<_>>()
                .join(", "),
            marker(self.dialect, count + 1),
            self.live_filter()
        );
        let id_marker = marker(self.dialect, 1);
        let destroy_sql = if self.soft_delete {
            format!(
                "UPDATE {} SET deleted_at = CURRENT_TIMESTAMP WHERE id = {id_marker} AND deleted_at IS NULL",
                self.table
            )
        } else {
            format!("DELETE FROM {} WHERE id = {id_marker}", self.table)
        };
        let (search_sql, search_binds) = self.search_sql();

        Placeholders::new()
            .with("name", format!("{}Controller", self.entity))
            .with("entity", self.entity.as_str())
            .with("title", Naming::to_title(&self.entity))
            .with("route_path", Naming::to_route_path(&self.entity))
            .with("data", self.data.as_str())
            .with("request", self.request.as_str())
            .with("resource", self.resource.as_str())
            .with("pool", pool_type(self.dialect))
            .with("has_soft_delete", self.soft_delete)
            .with("has_search", self.search && search_binds > 0)
            .with("list_sql", self.list_sql())
            .with("search_sql", search_sql)
            .with("search_binds", i64::try_from(search_binds).unwrap_or(i64::MAX))
            .with(
                "show_sql",
                format!("SELECT * FROM {} WHERE id = {id_marker}{}", self.table, self.live_filter()),
            )
            .with("insert_sql", insert_sql)
            .with("update_sql", update_sql)
            .with("destroy_sql", destroy_sql)
            .with(
                "restore_sql",
                format!("UPDATE {} SET deleted_at = NULL WHERE id = {id_marker}", self.table),
            )
            .with("binds", self.binds())
    }
}

/// Placeholders for the `route` entry and `route_registry` header
#[derive(Debug, Clone)]
pub struct RouteContext {
    /// Entity name
    pub entity: String,
    /// Controller identifier
    pub controller: String,
    /// Dialect of the live schema, if known
    pub dialect: Option<Dialect>,
}

impl RouteContext {
    /// Template for the registry header
    pub const REGISTRY_TEMPLATE: &'static str = "route_registry";
}

impl TemplateContext for RouteContext {
    fn template(&self) -> &'static str {
        "route"
    }

    fn placeholders(&self) -> Placeholders {
        Placeholders::new()
            .with("entity", self.entity.as_str())
            .with("route_path", Naming::to_route_path(&self.entity))
            .with("controller", self.controller.as_str())
            .with("pool", pool_type(self.dialect))
    }
}
