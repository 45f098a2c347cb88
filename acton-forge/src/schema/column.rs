//! Normalized column metadata
//!
//! Every dialect's metadata is reduced to [`ColumnDescriptor`], with the raw
//! SQL type mapped onto [`ColumnType`].
//!
//! # Type normalization
//!
//! | SQL spelling | `ColumnType` | Rust type |
//! |--------------|--------------|-----------|
//! | `varchar`, `character varying`, `nvarchar`, `char` | `String` | `String` |
//! | `text`, `longtext`, `ntext`, `clob` | `Text` | `String` |
//! | `int`, `integer`, `smallint`, `int4` | `Integer` | `i32` |
//! | `bigint`, `int8`, `bigserial` | `BigInteger` | `i64` |
//! | `bool`, `boolean`, `bit`, `tinyint(1)` | `Boolean` | `bool` |
//! | `real`, `float`, `double precision` | `Float` | `f64` |
//! | `decimal`, `numeric`, `money` | `Decimal` | `rust_decimal::Decimal` |
//! | `date` | `Date` | `chrono::NaiveDate` |
//! | `timestamp`, `datetime`, `datetime2`, `timestamptz` | `DateTime` | `chrono::NaiveDateTime` |
//! | `time` | `Time` | `chrono::NaiveTime` |
//! | `json`, `jsonb` | `Json` | `serde_json::Value` |
//! | `uuid`, `uniqueidentifier` | `Uuid` | `uuid::Uuid` |
//! | `blob`, `bytea`, `varbinary` | `Binary` | `Vec<u8>` |
//! | `enum(...)` or a CHECK value list | `Enum` | bound enum |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detect::EnumBinding;

/// Normalized column type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Bounded string (VARCHAR)
    String,
    /// Unbounded text
    Text,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInteger,
    /// Boolean
    Boolean,
    /// Floating point
    Float,
    /// Fixed precision decimal
    Decimal,
    /// Date without time
    Date,
    /// Date and time
    DateTime,
    /// Time of day
    Time,
    /// JSON document
    Json,
    /// UUID
    Uuid,
    /// Raw bytes
    Binary,
    /// Enumerated values
    Enum,
    /// Anything the normalizer does not recognize, lowercased
    Other(String),
}

impl ColumnType {
    /// Map a dialect's SQL type spelling onto the normalized type
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::schema::ColumnType;
    /// assert_eq!(ColumnType::from_sql("character varying"), ColumnType::String);
    /// assert_eq!(ColumnType::from_sql("VARCHAR(50)"), ColumnType::String);
    /// assert_eq!(ColumnType::from_sql("bigint unsigned"), ColumnType::BigInteger);
    /// assert_eq!(ColumnType::from_sql("tinyint(1)"), ColumnType::Boolean);
    /// assert_eq!(ColumnType::from_sql("enum('a','b')"), ColumnType::Enum);
    /// ```
    #[must_use]
    pub fn from_sql(spelling: &str) -> Self {
        let lowered = spelling.trim().to_ascii_lowercase();
        if lowered.starts_with("tinyint(1)") {
            return Self::Boolean;
        }

        let base = lowered
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_end_matches(" unsigned")
            .trim();

        match base {
            "varchar" | "character varying" | "nvarchar" | "char" | "nchar" | "character"
            | "bpchar" | "string" | "citext" => Self::String,
            "text" | "tinytext" | "mediumtext" | "longtext" | "ntext" | "clob" => Self::Text,
            "int" | "integer" | "int2" | "int4" | "smallint" | "mediumint" | "tinyint"
            | "serial" | "smallserial" => Self::Integer,
            "bigint" | "int8" | "bigserial" => Self::BigInteger,
            "bool" | "boolean" | "bit" => Self::Boolean,
            "real" | "float" | "float4" | "float8" | "double" | "double precision" => Self::Float,
            "decimal" | "numeric" | "money" | "smallmoney" => Self::Decimal,
            "date" => Self::Date,
            "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" | "timestamp"
            | "timestamptz" | "timestamp without time zone" | "timestamp with time zone" => {
                Self::DateTime
            }
            "time" | "timetz" | "time without time zone" | "time with time zone" => Self::Time,
            "json" | "jsonb" => Self::Json,
            "uuid" | "uniqueidentifier" => Self::Uuid,
            "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea" | "binary" | "varbinary"
            | "image" => Self::Binary,
            "enum" | "set" => Self::Enum,
            other => Self::Other(other.to_string()),
        }
    }

    /// Rust type used for this column in generated code
    #[must_use]
    pub fn rust_type(&self) -> String {
        match self {
            Self::String | Self::Text | Self::Enum | Self::Other(_) => "String".to_string(),
            Self::Integer => "i32".to_string(),
            Self::BigInteger => "i64".to_string(),
            Self::Boolean => "bool".to_string(),
            Self::Float => "f64".to_string(),
            Self::Decimal => "rust_decimal::Decimal".to_string(),
            Self::Date => "chrono::NaiveDate".to_string(),
            Self::DateTime => "chrono::NaiveDateTime".to_string(),
            Self::Time => "chrono::NaiveTime".to_string(),
            Self::Json => "serde_json::Value".to_string(),
            Self::Uuid => "uuid::Uuid".to_string(),
            Self::Binary => "Vec<u8>".to_string(),
        }
    }

    /// Whether values carry a length limit worth validating
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Text)
    }

    /// Whether values are whole numbers
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(self, Self::Integer | Self::BigInteger)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::BigInteger => write!(f, "bigint"),
            Self::Boolean => write!(f, "boolean"),
            Self::Float => write!(f, "float"),
            Self::Decimal => write!(f, "decimal"),
            Self::Date => write!(f, "date"),
            Self::DateTime => write!(f, "datetime"),
            Self::Time => write!(f, "time"),
            Self::Json => write!(f, "json"),
            Self::Uuid => write!(f, "uuid"),
            Self::Binary => write!(f, "binary"),
            Self::Enum => write!(f, "enum"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Normalized description of one table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Owning table
    pub table: String,
    /// Column name
    pub name: String,
    /// Normalized type
    pub column_type: ColumnType,
    /// Column accepts NULL
    pub nullable: bool,
    /// Column alone forms a unique constraint or unique index
    pub unique: bool,
    /// Declared maximum length for string columns
    pub max_length: Option<u32>,
    /// Allowed values of an enumerated column, in declaration order
    pub allowed_values: Vec<String>,
    /// Resolved enum type, when one is bound
    pub enum_binding: Option<EnumBinding>,
    /// Column holds per-locale translations
    pub translatable: bool,
}

impl ColumnDescriptor {
    /// Create a descriptor with no constraints
    pub fn new(table: impl Into<String>, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            column_type,
            nullable: false,
            unique: false,
            max_length: None,
            allowed_values: Vec::new(),
            enum_binding: None,
            translatable: false,
        }
    }

    /// Whether the column holds one of a fixed set of values
    #[must_use]
    pub fn is_enumerated(&self) -> bool {
        self.column_type == ColumnType::Enum || !self.allowed_values.is_empty()
    }

    /// Rust type of the column's value, before nullability is applied
    #[must_use]
    pub fn base_rust_type(&self) -> String {
        if self.translatable {
            return "sqlx::types::Json<std::collections::BTreeMap<String, String>>".to_string();
        }
        match &self.enum_binding {
            Some(binding) => binding.path.clone(),
            None => self.column_type.rust_type(),
        }
    }

    /// Rust type of the column, wrapped in `Option` when nullable
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::schema::{ColumnDescriptor, ColumnType};
    /// let mut column = ColumnDescriptor::new("invoices", "customer_id", ColumnType::BigInteger);
    /// column.nullable = true;
    /// assert_eq!(column.rust_type(), "Option<i64>");
    /// ```
    #[must_use]
    pub fn rust_type(&self) -> String {
        let base = self.base_rust_type();
        if self.nullable {
            format!("Option<{base}>")
        } else {
            base
        }
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.table, self.name, self.column_type)?;
        if let Some(length) = self.max_length {
            write!(f, "({length})")?;
        }
        if !self.allowed_values.is_empty() {
            write!(f, "[{}]", self.allowed_values.join(","))?;
        }
        if self.nullable {
            write!(f, ":nullable")?;
        }
        if self.unique {
            write!(f, ":unique")?;
        }
        Ok(())
    }
}
