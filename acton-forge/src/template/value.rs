//! Placeholder values
//!
//! Top-level text is substituted verbatim. Every other value is substituted
//! as a literal that `serde_json::json!` accepts:
//!
//! ```text
//! {
//!     "status": [
//!         "required",
//!         InvoiceStatus::values()
//!     ],
//!     "number": "max:50"
//! }
//! ```
//!
//! One element per line, four spaces of indentation per nesting level, no
//! trailing commas. Nested text is quoted and escaped; a raw expression is
//! emitted as written.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

const INDENT: &str = "    ";

/// Scalar placeholder value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
}

/// Value substituted for a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    /// `null`
    Null,
    /// `true` or `false`
    Bool(bool),
    /// Text or number
    Scalar(Scalar),
    /// Ordered list
    List(Vec<TemplateValue>),
    /// Ordered map
    Map(Vec<(String, TemplateValue)>),
    /// Code emitted unquoted, e.g. `InvoiceStatus::values()`
    RawExpression(String),
}

impl TemplateValue {
    /// Text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(value.into()))
    }

    /// Unquoted code expression
    pub fn raw(expression: impl Into<String>) -> Self {
        Self::RawExpression(expression.into())
    }

    /// Map from ordered `(key, value)` pairs
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// List from values
    pub fn list<V: Into<Self>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Text substituted for a top-level placeholder
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::template::TemplateValue;
    /// assert_eq!(TemplateValue::text("InvoiceData").substitution(), "InvoiceData");
    /// assert_eq!(TemplateValue::list(["a"]).substitution(), "[\n    \"a\"\n]");
    /// ```
    #[must_use]
    pub fn substitution(&self) -> String {
        match self {
            Self::Scalar(Scalar::Text(text)) => text.clone(),
            other => other.literal(),
        }
    }

    /// Literal form, starting at nesting level zero
    #[must_use]
    pub fn literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out, 0);
        out
    }

    fn write_literal(&self, out: &mut String, level: usize) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
            Self::Scalar(Scalar::Text(text)) => out.push_str(&quote(text)),
            Self::Scalar(Scalar::Integer(number)) => {
                let _ = write!(out, "{number}");
            }
            Self::Scalar(Scalar::Float(number)) => out.push_str(
                &serde_json::Number::from_f64(*number)
                    .map_or_else(|| "null".to_string(), |n| n.to_string()),
            ),
            Self::RawExpression(expression) => out.push_str(expression),
            Self::List(items) => {
                write_block(out, level, '[', ']', items.iter().map(|item| (None, item)));
            }
            Self::Map(entries) => {
                write_block(
                    out,
                    level,
                    '{',
                    '}',
                    entries.iter().map(|(key, value)| (Some(key.as_str()), value)),
                );
            }
        }
    }

    /// JSON equivalent; `None` when a raw expression is present
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        Some(match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Scalar(Scalar::Text(text)) => Value::String(text.clone()),
            Self::Scalar(Scalar::Integer(number)) => Value::from(*number),
            Self::Scalar(Scalar::Float(number)) => {
                serde_json::Number::from_f64(*number).map_or(Value::Null, Value::Number)
            }
            Self::RawExpression(_) => return None,
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| value.to_json().map(|json| (key.clone(), json)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
        })
    }

    /// Data handed to the template engine
    ///
    /// Booleans stay booleans so `{{#if}}` blocks work; everything else is
    /// the substitution text.
    #[must_use]
    pub fn template_data(&self) -> Value {
        match self {
            Self::Bool(flag) => Value::Bool(*flag),
            other => Value::String(other.substitution()),
        }
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.escape_default()))
}

fn write_block<'a>(
    out: &mut String,
    level: usize,
    open: char,
    close: char,
    entries: impl ExactSizeIterator<Item = (Option<&'a str>, &'a TemplateValue)>,
) {
    if entries.len() == 0 {
        out.push(open);
        out.push(close);
        return;
    }

    out.push(open);
    let last = entries.len() - 1;
    for (idx, (key, value)) in entries.enumerate() {
        out.push('\n');
        out.push_str(&INDENT.repeat(level + 1));
        if let Some(key) = key {
            out.push_str(&quote(key));
            out.push_str(": ");
        }
        value.write_literal(out, level + 1);
        if idx != last {
            out.push(',');
        }
    }
    out.push('\n');
    out.push_str(&INDENT.repeat(level));
    out.push(close);
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(value))
    }
}

impl From<u32> for TemplateValue {
    fn from(value: u32) -> Self {
        Self::Scalar(Scalar::Integer(i64::from(value)))
    }
}

impl From<f64> for TemplateValue {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }
}

impl<T: Into<Self>> From<Option<T>> for TemplateValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for TemplateValue {
    fn from(value: Vec<T>) -> Self {
        Self::list(value)
    }
}

impl<V: Into<Self>> From<BTreeMap<String, V>> for TemplateValue {
    fn from(value: BTreeMap<String, V>) -> Self {
        Self::map(value)
    }
}
