//! Allowed-value extraction from textual type and constraint encodings
//!
//! Dialects spell an enumerated column differently:
//!
//! ```text
//! MySQL        enum('draft','sent','paid')
//! SQLite       CHECK ("status" IN ('draft', 'sent', 'paid'))
//! PostgreSQL   CHECK (((status)::text = ANY ((ARRAY['draft'::character varying, ...])::text[])))
//! SQL Server   ([status]=N'draft' OR [status]=N'sent' OR [status]=N'paid')
//! ```
//!
//! All of them reduce to the same ordered value list.

use regex::Regex;
use std::sync::OnceLock;

fn literal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[^A-Za-z0-9_])N?'((?:[^']|'')*)'").unwrap_or_else(|_| unreachable!())
    })
}

fn conjunction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\s+and\s+").unwrap_or_else(|_| unreachable!()))
}

/// Quoted literals of a SQL fragment, in order, without duplicates
///
/// Doubled quotes are unescaped and an `N` national-character prefix is
/// accepted.
#[must_use]
pub fn quoted_literals(fragment: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for capture in literal_pattern().captures_iter(fragment) {
        let value = capture[1].replace("''", "'");
        if !values.contains(&value) {
            values.push(value);
        }
    }
    values
}

/// Allowed values of an inline enumerated type such as `enum('a','b')`
///
/// # Examples
///
/// ```
/// # use acton_forge::schema::constraint::parse_enum_type;
/// assert_eq!(
///     parse_enum_type("enum('draft','sent','paid')"),
///     Some(vec!["draft".to_string(), "sent".to_string(), "paid".to_string()])
/// );
/// assert_eq!(parse_enum_type("varchar(50)"), None);
/// ```
#[must_use]
pub fn parse_enum_type(type_name: &str) -> Option<Vec<String>> {
    let trimmed = type_name.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let body = if lowered.starts_with("enum(") || lowered.starts_with("set(") {
        &trimmed[trimmed.find('(')? + 1..]
    } else {
        return None;
    };

    let values = quoted_literals(body);
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Bodies of every `CHECK (...)` clause in a table definition
///
/// Parentheses inside quoted literals do not affect nesting.
#[must_use]
pub fn check_clauses(ddl: &str) -> Vec<String> {
    let lowered = ddl.to_ascii_lowercase();
    let bytes = ddl.as_bytes();
    let mut clauses = Vec::new();
    let mut search_from = 0;

    while let Some(offset) = lowered[search_from..].find("check") {
        let keyword_end = search_from + offset + "check".len();
        search_from = keyword_end;

        let Some(open) = ddl[keyword_end..]
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .filter(|(_, c)| *c == '(')
            .map(|(idx, _)| keyword_end + idx)
        else {
            continue;
        };

        let mut depth = 0usize;
        let mut in_quote = false;
        for (idx, &byte) in bytes.iter().enumerate().skip(open) {
            match byte {
                b'\'' => in_quote = !in_quote,
                b'(' if !in_quote => depth += 1,
                b')' if !in_quote => {
                    depth -= 1;
                    if depth == 0 {
                        clauses.push(ddl[open + 1..idx].to_string());
                        search_from = idx;
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    clauses
}

/// Allowed values a check constraint imposes on `column`
///
/// The definition is split into conjuncts; the first conjunct that references
/// the column and compares it against literals (`IN (...)`, `= ANY (...)`,
/// `=` chains joined by `OR`) yields the value list.
///
/// # Examples
///
/// ```
/// # use acton_forge::schema::constraint::check_allowed_values;
/// let pg = "CHECK (((status)::text = ANY ((ARRAY['draft'::character varying, 'paid'::character varying])::text[])))";
/// assert_eq!(
///     check_allowed_values(pg, "status"),
///     Some(vec!["draft".to_string(), "paid".to_string()])
/// );
/// assert_eq!(check_allowed_values("(amount > 0)", "status"), None);
/// ```
#[must_use]
pub fn check_allowed_values(definition: &str, column: &str) -> Option<Vec<String>> {
    let reference = Regex::new(&format!(
        r#"(?i)(?:^|[^A-Za-z0-9_'])[\["`(]?{}[\]"`)]?(?:::[a-z ]+)?\s*(?:in\s*\(|=\s*any\s*\(|=\s*N?')"#,
        regex::escape(column)
    ))
    .ok()?;

    conjunction_pattern()
        .split(definition)
        .filter(|conjunct| reference.is_match(conjunct))
        .map(quoted_literals)
        .find(|values| !values.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_quoted_literals_unescape() {
        assert_eq!(
            quoted_literals("IN ('it''s', N'x', 'x')"),
            strings(&["it's", "x"])
        );
    }

    #[test]
    fn test_mysql_enum_type() {
        assert_eq!(
            parse_enum_type("ENUM('a','b','c')"),
            Some(strings(&["a", "b", "c"]))
        );
        assert_eq!(parse_enum_type("set('x')"), Some(strings(&["x"])));
        assert_eq!(parse_enum_type("enum()"), None);
    }

    #[test]
    fn test_check_clauses_from_sqlite_ddl() {
        let ddl = r#"CREATE TABLE "invoices" ("id" integer primary key autoincrement not null, "status" varchar check ("status" in ('draft', 'sent', 'pa(id)')) not null, "total" numeric CHECK(total >= 0))"#;
        let clauses = check_clauses(ddl);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0], r#""status" in ('draft', 'sent', 'pa(id)')"#);
        assert_eq!(clauses[1], "total >= 0");
    }

    #[test]
    fn test_sqlite_check_values() {
        let clause = r#""status" in ('draft', 'sent', 'paid')"#;
        assert_eq!(
            check_allowed_values(clause, "status"),
            Some(strings(&["draft", "sent", "paid"]))
        );
        assert_eq!(check_allowed_values(clause, "state"), None);
    }

    #[test]
    fn test_sql_server_or_chain() {
        let definition = "([status]=N'draft' OR [status]=N'sent' OR [status]=N'paid')";
        assert_eq!(
            check_allowed_values(definition, "status"),
            Some(strings(&["draft", "sent", "paid"]))
        );
    }

    #[test]
    fn test_conjuncts_are_separated() {
        let definition = "kind IN ('a', 'b') AND status IN ('draft', 'paid')";
        assert_eq!(
            check_allowed_values(definition, "status"),
            Some(strings(&["draft", "paid"]))
        );
        assert_eq!(
            check_allowed_values(definition, "kind"),
            Some(strings(&["a", "b"]))
        );
    }

    #[test]
    fn test_column_name_must_match_whole_word() {
        let definition = "sub_status IN ('a', 'b')";
        assert_eq!(check_allowed_values(definition, "status"), None);
    }
}
