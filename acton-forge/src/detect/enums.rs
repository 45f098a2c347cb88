//! Enum-binding discovery
//!
//! A column is bound to an enum type by the first of:
//!
//! 1. a cast: the entity struct field has a non-scalar type resolving to an
//!    enum declared in the project
//! 2. a migration: the newest migration whose column definition for the same
//!    table and column builds its values from an imported enum
//!    (`X::iter()`, `X::variants()`, `X::VARIANTS`)
//! 3. a convention: `{enums}/{snake(name)}.rs` declares `{Entity}{Column}`,
//!    `{Column}` or `{Column}Enum` with at least one variant, and its values
//!    match the column's allowed values when those are known

use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;
use walkdir::WalkDir;

use super::source::{last_ident, unwrap_option, variant_values, ImportMap, SourceFile};
use super::{BindingSource, EnumBinding};
use crate::config::ForgeConfig;
use crate::naming::Naming;
use crate::schema::ColumnDescriptor;

/// Field types that never bind to an enum
const SCALAR_TYPES: &[&str] = &[
    "String", "str", "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64", "Vec", "Decimal", "NaiveDate", "NaiveDateTime",
    "NaiveTime", "DateTime", "Uuid", "Value", "Json", "BTreeMap", "HashMap",
];

fn enum_construct_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b([A-Z][A-Za-z0-9_]*)\s*::\s*(?:iter\s*\(\s*\)|variants\s*\(\s*\)|VARIANTS\b)")
            .unwrap_or_else(|_| unreachable!())
    })
}

fn table_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"\.table\s*\(\s*(?:([A-Z][A-Za-z0-9_]*)\s*::\s*Table|Alias::new\s*\(\s*"([^"]+)"\s*\)|"([^"]+)")"#,
        )
        .unwrap_or_else(|_| unreachable!())
    })
}

/// Cast bindings of the entity struct: field name to enum path
#[must_use]
pub fn cast_bindings(
    source: &SourceFile,
    entity: &str,
    config: &ForgeConfig,
) -> Vec<(String, EnumBinding)> {
    source
        .fields(entity)
        .into_iter()
        .filter_map(|(field, ty)| {
            let ident = last_ident(unwrap_option(ty))?;
            if SCALAR_TYPES.contains(&ident.as_str()) {
                return None;
            }
            let path = source.resolve_type(&ident)?;
            let declared_here = source.enum_named(&ident).is_some()
                && source.imports.resolve(&ident).is_none();
            if !declared_here && !declares_enum(config, &path) {
                debug!(field = %field, path = %path, "Cast type is not a project enum");
                return None;
            }
            Some((field, EnumBinding::new(path, BindingSource::Cast)))
        })
        .collect()
}

fn declares_enum(config: &ForgeConfig, path: &str) -> bool {
    let Some(file) = config.module_file(path) else {
        return false;
    };
    let name = path.rsplit("::").next().unwrap_or_default();
    SourceFile::load(&file, None).is_some_and(|source| source.enum_named(name).is_some())
}

/// Migration files, newest first
///
/// Migration file names sort chronologically, so the newest file has the
/// greatest name.
#[must_use]
pub fn migration_files(directory: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(directory)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    files
}

/// Enum bound to `table.column` by the newest migration that defines it
#[must_use]
pub fn migration_binding(migrations: &[PathBuf], table: &str, column: &str) -> Option<EnumBinding> {
    migrations.iter().find_map(|path| {
        let content = fs::read_to_string(path).ok()?;
        let binding = binding_in_migration(&content, table, column)?;
        debug!(migration = %path.display(), table, column, binding = %binding.path, "Enum bound by migration");
        Some(binding)
    })
}

/// Enum bound to `table.column` inside one migration's source
#[must_use]
pub fn binding_in_migration(content: &str, table: &str, column: &str) -> Option<EnumBinding> {
    let syntax = syn::parse_file(content).ok()?;
    let imports = ImportMap::from_file(&syntax, None);

    let table_idens: BTreeSet<String> = table_reference_pattern()
        .captures_iter(content)
        .filter_map(|capture| {
            if let Some(iden) = capture.get(1) {
                (Naming::to_snake_case(iden.as_str()) == table).then(|| iden.as_str().to_string())
            } else {
                let literal = capture.get(2).or_else(|| capture.get(3))?;
                (literal.as_str() == table).then(String::new)
            }
        })
        .collect();
    if table_idens.is_empty() {
        return None;
    }

    let column_variant = Naming::to_pascal_case(column);
    column_segments(content).into_iter().find_map(|segment| {
        let references_column = table_idens.iter().any(|iden| {
            !iden.is_empty() && segment.contains(&format!("{iden}::{column_variant}"))
        }) || segment.contains(&format!("\"{column}\""));
        if !references_column {
            return None;
        }

        enum_construct_pattern()
            .captures_iter(&segment)
            .find_map(|capture| imports.resolve(&capture[1]).map(ToString::to_string))
            .map(|path| EnumBinding::new(path, BindingSource::Migration))
    })
}

/// Argument text of every `.col(...)` call, balanced over parentheses
fn column_segments(content: &str) -> Vec<String> {
    let bytes = content.as_bytes();
    let mut segments = Vec::new();
    let mut search_from = 0;

    while let Some(offset) = content[search_from..].find(".col(") {
        let open = search_from + offset + ".col".len();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut end = None;

        for (idx, &byte) in bytes.iter().enumerate().skip(open) {
            if in_string {
                match byte {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match byte {
                b'"' => in_string = true,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(idx);
                        break;
                    }
                }
                _ => {}
            }
        }

        let Some(end) = end else {
            break;
        };
        segments.push(content[open + 1..end].to_string());
        search_from = end;
    }

    segments
}

/// Candidate enum names for a column, in probing order
#[must_use]
pub fn convention_candidates(entity: &str, column: &str) -> Vec<String> {
    let column = Naming::to_pascal_case(column);
    vec![
        format!("{entity}{column}"),
        column.clone(),
        format!("{column}Enum"),
    ]
}

/// Enum bound to a column by naming convention
///
/// Probes the folder first, then the enums root.
#[must_use]
pub fn convention_binding(
    config: &ForgeConfig,
    entity: &str,
    folder: Option<&Path>,
    column: &ColumnDescriptor,
) -> Option<EnumBinding> {
    let root = config.resolve(&config.paths.enums);
    let directories: Vec<PathBuf> = folder
        .map(|folder| root.join(folder))
        .into_iter()
        .chain(std::iter::once(root.clone()))
        .collect();

    for name in convention_candidates(entity, &column.name) {
        for directory in &directories {
            let file = directory.join(format!("{}.rs", Naming::to_snake_case(&name)));
            if !file.is_file() {
                continue;
            }
            let module_path = config.module_path(&file);
            let Some(source) = SourceFile::load(&file, module_path.clone()) else {
                continue;
            };
            let Some(item) = source.enum_named(&name) else {
                continue;
            };
            if item.variants.is_empty() {
                continue;
            }
            if !column.allowed_values.is_empty() && !same_values(&variant_values(item), &column.allowed_values) {
                debug!(file = %file.display(), name = %name, column = %column.name, "Enum values differ from column, not bound");
                continue;
            }
            let Some(module_path) = module_path else {
                continue;
            };
            return Some(EnumBinding::new(
                format!("{module_path}::{name}"),
                BindingSource::Convention,
            ));
        }
    }
    None
}

fn same_values(left: &[String], right: &[String]) -> bool {
    left.iter().collect::<BTreeSet<_>>() == right.iter().collect::<BTreeSet<_>>()
}
