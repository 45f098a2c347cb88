//! Parsed entity and enum sources
//!
//! Wraps a `syn` syntax tree with the lookups the detectors need: the
//! file's imports, its inherent and trait impls for a type, and the enums it
//! declares.

use quote::ToTokens;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use syn::{Fields, File, ImplItem, ImplItemFn, Item, ItemEnum, ItemImpl, ItemStruct, Type, UseTree};
use tracing::debug;

use crate::naming::Naming;

fn string_literal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap_or_else(|_| unreachable!())
    })
}

fn variant_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:rename|string_value)\s*=\s*"([^"]*)""#).unwrap_or_else(|_| unreachable!())
    })
}

fn table_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"table_name\s*=\s*"([^"]+)""#).unwrap_or_else(|_| unreachable!())
    })
}

/// String literals appearing in a token rendering, in order
#[must_use]
pub fn string_literals(tokens: &str) -> Vec<String> {
    string_literal_pattern()
        .captures_iter(tokens)
        .map(|capture| capture[1].replace("\\\"", "\""))
        .collect()
}

/// Names brought into scope by a file's `use` declarations
///
/// Maps the local name (alias included) to the full path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    names: BTreeMap<String, String>,
}

impl ImportMap {
    /// Collect the imports of a parsed file
    ///
    /// `self::` and `super::` prefixes are resolved against `module_path`
    /// when it is known.
    #[must_use]
    pub fn from_file(file: &File, module_path: Option<&str>) -> Self {
        let mut map = Self::default();
        for item in &file.items {
            if let Item::Use(item_use) = item {
                map.collect(&item_use.tree, Vec::new(), module_path);
            }
        }
        map
    }

    fn collect(&mut self, tree: &UseTree, prefix: Vec<String>, module_path: Option<&str>) {
        match tree {
            UseTree::Path(path) => {
                let mut next = prefix;
                next.push(path.ident.to_string());
                self.collect(&path.tree, next, module_path);
            }
            UseTree::Name(name) => {
                let ident = name.ident.to_string();
                if ident == "self" {
                    if let Some(last) = prefix.last().cloned() {
                        self.insert(last, &prefix, module_path);
                    }
                } else {
                    let mut full = prefix;
                    full.push(ident.clone());
                    self.insert(ident, &full, module_path);
                }
            }
            UseTree::Rename(rename) => {
                let mut full = prefix;
                if rename.ident != "self" {
                    full.push(rename.ident.to_string());
                }
                self.insert(rename.rename.to_string(), &full, module_path);
            }
            UseTree::Group(group) => {
                for item in &group.items {
                    self.collect(item, prefix.clone(), module_path);
                }
            }
            UseTree::Glob(_) => {}
        }
    }

    fn insert(&mut self, local: String, segments: &[String], module_path: Option<&str>) {
        self.names.insert(local, absolutize(segments, module_path));
    }

    /// Full path a local name refers to
    #[must_use]
    pub fn resolve(&self, local: &str) -> Option<&str> {
        self.names.get(local).map(String::as_str)
    }

    /// Whether a local name is imported
    #[must_use]
    pub fn contains(&self, local: &str) -> bool {
        self.names.contains_key(local)
    }
}

fn absolutize(segments: &[String], module_path: Option<&str>) -> String {
    let Some(module_path) = module_path else {
        return segments.join("::");
    };

    let mut base: Vec<&str> = module_path.split("::").collect();
    let mut rest = segments;
    match rest.first().map(String::as_str) {
        Some("self") => rest = &rest[1..],
        Some("super") => {
            while rest.first().map(String::as_str) == Some("super") && base.len() > 1 {
                base.pop();
                rest = &rest[1..];
            }
        }
        _ => return segments.join("::"),
    }

    base.into_iter()
        .map(ToString::to_string)
        .chain(rest.iter().cloned())
        .collect::<Vec<_>>()
        .join("::")
}

/// A parsed Rust source file
pub struct SourceFile {
    /// Location on disk
    pub path: PathBuf,
    /// Rust module path, when the file sits under the source root
    pub module_path: Option<String>,
    /// Syntax tree
    pub syntax: File,
    /// Imports of the file
    pub imports: ImportMap,
}

impl SourceFile {
    /// Read and parse a file; `None` when it is missing or not valid Rust
    #[must_use]
    pub fn load(path: &Path, module_path: Option<String>) -> Option<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Source file unreadable");
                return None;
            }
        };
        Self::parse(path, &content, module_path)
    }

    /// Parse source text
    #[must_use]
    pub fn parse(path: &Path, content: &str, module_path: Option<String>) -> Option<Self> {
        let syntax = match syn::parse_file(content) {
            Ok(syntax) => syntax,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Source file does not parse");
                return None;
            }
        };
        let imports = ImportMap::from_file(&syntax, module_path.as_deref());
        Some(Self {
            path: path.to_path_buf(),
            module_path,
            syntax,
            imports,
        })
    }

    /// Struct declared with `name`
    #[must_use]
    pub fn struct_named(&self, name: &str) -> Option<&ItemStruct> {
        self.syntax.items.iter().find_map(|item| match item {
            Item::Struct(item) if item.ident == name => Some(item),
            _ => None,
        })
    }

    /// Enum declared with `name`
    #[must_use]
    pub fn enum_named(&self, name: &str) -> Option<&ItemEnum> {
        self.syntax.items.iter().find_map(|item| match item {
            Item::Enum(item) if item.ident == name => Some(item),
            _ => None,
        })
    }

    /// Every impl block whose self type is `name`
    pub fn impls_for<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a ItemImpl> + 'n
    where
        'a: 'n,
    {
        self.syntax.items.iter().filter_map(move |item| match item {
            Item::Impl(item) if last_ident(&item.self_ty).as_deref() == Some(name) => Some(item),
            _ => None,
        })
    }

    /// Inherent impl blocks of `name`
    pub fn inherent_impls<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a ItemImpl> + 'n
    where
        'a: 'n,
    {
        self.impls_for(name).filter(|item| item.trait_.is_none())
    }

    /// Trait impl of `name` whose trait's last segment is one of `traits`
    #[must_use]
    pub fn trait_impl<'a>(&'a self, name: &str, traits: &[&str]) -> Option<&'a ItemImpl> {
        self.impls_for(name).find(|item| {
            item.trait_
                .as_ref()
                .and_then(|(_, path, _)| path.segments.last())
                .is_some_and(|segment| traits.iter().any(|t| segment.ident == t))
        })
    }

    /// Method named `method` in any impl block of `name`
    #[must_use]
    pub fn method<'a>(&'a self, name: &str, method: &str) -> Option<&'a ImplItemFn> {
        self.impls_for(name)
            .flat_map(|item| item.items.iter())
            .find_map(|item| match item {
                ImplItem::Fn(function) if function.sig.ident == method => Some(function),
                _ => None,
            })
    }

    /// Table named by a `table_name = "..."` attribute on the entity struct
    #[must_use]
    pub fn table_name(&self, entity: &str) -> Option<String> {
        let item = self.struct_named(entity)?;
        item.attrs.iter().find_map(|attr| {
            let tokens = attr.to_token_stream().to_string();
            table_name_pattern()
                .captures(&tokens)
                .map(|capture| capture[1].to_string())
        })
    }

    /// Type of a named field of the entity struct, rendered as tokens
    #[must_use]
    pub fn field_type(&self, entity: &str, field: &str) -> Option<&Type> {
        let Fields::Named(fields) = &self.struct_named(entity)?.fields else {
            return None;
        };
        fields
            .named
            .iter()
            .find(|f| f.ident.as_ref().is_some_and(|ident| ident == field))
            .map(|f| &f.ty)
    }

    /// Named fields of the entity struct with their types
    #[must_use]
    pub fn fields(&self, entity: &str) -> Vec<(String, &Type)> {
        match self.struct_named(entity).map(|item| &item.fields) {
            Some(Fields::Named(fields)) => fields
                .named
                .iter()
                .filter_map(|f| f.ident.as_ref().map(|ident| (ident.to_string(), &f.ty)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Path an identifier used in this file refers to
    ///
    /// Imported names resolve through the imports; enums declared in the file
    /// resolve to the file's module.
    #[must_use]
    pub fn resolve_type(&self, ident: &str) -> Option<String> {
        if let Some(path) = self.imports.resolve(ident) {
            return Some(path.to_string());
        }
        self.enum_named(ident)?;
        self.module_path
            .as_ref()
            .map(|module| format!("{module}::{ident}"))
    }
}

/// Last path segment of a type, unwrapping references
#[must_use]
pub fn last_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(reference) => last_ident(&reference.elem),
        Type::Group(group) => last_ident(&group.elem),
        Type::Paren(paren) => last_ident(&paren.elem),
        _ => None,
    }
}

/// First generic type argument of the type's last segment
#[must_use]
pub fn first_type_argument(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let syn::PathArguments::AngleBracketed(args) = &path.path.segments.last()?.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// Strip `Option<...>` wrappers
#[must_use]
pub fn unwrap_option(ty: &Type) -> &Type {
    if last_ident(ty).as_deref() == Some("Option") {
        if let Some(inner) = first_type_argument(ty) {
            return unwrap_option(inner);
        }
    }
    ty
}

/// Values an enum's variants serialize to
///
/// Honors `#[serde(rename = "...")]` and `#[sea_orm(string_value = "...")]`;
/// otherwise the variant name in `snake_case`.
#[must_use]
pub fn variant_values(item: &ItemEnum) -> Vec<String> {
    item.variants
        .iter()
        .map(|variant| {
            variant
                .attrs
                .iter()
                .find_map(|attr| {
                    let tokens = attr.to_token_stream().to_string();
                    variant_value_pattern()
                        .captures(&tokens)
                        .map(|capture| capture[1].to_string())
                })
                .unwrap_or_else(|| Naming::to_snake_case(&variant.ident.to_string()))
        })
        .collect()
}
