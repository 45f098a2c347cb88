//! Template resolution and rendering
//!
//! Templates are Handlebars files named `{name}.rs.hbs`. A project can shadow
//! any packaged template by placing a file with the same name in its override
//! directory (`.acton-forge/templates` by default).
//!
//! Rendering runs with HTML escaping disabled (the output is Rust source) and
//! strict mode on, so a placeholder missing from the map is an error rather
//! than an empty string.

mod value;

pub use value::{Scalar, TemplateValue};

use handlebars::Handlebars;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, ForgeResult};

/// Template file extension
pub const TEMPLATE_EXTENSION: &str = "rs.hbs";

/// Directory the packaged templates were built from
pub const PACKAGED_TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

/// Packaged templates, embedded at build time
const PACKAGED_TEMPLATES: &[(&str, &str)] = &[
    ("enum", include_str!("../../templates/enum.rs.hbs")),
    ("transfer_object", include_str!("../../templates/transfer_object.rs.hbs")),
    ("validator", include_str!("../../templates/validator.rs.hbs")),
    ("serializer", include_str!("../../templates/serializer.rs.hbs")),
    ("controller", include_str!("../../templates/controller.rs.hbs")),
    ("route", include_str!("../../templates/route.rs.hbs")),
    ("route_registry", include_str!("../../templates/route_registry.rs.hbs")),
];

/// Placeholder map for one render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders {
    values: BTreeMap<String, TemplateValue>,
}

impl Placeholders {
    /// Empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a placeholder, replacing any previous value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a placeholder, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TemplateValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Value of a placeholder
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.values.get(name)
    }

    /// Placeholders in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn to_data(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(name, value)| (name.clone(), value.template_data()))
                .collect::<Map<_, _>>(),
        )
    }
}

/// Typed placeholders for one template
pub trait TemplateContext {
    /// Template rendered with this context
    fn template(&self) -> &'static str;

    /// Placeholder map
    fn placeholders(&self) -> Placeholders;
}

/// One packaged template and its project override, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    /// Template name
    pub name: &'static str,
    /// Packaged default location
    pub packaged_path: PathBuf,
    /// Project override shadowing the default
    pub override_path: Option<PathBuf>,
}

/// Where a template's source came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOrigin {
    /// Project override directory
    Override,
    /// Packaged default
    Packaged,
}

/// Finds and renders named templates
pub struct TemplateResolver {
    override_dir: PathBuf,
    handlebars: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateResolver")
            .field("override_dir", &self.override_dir)
            .finish_non_exhaustive()
    }
}

impl TemplateResolver {
    /// Resolver checking `override_dir` before the packaged defaults
    #[must_use]
    pub fn new(override_dir: impl Into<PathBuf>) -> Self {
        let mut handlebars = Handlebars::new();
        // Generating code, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        Self {
            override_dir: override_dir.into(),
            handlebars,
        }
    }

    /// Resolver for a project's configured override directory
    #[must_use]
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self::new(config.resolve(&config.templates.override_dir))
    }

    /// Project override directory
    #[must_use]
    pub fn override_dir(&self) -> &Path {
        &self.override_dir
    }

    /// Override location of a template
    #[must_use]
    pub fn override_path(&self, name: &str) -> PathBuf {
        self.override_dir.join(format!("{name}.{TEMPLATE_EXTENSION}"))
    }

    /// Packaged location of a template
    #[must_use]
    pub fn packaged_path(name: &str) -> PathBuf {
        Path::new(PACKAGED_TEMPLATE_DIR).join(format!("{name}.{TEMPLATE_EXTENSION}"))
    }

    /// Packaged default source of a template
    #[must_use]
    pub fn packaged_source(name: &str) -> Option<&'static str> {
        PACKAGED_TEMPLATES
            .iter()
            .find(|(packaged, _)| *packaged == name)
            .map(|(_, source)| *source)
    }

    /// Template source, override first
    pub fn source(&self, name: &str) -> ForgeResult<(String, TemplateOrigin)> {
        let override_path = self.override_path(name);
        if override_path.is_file() {
            let source = fs::read_to_string(&override_path).map_err(|err| ForgeError::Render {
                name: name.to_string(),
                message: format!("cannot read {}: {err}", override_path.display()),
            })?;
            return Ok((source, TemplateOrigin::Override));
        }

        Self::packaged_source(name)
            .map(|source| (source.to_string(), TemplateOrigin::Packaged))
            .ok_or_else(|| ForgeError::TemplateNotFound {
                name: name.to_string(),
                override_path,
                packaged_path: Self::packaged_path(name),
            })
    }

    /// Render a named template
    pub fn render(&self, name: &str, placeholders: &Placeholders) -> ForgeResult<String> {
        let (source, origin) = self.source(name)?;
        debug!(template = name, origin = ?origin, "Rendering template");

        self.handlebars
            .render_template(&source, &placeholders.to_data())
            .map_err(|err| ForgeError::Render {
                name: name.to_string(),
                message: err.to_string(),
            })
    }

    /// Render a typed context with its template
    pub fn render_context<C: TemplateContext + ?Sized>(&self, context: &C) -> ForgeResult<String> {
        self.render(context.template(), &context.placeholders())
    }

    /// Every packaged template and whether the project overrides it
    #[must_use]
    pub fn catalog(&self) -> Vec<TemplateEntry> {
        PACKAGED_TEMPLATES
            .iter()
            .map(|(name, _)| {
                let override_path = self.override_path(name);
                TemplateEntry {
                    name,
                    packaged_path: Self::packaged_path(name),
                    override_path: override_path.is_file().then_some(override_path),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_every_occurrence_is_substituted() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("greeting.rs.hbs"),
            "// {{name}}\npub struct {{name}};\nconst RULES: &str = r#\"{{rules}}\"#;\n",
        )
        .unwrap();

        let resolver = TemplateResolver::new(dir.path());
        let placeholders = Placeholders::new()
            .with("name", "Invoice")
            .with("rules", TemplateValue::map([("a", "b")]));
        let rendered = resolver.render("greeting", &placeholders).unwrap();

        assert_eq!(
            rendered,
            "// Invoice\npub struct Invoice;\nconst RULES: &str = r#\"{\n    \"a\": \"b\"\n}\"#;\n"
        );
    }

    #[test]
    fn test_no_html_escaping() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("t.rs.hbs"), "{{ty}}").unwrap();

        let resolver = TemplateResolver::new(dir.path());
        let rendered = resolver
            .render("t", &Placeholders::new().with("ty", "Vec<Option<&'static str>>"))
            .unwrap();
        assert_eq!(rendered, "Vec<Option<&'static str>>");
    }

    #[test]
    fn test_boolean_blocks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("t.rs.hbs"), "a{{#if on}}b{{/if}}c").unwrap();

        let resolver = TemplateResolver::new(dir.path());
        assert_eq!(resolver.render("t", &Placeholders::new().with("on", true)).unwrap(), "abc");
        assert_eq!(resolver.render("t", &Placeholders::new().with("on", false)).unwrap(), "ac");
    }

    #[test]
    fn test_missing_placeholder_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("t.rs.hbs"), "{{missing}}").unwrap();

        let err = TemplateResolver::new(dir.path())
            .render("t", &Placeholders::new())
            .unwrap_err();
        assert!(matches!(err, ForgeError::Render { .. }));
    }

    #[test]
    fn test_override_shadows_packaged() {
        let dir = tempdir().unwrap();
        let resolver = TemplateResolver::new(dir.path());
        let (_, origin) = resolver.source("enum").unwrap();
        assert_eq!(origin, TemplateOrigin::Packaged);

        fs::write(dir.path().join("enum.rs.hbs"), "// custom {{name}}").unwrap();
        let (source, origin) = resolver.source("enum").unwrap();
        assert_eq!(origin, TemplateOrigin::Override);
        assert_eq!(source, "// custom {{name}}");

        let entry = resolver
            .catalog()
            .into_iter()
            .find(|entry| entry.name == "enum")
            .unwrap();
        assert_eq!(entry.override_path, Some(dir.path().join("enum.rs.hbs")));
    }

    #[test]
    fn test_not_found_lists_both_locations() {
        let dir = tempdir().unwrap();
        let err = TemplateResolver::new(dir.path())
            .render("nonexistent", &Placeholders::new())
            .unwrap_err();

        match err {
            ForgeError::TemplateNotFound {
                override_path,
                packaged_path,
                ..
            } => {
                assert_eq!(override_path, dir.path().join("nonexistent.rs.hbs"));
                assert!(packaged_path.ends_with("templates/nonexistent.rs.hbs"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_catalog_lists_packaged_templates() {
        let dir = tempdir().unwrap();
        let names: Vec<_> = TemplateResolver::new(dir.path())
            .catalog()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(
            names,
            vec!["enum", "transfer_object", "validator", "serializer", "controller", "route", "route_registry"]
        );
    }
}
