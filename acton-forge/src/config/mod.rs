//! Configuration management for acton-forge
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `ACTON_FORGE_` prefix, `__` for nesting)
//! 2. `DATABASE_URL` (only for `database.url`)
//! 3. `./acton-forge.toml` in the project root
//! 4. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # acton-forge.toml
//! [database]
//! url = "sqlite://./dev.db"
//!
//! [paths]
//! models = "src/models"
//! enums = "src/enums"
//! migrations = "migration/src"
//! route_registry = "src/routes.rs"
//!
//! [templates]
//! override_dir = ".acton-forge/templates"
//!
//! [introspection]
//! excluded_columns = ["created_at", "updated_at"]
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use acton_forge::config::ForgeConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = ForgeConfig::load(".")?;
//! let models = config.resolve(&config.paths.models);
//! # Ok(())
//! # }
//! ```

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ForgeResult;

/// Name of the project-level configuration file
pub const CONFIG_FILE: &str = "acton-forge.toml";

/// Database connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection URL; the scheme selects the dialect
    pub url: Option<String>,
}

/// Project layout, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Root of the Rust module tree (`crate::`)
    pub source_root: PathBuf,
    /// Entity declarations
    pub models: PathBuf,
    /// Enumerated types
    pub enums: PathBuf,
    /// Historical schema migrations
    pub migrations: PathBuf,
    /// Generated transfer objects
    pub dto: PathBuf,
    /// Generated request validators
    pub validators: PathBuf,
    /// Generated serializers
    pub serializers: PathBuf,
    /// Generated controllers
    pub controllers: PathBuf,
    /// Shared append-only route registry
    pub route_registry: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("src"),
            models: PathBuf::from("src/models"),
            enums: PathBuf::from("src/enums"),
            migrations: PathBuf::from("migration/src"),
            dto: PathBuf::from("src/dto"),
            validators: PathBuf::from("src/validators"),
            serializers: PathBuf::from("src/serializers"),
            controllers: PathBuf::from("src/controllers"),
            route_registry: PathBuf::from("src/routes.rs"),
        }
    }
}

/// Template search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Project override directory, checked before the packaged defaults
    pub override_dir: PathBuf,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            override_dir: PathBuf::from(".acton-forge/templates"),
        }
    }
}

/// Schema introspection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrospectionSettings {
    /// Columns dropped from every descriptor list
    pub excluded_columns: Vec<String>,
}

impl Default for IntrospectionSettings {
    fn default() -> Self {
        Self {
            excluded_columns: vec!["created_at".to_string(), "updated_at".to_string()],
        }
    }
}

/// Complete acton-forge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Project root every relative path resolves against
    #[serde(skip)]
    pub project_root: PathBuf,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Project layout
    #[serde(default)]
    pub paths: PathSettings,

    /// Template search settings
    #[serde(default)]
    pub templates: TemplateSettings,

    /// Introspection settings
    #[serde(default)]
    pub introspection: IntrospectionSettings,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            database: DatabaseSettings::default(),
            paths: PathSettings::default(),
            templates: TemplateSettings::default(),
            introspection: IntrospectionSettings::default(),
        }
    }
}

impl ForgeConfig {
    /// Load configuration for a project
    ///
    /// Reads `acton-forge.toml` from `project_root` when present, then applies
    /// `DATABASE_URL` and `ACTON_FORGE_*` environment overrides.
    pub fn load(project_root: impl AsRef<Path>) -> ForgeResult<Self> {
        let root = project_root.as_ref();
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(root.join(CONFIG_FILE)))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::prefixed("ACTON_FORGE_").split("__"));

        let mut config: Self = figment.extract()?;
        config.project_root = root.to_path_buf();
        Ok(config)
    }

    /// Defaults rooted at `project_root`, without reading files or environment
    #[must_use]
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Resolve a configured relative path against the project root
    #[must_use]
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.project_root.join(relative)
        }
    }

    /// Rust module path of a source file under the source root
    ///
    /// `src/models/invoice.rs` maps to `crate::models::invoice`; `mod.rs`
    /// files name their directory.
    #[must_use]
    pub fn module_path(&self, file: &Path) -> Option<String> {
        let root = self.resolve(&self.paths.source_root);
        let relative = file.strip_prefix(&root).ok()?.with_extension("");

        let mut segments: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        if matches!(
            segments.last().map(String::as_str),
            Some("mod" | "lib" | "main")
        ) {
            segments.pop();
        }

        let mut path = String::from("crate");
        for segment in segments {
            path.push_str("::");
            path.push_str(&segment);
        }
        Some(path)
    }

    /// Source file declaring the item at a `crate::` path
    ///
    /// The last segment is the item; the rest name the module, found as
    /// `{source_root}/a/b.rs` or `{source_root}/a/b/mod.rs`.
    #[must_use]
    pub fn module_file(&self, item_path: &str) -> Option<PathBuf> {
        let mut segments: Vec<&str> = item_path.split("::").map(str::trim).collect();
        if segments.first() != Some(&"crate") || segments.len() < 3 {
            return None;
        }
        segments.pop();

        let mut module = self.resolve(&self.paths.source_root);
        for segment in &segments[1..] {
            module.push(segment);
        }
        [module.with_extension("rs"), module.join("mod.rs")]
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    /// Override the database URL (CLI flag precedence)
    #[must_use]
    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.database.url = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ForgeConfig::default();
        assert_eq!(config.paths.models, PathBuf::from("src/models"));
        assert_eq!(config.paths.route_registry, PathBuf::from("src/routes.rs"));
        assert_eq!(
            config.introspection.excluded_columns,
            vec!["created_at", "updated_at"]
        );
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_load_reads_project_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[paths]\nmodels = \"app/entities\"\n\n[introspection]\nexcluded_columns = [\"created_at\"]\n",
        )
        .unwrap();

        let config = ForgeConfig::load(dir.path()).unwrap();
        assert_eq!(config.paths.models, PathBuf::from("app/entities"));
        assert_eq!(config.paths.enums, PathBuf::from("src/enums"));
        assert_eq!(config.introspection.excluded_columns, vec!["created_at"]);
        assert_eq!(config.project_root, dir.path());
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let config = ForgeConfig::for_project("/project");
        assert_eq!(
            config.resolve(Path::new("src/dto")),
            PathBuf::from("/project/src/dto")
        );
        assert_eq!(config.resolve(Path::new("/abs")), PathBuf::from("/abs"));
    }

    #[test]
    fn test_module_path() {
        let config = ForgeConfig::for_project("/project");
        assert_eq!(
            config.module_path(Path::new("/project/src/models/invoice.rs")),
            Some("crate::models::invoice".to_string())
        );
        assert_eq!(
            config.module_path(Path::new("/project/src/enums/mod.rs")),
            Some("crate::enums".to_string())
        );
        assert_eq!(config.module_path(Path::new("/elsewhere/x.rs")), None);
    }

    #[test]
    fn test_module_file() {
        let dir = tempdir().unwrap();
        let enums = dir.path().join("src/enums");
        fs::create_dir_all(enums.join("billing")).unwrap();
        fs::write(enums.join("invoice_status.rs"), "").unwrap();
        fs::write(enums.join("billing/mod.rs"), "").unwrap();

        let config = ForgeConfig::for_project(dir.path());
        assert_eq!(
            config.module_file("crate::enums::invoice_status::InvoiceStatus"),
            Some(enums.join("invoice_status.rs"))
        );
        assert_eq!(
            config.module_file("crate::enums::billing::Currency"),
            Some(enums.join("billing/mod.rs"))
        );
        assert_eq!(config.module_file("strum::EnumIter"), None);
    }

    #[test]
    fn test_cli_url_overrides() {
        let config = ForgeConfig::default()
            .with_database_url(Some("sqlite::memory:".to_string()))
            .with_database_url(None);
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
    }
}
