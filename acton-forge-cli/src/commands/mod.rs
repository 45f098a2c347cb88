//! CLI command implementations

pub mod generate;
pub mod inspect;
pub mod templates;

pub use generate::GenerateCommand;
pub use inspect::InspectCommand;
pub use templates::TemplatesCommand;

use std::path::Path;

use acton_forge::prelude::*;
use acton_forge::schema::MemoryCatalog;
use anyhow::{Context, Result};
use console::style;
use tracing::{debug, warn};

/// Load the project configuration, applying a `--database-url` override
pub fn load_config(project: &Path, database_url: Option<String>) -> Result<ForgeConfig> {
    let config = ForgeConfig::load(project)
        .with_context(|| format!("Failed to load configuration from {}", project.display()))?;
    let config = config.with_database_url(database_url);
    debug!(
        project = %config.project_root.display(),
        database = config.database.url.is_some(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Schema catalog for the configured database
///
/// Without a database URL the catalog is empty and artifacts are generated
/// from the entity source alone.
pub fn open_catalog(config: &ForgeConfig) -> Box<dyn CatalogSource> {
    if let Some(url) = config.database.url.as_deref() {
        debug!(dialect = ?Dialect::from_url(url), "Opening schema catalog");
        Box::new(SqlxCatalog::connect(url))
    } else {
        warn!("No database URL configured, using an empty schema catalog");
        println!(
            "{} No database URL configured; set DATABASE_URL or pass --database-url",
            style("!").yellow().bold()
        );
        Box::new(MemoryCatalog::default())
    }
}

/// Entity from `Folder/Name`, falling back to `--folder` when none is given
pub fn entity_ref(input: &str, folder: Option<&str>) -> EntityRef {
    let entity = EntityRef::parse(input);
    if entity.folder.is_some() {
        entity
    } else {
        entity.in_folder(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ref_prefers_inline_folder() {
        let entity = entity_ref("Billing/Invoice", Some("Sales"));
        assert_eq!(entity.folder.as_deref(), Some("Billing"));

        let entity = entity_ref("Invoice", Some("Sales"));
        assert_eq!(entity.folder.as_deref(), Some("Sales"));

        let entity = entity_ref("Invoice", None);
        assert_eq!(entity.folder, None);
    }

    #[test]
    fn test_catalog_without_database_url_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = ForgeConfig::for_project(dir.path());
        let catalog = open_catalog(&config);
        assert_eq!(catalog.dialect(), None);
    }

    #[test]
    fn test_database_url_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("acton-forge.toml"),
            "[database]\nurl = \"sqlite://from-file.db\"\n",
        )
        .unwrap();

        let config = load_config(dir.path(), Some("sqlite::memory:".to_string())).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
    }
}
