//! `acton-forge inspect`

use std::path::Path;

use acton_forge::prelude::*;
use anyhow::{Context, Result};
use clap::Args;
use console::style;

use super::{entity_ref, load_config, open_catalog};

/// Show the columns and capabilities found for an entity
#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Entity name (`PascalCase`), optionally prefixed by a folder
    entity: String,

    /// Folder when the entity is given without one
    #[arg(long)]
    folder: Option<String>,

    /// Database to introspect
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,

    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl InspectCommand {
    /// Execute the inspect command
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the JSON
    /// output cannot be serialized.
    pub fn execute(&self, project: &Path) -> Result<()> {
        let config = load_config(project, self.database_url.clone())?;
        let catalog = open_catalog(&config);
        let entity = entity_ref(&self.entity, self.folder.as_deref());

        let detector = CapabilityDetector::new(&config);
        let mut analysis = detector.analyze(&entity);
        let mut excluded = config.introspection.excluded_columns.clone();
        if analysis.flags.has_soft_delete {
            excluded.push("deleted_at".to_string());
        }
        let query = ColumnQuery::new(analysis.table.clone())
            .excluding(excluded)
            .with_hint(analysis.hint());
        let mut columns = SchemaIntrospector::new(catalog.as_ref()).columns(&query);
        detector.complete_enum_bindings(&mut analysis, &mut columns);

        if self.json {
            let report = serde_json::json!({
                "entity": entity.key(),
                "table": analysis.table,
                "source": analysis.source_found.then(|| analysis.source_path.display().to_string()),
                "columns": columns,
                "capabilities": analysis.flags,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize inspection")?
            );
            return Ok(());
        }

        print_summary(&analysis, &columns);
        Ok(())
    }
}

fn print_summary(analysis: &EntityAnalysis, columns: &[ColumnDescriptor]) {
    println!(
        "{} {} (table {})",
        style("Entity").bold(),
        style(&analysis.entity).cyan().bold(),
        style(&analysis.table).cyan()
    );
    if analysis.source_found {
        println!("  source: {}", analysis.source_path.display());
    } else {
        println!(
            "  source: {}",
            style(format!("{} (not found)", analysis.source_path.display())).dim()
        );
    }

    println!();
    println!("{}", style("Columns").bold());
    if columns.is_empty() {
        println!("  {}", style("none found").dim());
    }
    for column in columns {
        let binding = column
            .enum_binding
            .as_ref()
            .map(|binding| format!(" -> {} ({})", binding.path, binding.source))
            .unwrap_or_default();
        let values = if column.allowed_values.is_empty() {
            String::new()
        } else {
            format!(" [{}]", column.allowed_values.join(", "))
        };
        println!("  {column}{values}{}", style(binding).green());
    }

    let flags = &analysis.flags;
    println!();
    println!("{}", style("Capabilities").bold());
    println!("  soft delete: {}", flags.has_soft_delete);
    println!("  search: {}", flags.has_search_index);
    for relationship in &flags.relationships {
        println!(
            "  {} {} -> {}",
            relationship.kind,
            relationship.name,
            relationship.related.as_deref().unwrap_or("(polymorphic)")
        );
    }
    for media in &flags.media_fields {
        println!("  media {} ({})", media.name, media.collection);
    }
    for column in &flags.translatable {
        println!("  translatable {column}");
    }
}
