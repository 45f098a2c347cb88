//! Artifact template management commands
//!
//! - `list` - Show packaged templates and which ones the project overrides
//! - `diff` - Show how an override differs from the packaged template
//! - `eject` - Copy a packaged template into the override directory

use std::fs;
use std::path::Path;

use acton_forge::template::TemplateResolver;
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use console::{style, Emoji};

use super::load_config;
use crate::console_ui::{print_diff, unified_diff};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "");
static CUSTOM: Emoji<'_, '_> = Emoji("✨ ", "* ");
static DEFAULT: Emoji<'_, '_> = Emoji("  ", "  ");

/// Template management subcommands
#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    /// List templates and whether the project overrides them
    List {
        /// Show only overridden templates
        #[arg(long)]
        customized: bool,
    },
    /// Show the diff between an override and the packaged template
    Diff {
        /// Template name (e.g. controller)
        template: Option<String>,
        /// Show diffs for every overridden template
        #[arg(long)]
        all: bool,
    },
    /// Copy packaged templates into the override directory for editing
    Eject {
        /// Template name (e.g. controller)
        template: Option<String>,
        /// Eject every template
        #[arg(long)]
        all: bool,
        /// Replace existing overrides
        #[arg(short, long)]
        force: bool,
    },
}

impl TemplatesCommand {
    /// Execute the templates command
    ///
    /// # Errors
    ///
    /// Returns error if the configuration cannot be loaded, a template name is
    /// unknown, or an override cannot be read or written.
    pub fn execute(&self, project: &Path) -> Result<()> {
        let config = load_config(project, None)?;
        let resolver = TemplateResolver::from_config(&config);

        match self {
            Self::List { customized } => {
                list_templates(&resolver, *customized);
                Ok(())
            }
            Self::Diff { template, all } => diff_templates(&resolver, template.as_deref(), *all),
            Self::Eject {
                template,
                all,
                force,
            } => eject_templates(&resolver, template.as_deref(), *all, *force),
        }
    }
}

fn list_templates(resolver: &TemplateResolver, customized_only: bool) {
    println!("{}", style("Artifact Templates").bold());
    println!();
    println!("  Overrides: {}", style(resolver.override_dir().display()).cyan());
    println!();

    let mut overridden = 0;
    let mut packaged = 0;
    for entry in resolver.catalog() {
        if entry.override_path.is_some() {
            println!("    {CUSTOM}{}", style(entry.name).yellow());
            overridden += 1;
        } else if !customized_only {
            println!("    {DEFAULT}{}", style(entry.name).dim());
            packaged += 1;
        }
    }

    println!();
    if customized_only {
        println!("  {} overridden", style(overridden).yellow());
    } else {
        println!(
            "  {} overridden, {} packaged",
            style(overridden).yellow(),
            style(packaged).dim()
        );
    }
}

fn diff_templates(resolver: &TemplateResolver, template: Option<&str>, all: bool) -> Result<()> {
    if all {
        let overridden: Vec<_> = resolver
            .catalog()
            .into_iter()
            .filter(|entry| entry.override_path.is_some())
            .collect();
        if overridden.is_empty() {
            println!("No overridden templates found.");
        }
        for entry in overridden {
            show_single_diff(resolver, entry.name)?;
        }
        Ok(())
    } else if let Some(name) = template {
        show_single_diff(resolver, name)
    } else {
        bail!("Please specify a template name or use --all")
    }
}

fn show_single_diff(resolver: &TemplateResolver, name: &str) -> Result<()> {
    let Some(packaged) = TemplateResolver::packaged_source(name) else {
        bail!("Unknown template '{name}'");
    };
    let override_path = resolver.override_path(name);
    if !override_path.is_file() {
        println!("Template '{name}' is not overridden (using packaged)");
        return Ok(());
    }
    let custom = fs::read_to_string(&override_path)
        .with_context(|| format!("Failed to read {}", override_path.display()))?;

    println!("{}", style(name).bold());
    if custom == packaged {
        println!("  {}", style("identical to packaged").dim());
    } else {
        print_diff(&unified_diff(packaged, &custom, &override_path));
    }
    println!();
    Ok(())
}

fn eject_templates(
    resolver: &TemplateResolver,
    template: Option<&str>,
    all: bool,
    force: bool,
) -> Result<()> {
    let names: Vec<&str> = if all {
        resolver.catalog().iter().map(|entry| entry.name).collect()
    } else if let Some(name) = template {
        vec![name]
    } else {
        bail!("Please specify a template name or use --all");
    };

    for name in names {
        let written = eject(resolver, name, force)?;
        let path = resolver.override_path(name);
        if written {
            println!("  {CHECK}{}", style(path.display()).green());
        } else {
            println!(
                "  {DEFAULT}{} exists, skipped (use --force to replace)",
                style(path.display()).yellow()
            );
        }
    }
    Ok(())
}

/// Copy one packaged template to its override path
///
/// Returns whether the file was written.
fn eject(resolver: &TemplateResolver, name: &str, force: bool) -> Result<bool> {
    let Some(packaged) = TemplateResolver::packaged_source(name) else {
        bail!("Unknown template '{name}'");
    };
    let path = resolver.override_path(name);
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, packaged).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
