//! `acton-forge generate`

use std::path::Path;

use acton_forge::prelude::*;
use anyhow::{bail, Result};
use clap::Args;
use console::{style, Emoji};

use super::{entity_ref, load_config, open_catalog};
use crate::console_ui::{ConfirmOverwrite, ConsoleProgress};

static SUCCESS: Emoji<'_, '_> = Emoji("✓ ", "");

/// Generate artifacts for one or more entities
///
/// Examples:
///   acton-forge generate Invoice
///   acton-forge generate Billing/Invoice Customer --artifacts dto,controller
///   acton-forge generate Invoice --artifacts enum --force
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Entity names (`PascalCase`), optionally prefixed by a folder (`Billing/Invoice`)
    #[arg(required = true, value_name = "ENTITY")]
    entities: Vec<String>,

    /// Artifacts to generate, comma separated; the first is the primary one
    /// (enum, dto, validator, serializer, controller, route)
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_value = "dto,validator,serializer,controller,route"
    )]
    artifacts: Vec<ArtifactKind>,

    /// Folder for entities given without one
    #[arg(long)]
    folder: Option<String>,

    /// Replace differing files without asking
    #[arg(short, long)]
    force: bool,

    /// Database to introspect (overrides `DATABASE_URL` and the config file)
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,
}

impl GenerateCommand {
    /// Execute the generate command
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or any entity
    /// fails to generate.
    pub fn execute(&self, project: &Path) -> Result<()> {
        let config = load_config(project, self.database_url.clone())?;
        let catalog = open_catalog(&config);

        let requests: Vec<GenerationRequest> = self
            .entities
            .iter()
            .map(|input| {
                GenerationRequest::new(entity_ref(input, self.folder.as_deref()), self.artifacts.clone())
                    .forced(self.force)
            })
            .collect();

        let mut prompt = ConfirmOverwrite::new();
        let report = ArtifactOrchestrator::new(&config, catalog.as_ref(), &mut prompt)
            .with_progress(ConsoleProgress)
            .run(&requests);

        print_report(&report);

        if report.is_success() {
            Ok(())
        } else {
            bail!(
                "{} of {} entities failed",
                report.failed.len(),
                requests.len()
            )
        }
    }
}

fn print_report(report: &RunReport) {
    println!();
    for (entity, outcome) in &report.succeeded {
        let changed = outcome
            .artifacts
            .iter()
            .filter(|artifact| artifact.status.changed())
            .count();
        println!(
            "{}{} ({} written, {} unchanged)",
            SUCCESS,
            style(entity).green().bold(),
            changed,
            outcome.artifacts.len() - changed
        );
        if let Some(primary) = &outcome.primary {
            println!("    {}", style(primary).cyan());
        }
    }

    for failure in &report.failed {
        let kind = failure
            .kind()
            .map(|kind| format!(" ({kind})"))
            .unwrap_or_default();
        println!(
            "{}{}: {}",
            style(format!("✗ {}", failure.entity)).red().bold(),
            kind,
            failure.error
        );
    }
}
