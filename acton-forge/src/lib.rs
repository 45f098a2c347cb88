//! acton-forge: schema-driven artifact generation
//!
//! Inspects a relational table and the source of an existing entity, then
//! synthesizes the derived artifacts an application needs around it:
//! enums, transfer objects, validators, serializers, controllers and route
//! registrations.
//!
//! # Pipeline
//!
//! 1. **Schema introspection** ([`schema`]): columns are read through a
//!    [`schema::CatalogSource`] and normalized across `PostgreSQL`, `MySQL`,
//!    `SQLite` and SQL Server.
//! 2. **Capability detection** ([`detect`]): a single static-analysis pass over
//!    the entity source and historical migrations yields relationships, enum
//!    bindings, media collections, soft-delete, search and translatable facts.
//! 3. **Template rendering** ([`template`]): typed placeholder maps are rendered
//!    into named templates, project overrides first.
//! 4. **Orchestration** ([`generate`]): artifacts are generated in dependency
//!    order, each identifier threaded into its dependents.
//! 5. **Materialization** ([`materialize`]): files are written under an
//!    overwrite policy; shared registries are appended idempotently.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acton_forge::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ForgeConfig::load(".")?;
//! let catalog = SqlxCatalog::connect(config.database.url.as_deref().unwrap_or("sqlite::memory:"));
//! let mut prompt = DeclineOverwrite;
//!
//! let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);
//! let request = GenerationRequest::new(
//!     EntityRef::new("Invoice"),
//!     vec![ArtifactKind::TransferObject, ArtifactKind::Controller],
//! );
//! let outcome = orchestrator.generate(&request)?;
//! if let Some(primary) = &outcome.primary {
//!     println!("generated {primary}");
//! }
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod detect;
pub mod error;
pub mod generate;
pub mod materialize;
pub mod naming;
pub mod observability;
pub mod schema;
pub mod template;

pub mod prelude {
    //! Convenience re-exports for common types
    //!
    //! ```rust
    //! use acton_forge::prelude::*;
    //! ```

    pub use crate::config::ForgeConfig;
    pub use crate::detect::{Capability, CapabilityDetector, CapabilityFlags, EntityAnalysis};
    pub use crate::error::{ForgeError, ForgeResult};
    pub use crate::generate::{
        ArtifactKind, ArtifactOrchestrator, EntityRef, GenerationOutcome, GenerationRequest,
        ProgressSink, RunReport,
    };
    pub use crate::materialize::{DeclineOverwrite, FileMaterializer, OverwritePrompt, WriteStatus};
    pub use crate::schema::{
        CatalogSource, ColumnDescriptor, ColumnQuery, ColumnType, Dialect, SchemaIntrospector,
        SqlxCatalog,
    };
    pub use crate::template::{Placeholders, TemplateResolver, TemplateValue};
}
