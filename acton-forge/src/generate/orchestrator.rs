//! Artifact orchestrator
//!
//! Coordinates one entity's generation:
//! 1. Analyse the entity source (capabilities, table name)
//! 2. Introspect the table with the analysis hint
//! 3. Complete enum bindings by migration and convention
//! 4. Synthesize enums for enumerated columns still unbound
//! 5. Render and write each requested artifact in dependency order
//!
//! Transfer objects recurse into related entities. The visited-entity set in
//! [`GenerationContext`] stops the recursion: an entity already in progress
//! (or done) contributes its deterministic identifier instead.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::path::Path;
use tracing::{debug, warn};

use super::context::{
    ControllerContext, EnumContext, NestedTransferObject, RouteContext, SerializerContext,
    TransferObjectContext, ValidatorContext,
};
use super::layout::{ArtifactLocation, ArtifactPlan};
use super::{
    ArtifactKind, EntityFailure, EntityRef, GeneratedArtifact, GenerationOutcome,
    GenerationRequest, ProgressSink, RunReport, TracingProgress,
};
use crate::config::ForgeConfig;
use crate::detect::{BindingSource, CapabilityDetector, CapabilityFlags, EnumBinding, RelationshipKind};
use crate::error::{ForgeError, ForgeResult};
use crate::materialize::{FileMaterializer, OverwritePrompt};
use crate::naming::Naming;
use crate::schema::{CatalogSource, ColumnDescriptor, ColumnQuery, SchemaIntrospector};
use crate::template::{TemplateContext, TemplateResolver};

/// Everything known about the entity being generated
#[derive(Debug, Clone)]
pub struct GenerationContext {
    /// Entity being generated
    pub entity: EntityRef,
    /// Backing table
    pub table: String,
    /// Introspected columns with their enum bindings
    pub columns: Vec<ColumnDescriptor>,
    /// Detected capabilities
    pub capabilities: CapabilityFlags,
    /// Entities already entered during this request
    pub visited: BTreeSet<String>,
}

/// Sequences artifact generation for entities
pub struct ArtifactOrchestrator<'a> {
    config: &'a ForgeConfig,
    catalog: &'a dyn CatalogSource,
    prompt: &'a mut dyn OverwritePrompt,
    progress: Box<dyn ProgressSink + 'a>,
    templates: TemplateResolver,
}

impl std::fmt::Debug for ArtifactOrchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactOrchestrator")
            .field("project_root", &self.config.project_root)
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

impl<'a> ArtifactOrchestrator<'a> {
    /// Create an orchestrator
    ///
    /// # Arguments
    ///
    /// * `config` - Project configuration
    /// * `catalog` - Schema metadata source
    /// * `prompt` - Consulted before replacing a file with different content
    pub fn new(
        config: &'a ForgeConfig,
        catalog: &'a dyn CatalogSource,
        prompt: &'a mut dyn OverwritePrompt,
    ) -> Self {
        Self {
            config,
            catalog,
            prompt,
            progress: Box::new(TracingProgress),
            templates: TemplateResolver::from_config(config),
        }
    }

    /// Send progress notices to `sink` instead of `tracing`
    #[must_use]
    pub fn with_progress(mut self, sink: impl ProgressSink + 'a) -> Self {
        self.progress = Box::new(sink);
        self
    }

    /// Use a different template resolver
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateResolver) -> Self {
        self.templates = templates;
        self
    }

    /// Generate every request in order
    ///
    /// A failing request skips its remaining artifacts and is reported; the
    /// next request still runs.
    pub fn run(&mut self, requests: &[GenerationRequest]) -> RunReport {
        let mut report = RunReport::default();
        for request in requests {
            match self.generate(request) {
                Ok(outcome) => report.succeeded.push((request.entity.clone(), outcome)),
                Err(error) => {
                    warn!(entity = %request.entity, error = %error, "Generation failed");
                    self.progress.notice(&format!("Failed {}: {error}", request.entity));
                    report.failed.push(EntityFailure {
                        entity: request.entity.clone(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Generate the requested artifacts for one entity
    ///
    /// # Errors
    ///
    /// [`ForgeError::InvalidEntity`] for an unusable entity name or an empty
    /// request; [`ForgeError::Artifact`] naming the kind that failed otherwise.
    pub fn generate(&mut self, request: &GenerationRequest) -> ForgeResult<GenerationOutcome> {
        let name = &request.entity.name;
        if !name.starts_with(|c: char| c.is_ascii_uppercase()) || !Naming::is_identifier(name) {
            return Err(ForgeError::InvalidEntity(format!(
                "Entity name must be PascalCase (start with uppercase): '{name}'"
            )));
        }
        if request.kinds.is_empty() {
            return Err(ForgeError::InvalidEntity(format!("No artifacts requested for '{name}'")));
        }

        let order = ArtifactKind::generation_order(
            &self.with_missing_dependencies(&request.entity, &request.kinds),
        );
        self.progress.notice(&format!(
            "Generating {} for {}",
            order.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            request.entity
        ));

        let mut context = self.prepare(&request.entity, BTreeSet::new());
        let mut outcome = GenerationOutcome::default();

        if order.iter().any(|kind| kind.needs_enums()) {
            self.synthesize_enums(&mut context, request.force, &mut outcome)
                .map_err(|err| err.for_artifact(name, ArtifactKind::Enum))?;
        }

        let mut identifiers: BTreeMap<ArtifactKind, String> = BTreeMap::new();
        for kind in order {
            let identifier = self
                .generate_kind(kind, &mut context, &identifiers, request.force, &mut outcome)
                .map_err(|err| err.for_artifact(name, kind))?;
            if let Some(identifier) = identifier {
                identifiers.insert(kind, identifier);
            }
        }

        outcome.primary = request
            .kinds
            .first()
            .and_then(|kind| identifiers.get(kind).cloned());
        Ok(outcome)
    }

    /// `kinds` plus every imported kind whose file is not on disk yet
    ///
    /// Enums are synthesized per column and never added here. An imported
    /// artifact that already exists contributes only its identifier.
    fn with_missing_dependencies(&self, entity: &EntityRef, kinds: &[ArtifactKind]) -> Vec<ArtifactKind> {
        let mut expanded = kinds.to_vec();
        let mut index = 0;
        while let Some(kind) = expanded.get(index).copied() {
            for &dependency in kind.dependencies() {
                if dependency == ArtifactKind::Enum || expanded.contains(&dependency) {
                    continue;
                }
                let location = ArtifactLocation::entity(self.config, dependency, entity);
                if !location.path.exists() {
                    debug!(entity = %entity, %kind, %dependency, "Adding missing dependency");
                    expanded.push(dependency);
                }
            }
            index += 1;
        }
        expanded
    }

    /// Analyse, introspect and bind one entity
    fn prepare(&mut self, entity: &EntityRef, mut visited: BTreeSet<String>) -> GenerationContext {
        let detector = CapabilityDetector::new(self.config);
        let mut analysis = detector.analyze(entity);

        let mut excluded = self.config.introspection.excluded_columns.clone();
        if analysis.flags.has_soft_delete {
            excluded.push("deleted_at".to_string());
        }
        let query = ColumnQuery::new(analysis.table.clone())
            .excluding(excluded)
            .with_hint(analysis.hint());
        let mut columns = SchemaIntrospector::new(self.catalog).columns(&query);
        if columns.is_empty() {
            self.progress.notice(&format!(
                "No columns found for table '{}', generating from capabilities only",
                analysis.table
            ));
        }

        detector.complete_enum_bindings(&mut analysis, &mut columns);
        visited.insert(entity.key());

        GenerationContext {
            entity: entity.clone(),
            table: analysis.table,
            columns,
            capabilities: analysis.flags,
            visited,
        }
    }

    /// Generate `{Entity}{Column}` enums for enumerated columns without a binding
    fn synthesize_enums(
        &mut self,
        context: &mut GenerationContext,
        force: bool,
        outcome: &mut GenerationOutcome,
    ) -> ForgeResult<()> {
        let folder = context.entity.folder_path();

        for column in context
            .columns
            .iter_mut()
            .filter(|column| column.enum_binding.is_none() && !column.allowed_values.is_empty())
        {
            let name = format!("{}{}", context.entity.name, Naming::to_pascal_case(&column.name));
            let location = ArtifactLocation::enumeration(self.config, &name, folder.as_deref());
            let enum_context = EnumContext {
                name,
                table: context.table.clone(),
                column: column.name.clone(),
                values: column.allowed_values.clone(),
            };

            let artifact = self.emit(
                ArtifactPlan::new(&context.entity.name, ArtifactKind::Enum, location, &enum_context),
                force,
            )?;
            let binding = EnumBinding::new(artifact.identifier.clone(), BindingSource::Generated);
            column.enum_binding = Some(binding.clone());
            context
                .capabilities
                .enum_bindings
                .entry(column.name.clone())
                .or_insert(binding);
            outcome.artifacts.push(artifact);
        }
        Ok(())
    }

    fn generate_kind(
        &mut self,
        kind: ArtifactKind,
        context: &mut GenerationContext,
        identifiers: &BTreeMap<ArtifactKind, String>,
        force: bool,
        outcome: &mut GenerationOutcome,
    ) -> ForgeResult<Option<String>> {
        let dependency = |dependency: ArtifactKind| {
            identifiers.get(&dependency).cloned().unwrap_or_else(|| {
                ArtifactLocation::entity(self.config, dependency, &context.entity).identifier
            })
        };

        let plan = match kind {
            ArtifactKind::Enum => {
                return Ok(context
                    .columns
                    .iter()
                    .filter(|column| column.is_enumerated())
                    .find_map(|column| column.enum_binding.as_ref().map(|binding| binding.path.clone())));
            }
            ArtifactKind::TransferObject => {
                return self.transfer_object(context, force, outcome).map(Some);
            }
            ArtifactKind::Route => {
                let route = RouteContext {
                    entity: context.entity.name.clone(),
                    controller: dependency(ArtifactKind::Controller),
                    dialect: self.catalog.dialect(),
                };
                let artifact = self.register_route(&context.entity, &route)?;
                let identifier = artifact.identifier.clone();
                outcome.artifacts.push(artifact);
                return Ok(Some(identifier));
            }
            ArtifactKind::Validator => {
                let detector = CapabilityDetector::new(self.config);
                let foreign_keys = context
                    .capabilities
                    .relationships
                    .iter()
                    .filter(|relationship| relationship.kind == RelationshipKind::BelongsTo)
                    .filter_map(|relationship| {
                        let related = EntityRef::new(relationship.related.as_deref()?)
                            .in_folder(relationship.related_folder.clone());
                        Some((relationship.foreign_key.clone(), detector.analyze(&related).table))
                    })
                    .collect();
                self.plan(
                    context,
                    kind,
                    &ValidatorContext {
                        entity: context.entity.name.clone(),
                        table: context.table.clone(),
                        columns: context.columns.clone(),
                        foreign_keys,
                    },
                )
            }
            ArtifactKind::Serializer => self.plan(
                context,
                kind,
                &SerializerContext {
                    entity: context.entity.name.clone(),
                    data: dependency(ArtifactKind::TransferObject),
                },
            ),
            ArtifactKind::Controller => self.plan(
                context,
                kind,
                &ControllerContext {
                    entity: context.entity.name.clone(),
                    table: context.table.clone(),
                    columns: context.columns.clone(),
                    data: dependency(ArtifactKind::TransferObject),
                    request: dependency(ArtifactKind::Validator),
                    resource: dependency(ArtifactKind::Serializer),
                    dialect: self.catalog.dialect(),
                    soft_delete: context.capabilities.has_soft_delete,
                    search: context.capabilities.has_search_index,
                },
            ),
        };

        let artifact = self.emit(plan, force)?;
        let identifier = artifact.identifier.clone();
        outcome.artifacts.push(artifact);
        Ok(Some(identifier))
    }

    fn plan<C: TemplateContext>(
        &self,
        context: &GenerationContext,
        kind: ArtifactKind,
        template: &C,
    ) -> ArtifactPlan {
        ArtifactPlan::new(
            &context.entity.name,
            kind,
            ArtifactLocation::entity(self.config, kind, &context.entity),
            template,
        )
    }

    /// Transfer object for `context`, generating related ones first
    fn transfer_object(
        &mut self,
        context: &mut GenerationContext,
        force: bool,
        outcome: &mut GenerationOutcome,
    ) -> ForgeResult<String> {
        let relationships = context.capabilities.relationships.clone();
        let mut nested = Vec::new();

        for relationship in relationships
            .iter()
            .filter(|relationship| relationship.kind.embeds_transfer_object())
        {
            let Some(related) = &relationship.related else {
                continue;
            };
            let related = EntityRef::new(related.as_str()).in_folder(relationship.related_folder.clone());

            let identifier = if context.visited.contains(&related.key()) {
                debug!(entity = %context.entity, related = %related, "Related entity already visited");
                ArtifactLocation::entity(self.config, ArtifactKind::TransferObject, &related).identifier
            } else {
                self.progress
                    .notice(&format!("Generating nested transfer object for {related}"));
                let mut related_context = self.prepare(&related, mem::take(&mut context.visited));
                let result = self
                    .synthesize_enums(&mut related_context, force, outcome)
                    .and_then(|()| self.transfer_object(&mut related_context, force, outcome));
                context.visited = mem::take(&mut related_context.visited);
                result.map_err(|err| err.for_artifact(&related.name, ArtifactKind::TransferObject))?
            };

            nested.push(NestedTransferObject {
                field: relationship.name.clone(),
                identifier,
                collection: relationship.kind.is_collection(),
            });
        }

        let plan = self.plan(
            context,
            ArtifactKind::TransferObject,
            &TransferObjectContext {
                entity: context.entity.name.clone(),
                table: context.table.clone(),
                columns: context.columns.clone(),
                nested,
                media: context.capabilities.media_fields.clone(),
            },
        );
        let artifact = self.emit(plan, force)?;
        let identifier = artifact.identifier.clone();
        outcome.artifacts.push(artifact);
        Ok(identifier)
    }

    /// Append the entity's entry to the shared route registry
    fn register_route(&mut self, entity: &EntityRef, route: &RouteContext) -> ForgeResult<GeneratedArtifact> {
        let location = ArtifactLocation::entity(self.config, ArtifactKind::Route, entity);
        let placeholders = route.placeholders();
        let header = self
            .templates
            .render(RouteContext::REGISTRY_TEMPLATE, &placeholders)?;
        let entry = self.templates.render(route.template(), &placeholders)?;

        let written = FileMaterializer::new(&mut *self.prompt).append_entry(
            &location.path,
            &header,
            entry.trim(),
            &location.identifier,
        )?;
        self.progress.notice(&format!(
            "{} route for {} in {}",
            written.status,
            entity.name,
            written.identifier
        ));

        Ok(GeneratedArtifact {
            entity: entity.name.clone(),
            kind: ArtifactKind::Route,
            identifier: written.identifier,
            path: written.path,
            status: written.status,
        })
    }

    /// Render, write and register one artifact
    fn emit(&mut self, plan: ArtifactPlan, force: bool) -> ForgeResult<GeneratedArtifact> {
        let content = self.templates.render(plan.template, &plan.placeholders)?;
        let written = FileMaterializer::new(&mut *self.prompt).write(
            &plan.location.path,
            &content,
            &plan.location.identifier,
            force,
        )?;
        self.declare_modules(&plan.location.path)?;

        self.progress.notice(&format!(
            "{} {} {}",
            written.status, plan.kind, written.identifier
        ));
        Ok(GeneratedArtifact {
            entity: plan.entity,
            kind: plan.kind,
            identifier: written.identifier,
            path: written.path,
            status: written.status,
        })
    }

    /// Declare the module chain of a generated file below the source root
    ///
    /// `src/dto/billing/invoice_data.rs` adds `pub mod invoice_data;` to
    /// `src/dto/billing/mod.rs` and `pub mod billing;` to `src/dto/mod.rs`
    /// (or `src/dto.rs` when the project uses that layout). The source root's
    /// own `lib.rs`/`main.rs` is left to the developer.
    fn declare_modules(&mut self, file: &Path) -> ForgeResult<()> {
        let root = self.config.resolve(&self.config.paths.source_root);
        let mut child = file.to_path_buf();

        while let Some(directory) = child.parent().map(Path::to_path_buf) {
            if directory == root || !directory.starts_with(&root) {
                break;
            }
            let Some(module) = child.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
                break;
            };

            let sibling = directory.with_extension("rs");
            let parent_file = if sibling.is_file() {
                sibling
            } else {
                directory.join("mod.rs")
            };
            FileMaterializer::new(&mut *self.prompt).append_entry(
                &parent_file,
                "",
                &format!("pub mod {module};"),
                &module,
            )?;
            child = directory;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::{DeclineOverwrite, WriteStatus};
    use crate::schema::{CatalogRow, Dialect, MemoryCatalog, QueryKind};
    use std::fs;
    use tempfile::tempdir;

    fn sqlite_row(name: &str, ty: &str, notnull: bool, pk: bool) -> CatalogRow {
        CatalogRow::from_pairs([
            ("name", Some(name.to_string())),
            ("type", Some(ty.to_string())),
            ("notnull", Some(if notnull { "1" } else { "0" }.to_string())),
            ("pk", Some(if pk { "1" } else { "0" }.to_string())),
        ])
    }

    fn tags_catalog() -> MemoryCatalog {
        MemoryCatalog::new(Dialect::Sqlite).with_rows(
            QueryKind::Columns,
            "tags",
            vec![sqlite_row("id", "INTEGER", true, true), sqlite_row("label", "TEXT", true, false)],
        )
    }

    struct Notices(Vec<String>);

    impl ProgressSink for Notices {
        fn notice(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    #[test]
    fn test_rejects_non_pascal_entity() {
        let dir = tempdir().unwrap();
        let config = ForgeConfig::for_project(dir.path());
        let catalog = tags_catalog();
        let mut prompt = DeclineOverwrite;
        let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);

        let err = orchestrator
            .generate(&GenerationRequest::new(EntityRef::new("tag"), vec![ArtifactKind::TransferObject]))
            .unwrap_err();
        assert!(matches!(err, ForgeError::InvalidEntity(_)));
    }

    #[test]
    fn test_existing_dependency_contributes_identifier_only() {
        let dir = tempdir().unwrap();
        let config = ForgeConfig::for_project(dir.path());
        let catalog = tags_catalog();
        let dto = dir.path().join("src/dto/tag_data.rs");
        fs::create_dir_all(dto.parent().unwrap()).unwrap();
        fs::write(&dto, "pub struct TagData;\n").unwrap();

        let mut prompt = DeclineOverwrite;
        let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);
        let outcome = orchestrator
            .generate(&GenerationRequest::new(EntityRef::new("Tag"), vec![ArtifactKind::Serializer]))
            .unwrap();

        assert_eq!(
            outcome.primary.as_deref(),
            Some("crate::serializers::tag_resource::TagResource")
        );
        assert_eq!(outcome.artifacts.len(), 1);
        let content = fs::read_to_string(dir.path().join("src/serializers/tag_resource.rs")).unwrap();
        assert!(content.contains("crate::dto::tag_data::TagData"));
        assert_eq!(fs::read_to_string(&dto).unwrap(), "pub struct TagData;\n");
    }

    #[test]
    fn test_missing_dependencies_are_generated_first() {
        let dir = tempdir().unwrap();
        let config = ForgeConfig::for_project(dir.path());
        let catalog = tags_catalog();
        let mut prompt = DeclineOverwrite;
        let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);

        let outcome = orchestrator
            .generate(&GenerationRequest::new(EntityRef::new("Tag"), vec![ArtifactKind::Route]))
            .unwrap();

        let kinds: Vec<ArtifactKind> = outcome.artifacts.iter().map(|artifact| artifact.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ArtifactKind::TransferObject,
                ArtifactKind::Validator,
                ArtifactKind::Serializer,
                ArtifactKind::Controller,
                ArtifactKind::Route,
            ]
        );
        assert_eq!(outcome.primary.as_deref(), Some("crate::routes"));
        for file in [
            "src/dto/tag_data.rs",
            "src/validators/tag_request.rs",
            "src/serializers/tag_resource.rs",
            "src/controllers/tag_controller.rs",
        ] {
            assert!(dir.path().join(file).is_file(), "{file} missing");
        }
    }

    #[test]
    fn test_validator_uses_related_table_override() {
        let dir = tempdir().unwrap();
        let models = dir.path().join("src/models");
        fs::create_dir_all(&models).unwrap();
        fs::write(
            models.join("tag.rs"),
            "use crate::models::author::Author;\n\npub struct Tag {\n    pub id: i64,\n    pub author_id: i64,\n}\n\nimpl Tag {\n    pub fn author(&self) -> BelongsTo<Author> {\n        self.belongs_to::<Author>(\"author_id\")\n    }\n}\n",
        )
        .unwrap();
        fs::write(
            models.join("author.rs"),
            "#[sea_orm(table_name = \"writers\")]\npub struct Author {\n    pub id: i64,\n}\n",
        )
        .unwrap();
        let config = ForgeConfig::for_project(dir.path());
        let catalog = MemoryCatalog::new(Dialect::Sqlite).with_rows(
            QueryKind::Columns,
            "tags",
            vec![sqlite_row("id", "INTEGER", true, true), sqlite_row("author_id", "INTEGER", true, false)],
        );

        let mut prompt = DeclineOverwrite;
        ArtifactOrchestrator::new(&config, &catalog, &mut prompt)
            .generate(&GenerationRequest::new(EntityRef::new("Tag"), vec![ArtifactKind::Validator]))
            .unwrap();

        let validator = fs::read_to_string(dir.path().join("src/validators/tag_request.rs")).unwrap();
        assert!(validator.contains("\"exists:writers,id\""));
        assert!(!validator.contains("exists:authors,id"));
    }

    #[test]
    fn test_modules_are_declared_once() {
        let dir = tempdir().unwrap();
        let config = ForgeConfig::for_project(dir.path());
        let catalog = tags_catalog();
        let mut prompt = DeclineOverwrite;
        let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);

        let request = GenerationRequest::new(
            EntityRef::new("Tag").in_folder(Some("Catalog")),
            vec![ArtifactKind::TransferObject],
        );
        orchestrator.generate(&request).unwrap();
        orchestrator.generate(&request).unwrap();

        let folder_mod = fs::read_to_string(dir.path().join("src/dto/catalog/mod.rs")).unwrap();
        assert_eq!(folder_mod, "pub mod tag_data;\n");
        let dto_mod = fs::read_to_string(dir.path().join("src/dto/mod.rs")).unwrap();
        assert_eq!(dto_mod, "pub mod catalog;\n");
        assert!(!dir.path().join("src/mod.rs").exists());
    }

    #[test]
    fn test_run_continues_after_failure() {
        let dir = tempdir().unwrap();
        let config = ForgeConfig::for_project(dir.path());
        let catalog = tags_catalog();
        let mut prompt = DeclineOverwrite;
        let mut notices = Notices(Vec::new());

        let report = {
            let mut orchestrator =
                ArtifactOrchestrator::new(&config, &catalog, &mut prompt).with_progress(&mut notices);
            orchestrator.run(&[
                GenerationRequest::new(EntityRef::new("tag"), vec![ArtifactKind::TransferObject]),
                GenerationRequest::new(EntityRef::new("Tag"), vec![ArtifactKind::TransferObject]),
            ])
        };

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.succeeded[0].1.artifacts[0].status, WriteStatus::Created);
        assert!(notices.0.iter().any(|notice| notice.starts_with("Failed tag")));
    }

    #[test]
    fn test_render_failure_names_entity_and_kind() {
        let dir = tempdir().unwrap();
        let config = ForgeConfig::for_project(dir.path());
        let catalog = tags_catalog();
        let mut prompt = DeclineOverwrite;

        let overrides = dir.path().join(".acton-forge/templates");
        fs::create_dir_all(&overrides).unwrap();
        fs::write(overrides.join("serializer.rs.hbs"), "{{undefined_placeholder}}").unwrap();

        let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);
        let err = orchestrator
            .generate(&GenerationRequest::new(EntityRef::new("Tag"), vec![ArtifactKind::Serializer]))
            .unwrap_err();

        match err {
            ForgeError::Artifact { entity, kind, .. } => {
                assert_eq!(entity, "Tag");
                assert_eq!(kind, ArtifactKind::Serializer);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
