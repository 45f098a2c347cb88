//! Where artifacts live and what they are called
//!
//! | Kind | Path | Type |
//! |------|------|------|
//! | Enum | `{enums}/{folder}/{snake(name)}.rs` | `{Name}` |
//! | TransferObject | `{dto}/{folder}/{snake}_data.rs` | `{Entity}Data` |
//! | Validator | `{validators}/{folder}/{snake}_request.rs` | `{Entity}Request` |
//! | Serializer | `{serializers}/{folder}/{snake}_resource.rs` | `{Entity}Resource` |
//! | Controller | `{controllers}/{folder}/{snake}_controller.rs` | `{Entity}Controller` |
//! | Route | `{route_registry}` | the registry module |
//!
//! Identifiers are the file's module path plus the type name, e.g.
//! `crate::dto::billing::invoice_data::InvoiceData`.

use std::path::{Path, PathBuf};

use super::{ArtifactKind, EntityRef};
use crate::config::ForgeConfig;
use crate::naming::Naming;
use crate::template::{Placeholders, TemplateContext};

/// Output file and identifier of one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    /// Absolute output path
    pub path: PathBuf,
    /// Module declared by the file, e.g. `crate::dto::invoice_data`
    pub module: String,
    /// Fully-qualified identifier
    pub identifier: String,
}

impl ArtifactLocation {
    /// Location of an entity-level artifact
    #[must_use]
    pub fn entity(config: &ForgeConfig, kind: ArtifactKind, entity: &EntityRef) -> Self {
        let snake = entity.snake_name();
        let (directory, file, type_name) = match kind {
            ArtifactKind::Enum => {
                return Self::enumeration(config, &entity.name, entity.folder_path().as_deref());
            }
            ArtifactKind::Route => {
                let path = config.resolve(&config.paths.route_registry);
                let module = module_of(config, &path);
                return Self {
                    path,
                    identifier: module.clone(),
                    module,
                };
            }
            ArtifactKind::TransferObject => (&config.paths.dto, format!("{snake}_data"), "Data"),
            ArtifactKind::Validator => (&config.paths.validators, format!("{snake}_request"), "Request"),
            ArtifactKind::Serializer => (&config.paths.serializers, format!("{snake}_resource"), "Resource"),
            ArtifactKind::Controller => (&config.paths.controllers, format!("{snake}_controller"), "Controller"),
        };

        Self::in_directory(
            config,
            directory,
            entity.folder_path().as_deref(),
            &file,
            &format!("{}{type_name}", entity.name),
        )
    }

    /// Location of an enum named `name`
    #[must_use]
    pub fn enumeration(config: &ForgeConfig, name: &str, folder: Option<&Path>) -> Self {
        Self::in_directory(
            config,
            &config.paths.enums,
            folder,
            &Naming::to_snake_case(name),
            name,
        )
    }

    fn in_directory(
        config: &ForgeConfig,
        directory: &Path,
        folder: Option<&Path>,
        file: &str,
        type_name: &str,
    ) -> Self {
        let mut path = config.resolve(directory);
        if let Some(folder) = folder {
            path.push(folder);
        }
        path.push(format!("{file}.rs"));

        let module = module_of(config, &path);
        Self {
            identifier: format!("{module}::{type_name}"),
            module,
            path,
        }
    }

    /// Type name, the identifier's last segment
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.identifier.rsplit("::").next().unwrap_or(&self.identifier)
    }
}

/// Module path of a generated file
///
/// Files outside the source root are addressed by their stem.
fn module_of(config: &ForgeConfig, path: &Path) -> String {
    config.module_path(path).unwrap_or_else(|| {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("crate::{stem}")
    })
}

/// Everything needed to render and write one artifact
#[derive(Debug, Clone)]
pub struct ArtifactPlan {
    /// Owning entity
    pub entity: String,
    /// Artifact kind
    pub kind: ArtifactKind,
    /// Template name
    pub template: &'static str,
    /// Output location
    pub location: ArtifactLocation,
    /// Rendered placeholders
    pub placeholders: Placeholders,
}

impl ArtifactPlan {
    /// Plan rendering `context` to `location`
    pub fn new<C: TemplateContext + ?Sized>(
        entity: &str,
        kind: ArtifactKind,
        location: ArtifactLocation,
        context: &C,
    ) -> Self {
        Self {
            entity: entity.to_string(),
            kind,
            template: context.template(),
            location,
            placeholders: context.placeholders(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ForgeConfig {
        ForgeConfig::for_project("/project")
    }

    #[test]
    fn test_entity_layout() {
        let config = config();
        let entity = EntityRef::new("Invoice");

        let dto = ArtifactLocation::entity(&config, ArtifactKind::TransferObject, &entity);
        assert_eq!(dto.path, PathBuf::from("/project/src/dto/invoice_data.rs"));
        assert_eq!(dto.identifier, "crate::dto::invoice_data::InvoiceData");
        assert_eq!(dto.type_name(), "InvoiceData");

        let controller = ArtifactLocation::entity(&config, ArtifactKind::Controller, &entity);
        assert_eq!(
            controller.identifier,
            "crate::controllers::invoice_controller::InvoiceController"
        );

        let route = ArtifactLocation::entity(&config, ArtifactKind::Route, &entity);
        assert_eq!(route.path, PathBuf::from("/project/src/routes.rs"));
        assert_eq!(route.identifier, "crate::routes");
    }

    #[test]
    fn test_folder_becomes_a_module_level() {
        let config = config();
        let entity = EntityRef::new("LineItem").in_folder(Some("Billing"));

        let request = ArtifactLocation::entity(&config, ArtifactKind::Validator, &entity);
        assert_eq!(
            request.path,
            PathBuf::from("/project/src/validators/billing/line_item_request.rs")
        );
        assert_eq!(
            request.identifier,
            "crate::validators::billing::line_item_request::LineItemRequest"
        );

        let status = ArtifactLocation::enumeration(&config, "LineItemStatus", entity.folder_path().as_deref());
        assert_eq!(
            status.identifier,
            "crate::enums::billing::line_item_status::LineItemStatus"
        );
        assert_eq!(status.module, "crate::enums::billing::line_item_status");
    }
}
