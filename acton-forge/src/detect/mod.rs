//! Capability detection
//!
//! One static-analysis pass over an entity's source file (parsed with `syn`)
//! and the project's migrations yields a list of [`Capability`] values:
//! relationships, enum bindings, media fields, soft-delete and search support,
//! and translatable columns. The list folds into [`CapabilityFlags`].
//!
//! Detection never fails. A missing or unparseable file, an unresolvable
//! related entity or an unrecognized accessor body simply contributes nothing.

pub mod enums;
pub mod media;
pub mod relationships;
pub mod source;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use crate::config::ForgeConfig;
use crate::generate::EntityRef;
use crate::naming::Naming;
use crate::schema::{ColumnDescriptor, EntityHint};
use source::{string_literals, SourceFile};

/// How an enum binding was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingSource {
    /// Entity struct field type
    Cast,
    /// Column definition in a migration
    Migration,
    /// Naming convention in the enums directory
    Convention,
    /// Enum synthesized during this run
    Generated,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cast => "cast",
            Self::Migration => "migration",
            Self::Convention => "convention",
            Self::Generated => "generated",
        };
        f.write_str(name)
    }
}

/// Enum type bound to a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumBinding {
    /// Fully-qualified Rust path of the enum
    pub path: String,
    /// How the binding was found
    pub source: BindingSource,
}

impl EnumBinding {
    /// Create a binding
    pub fn new(path: impl Into<String>, source: BindingSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// Enum type name, the last path segment
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }
}

/// Relationship taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// Inverse one-to-one or one-to-many
    BelongsTo,
    /// One-to-one
    HasOne,
    /// One-to-many
    HasMany,
    /// Many-to-many through a pivot table
    BelongsToMany,
    /// Inverse polymorphic
    MorphTo,
    /// Polymorphic one-to-one
    MorphOne,
    /// Polymorphic one-to-many
    MorphMany,
    /// Polymorphic many-to-many
    MorphToMany,
}

impl RelationshipKind {
    /// Kind named by an accessor's return type
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "BelongsTo" => Self::BelongsTo,
            "HasOne" => Self::HasOne,
            "HasMany" => Self::HasMany,
            "BelongsToMany" => Self::BelongsToMany,
            "MorphTo" => Self::MorphTo,
            "MorphOne" => Self::MorphOne,
            "MorphMany" => Self::MorphMany,
            "MorphToMany" => Self::MorphToMany,
            _ => return None,
        })
    }

    /// Method an accessor body calls on `self` for this kind
    #[must_use]
    pub const fn call_name(self) -> &'static str {
        match self {
            Self::BelongsTo => "belongs_to",
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
            Self::BelongsToMany => "belongs_to_many",
            Self::MorphTo => "morph_to",
            Self::MorphOne => "morph_one",
            Self::MorphMany => "morph_many",
            Self::MorphToMany => "morph_to_many",
        }
    }

    /// Whether transfer objects embed the related entity's transfer object
    #[must_use]
    pub const fn embeds_transfer_object(self) -> bool {
        matches!(
            self,
            Self::BelongsTo | Self::HasOne | Self::HasMany | Self::MorphOne | Self::MorphMany
        )
    }

    /// Whether the relationship yields many related rows
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(
            self,
            Self::HasMany | Self::BelongsToMany | Self::MorphMany | Self::MorphToMany
        )
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.call_name())
    }
}

/// Pivot table keys of a many-to-many relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotKeys {
    /// Pivot table
    pub table: String,
    /// Pivot column pointing at this entity
    pub foreign_pivot_key: String,
    /// Pivot column pointing at the related entity
    pub related_pivot_key: String,
}

/// Columns of a polymorphic relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphKeys {
    /// Polymorphic name, e.g. `commentable`
    pub name: String,
    /// Column holding the owner type
    pub type_column: String,
    /// Column holding the owner id
    pub id_column: String,
}

impl MorphKeys {
    /// Conventional `{name}_type` / `{name}_id` columns
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_column: format!("{name}_type"),
            id_column: format!("{name}_id"),
        }
    }
}

/// One detected relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    /// Accessor name
    pub name: String,
    /// Relationship kind
    pub kind: RelationshipKind,
    /// Foreign key column
    pub foreign_key: String,
    /// Related entity; `None` only for `MorphTo`
    pub related: Option<String>,
    /// Model folder of the related entity
    pub related_folder: Option<String>,
    /// Pivot keys of many-to-many relationships
    pub pivot: Option<PivotKeys>,
    /// Polymorphic columns
    pub morph: Option<MorphKeys>,
}

/// Whether a media collection holds one file or many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaCardinality {
    /// `single_file()` collections
    Single,
    /// Everything else
    Multiple,
}

/// Broad media type of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MimeCategory {
    /// `image/*`
    Image,
    /// `video/*`
    Video,
    /// `audio/*`
    Audio,
}

impl MimeCategory {
    /// Category of a MIME type such as `image/png`
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let prefix = mime.split('/').next()?.trim().to_ascii_lowercase();
        match prefix.as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Category guessed from a collection name
    #[must_use]
    pub fn from_collection_name(collection: &str) -> Option<Self> {
        const IMAGE: &[&str] = &[
            "avatar", "photo", "image", "picture", "logo", "thumbnail", "cover", "banner",
            "gallery", "icon",
        ];
        const VIDEO: &[&str] = &["video", "clip", "movie", "film"];
        const AUDIO: &[&str] = &["audio", "podcast", "sound", "music", "voice", "track"];

        let name = collection.to_ascii_lowercase();
        if IMAGE.iter().any(|word| name.contains(word)) {
            Some(Self::Image)
        } else if VIDEO.iter().any(|word| name.contains(word)) {
            Some(Self::Video)
        } else if AUDIO.iter().any(|word| name.contains(word)) {
            Some(Self::Audio)
        } else {
            None
        }
    }

    /// Lowercase name used in templates
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// One attached-media collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaField {
    /// Field name in generated code
    pub name: String,
    /// Collection name as registered
    pub collection: String,
    /// Single or multiple files
    pub cardinality: MediaCardinality,
    /// Broad media type, when known
    pub mime: Option<MimeCategory>,
}

/// One detected capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// Relationship accessor
    Relationship(RelationshipDescriptor),
    /// Enum type bound to a column
    EnumBinding(String, EnumBinding),
    /// Entity implements a media trait
    Media,
    /// Attached-media collection
    MediaField(MediaField),
    /// Rows are soft-deleted
    SoftDelete,
    /// Entity is indexed for search
    Search,
    /// Column holds translations
    Translatable(String),
}

/// Capabilities folded into a lookup record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    /// Soft-delete support
    pub has_soft_delete: bool,
    /// Implements a media trait
    pub has_media: bool,
    /// Media collections in registration order
    pub media_fields: Vec<MediaField>,
    /// Search index support
    pub has_search_index: bool,
    /// Relationships in declaration order
    pub relationships: Vec<RelationshipDescriptor>,
    /// Enum bindings by column; the first binding per column wins
    pub enum_bindings: BTreeMap<String, EnumBinding>,
    /// Translatable columns
    pub translatable: BTreeSet<String>,
}

impl CapabilityFlags {
    /// Fold a capability list
    pub fn from_capabilities<'a>(capabilities: impl IntoIterator<Item = &'a Capability>) -> Self {
        let mut flags = Self::default();
        for capability in capabilities {
            flags.apply(capability);
        }
        flags
    }

    fn apply(&mut self, capability: &Capability) {
        match capability {
            Capability::Relationship(relationship) => self.relationships.push(relationship.clone()),
            Capability::EnumBinding(column, binding) => {
                self.enum_bindings
                    .entry(column.clone())
                    .or_insert_with(|| binding.clone());
            }
            Capability::Media => self.has_media = true,
            Capability::MediaField(field) => self.media_fields.push(field.clone()),
            Capability::SoftDelete => self.has_soft_delete = true,
            Capability::Search => self.has_search_index = true,
            Capability::Translatable(column) => {
                self.translatable.insert(column.clone());
            }
        }
    }
}

/// Everything learned about one entity from its sources
#[derive(Debug, Clone)]
pub struct EntityAnalysis {
    /// Entity analysed
    pub entity: EntityRef,
    /// Entity source file
    pub source_path: PathBuf,
    /// Whether the source file was found and parsed
    pub source_found: bool,
    /// Table backing the entity
    pub table: String,
    /// Capabilities in detection order
    pub capabilities: Vec<Capability>,
    /// Folded capabilities
    pub flags: CapabilityFlags,
}

impl EntityAnalysis {
    fn empty(entity: &EntityRef, source_path: PathBuf) -> Self {
        Self {
            entity: entity.clone(),
            source_path,
            source_found: false,
            table: Naming::to_table_name(&entity.name),
            capabilities: Vec::new(),
            flags: CapabilityFlags::default(),
        }
    }

    /// Add a capability found after the source pass
    pub fn record(&mut self, capability: Capability) {
        self.flags.apply(&capability);
        self.capabilities.push(capability);
    }

    /// Findings the schema introspector applies to columns
    #[must_use]
    pub fn hint(&self) -> EntityHint {
        EntityHint {
            translatable: self.flags.translatable.clone(),
            enum_bindings: self.flags.enum_bindings.clone(),
        }
    }
}

/// Static analysis of entity sources
pub struct CapabilityDetector<'a> {
    config: &'a ForgeConfig,
}

impl<'a> CapabilityDetector<'a> {
    /// Create a detector for a project
    #[must_use]
    pub const fn new(config: &'a ForgeConfig) -> Self {
        Self { config }
    }

    /// Source file of an entity: `{models}/{folder}/{snake(name)}.rs`
    #[must_use]
    pub fn entity_path(&self, entity: &EntityRef) -> PathBuf {
        let mut path = self.config.resolve(&self.config.paths.models);
        if let Some(folder) = entity.folder_path() {
            path.push(folder);
        }
        path.join(format!("{}.rs", entity.snake_name()))
    }

    /// Analyse an entity's source file
    #[must_use]
    pub fn analyze(&self, entity: &EntityRef) -> EntityAnalysis {
        let path = self.entity_path(entity);
        let Some(source) = SourceFile::load(&path, self.config.module_path(&path)) else {
            debug!(entity = %entity.name, path = %path.display(), "Entity source unavailable, no capabilities detected");
            return EntityAnalysis::empty(entity, path);
        };

        let name = entity.name.as_str();
        let mut capabilities: Vec<Capability> = self
            .relationships(&source, entity)
            .into_iter()
            .map(Capability::Relationship)
            .collect();

        capabilities.extend(
            enums::cast_bindings(&source, name, self.config)
                .into_iter()
                .map(|(column, binding)| Capability::EnumBinding(column, binding)),
        );
        if media::has_media(&source, name) {
            capabilities.push(Capability::Media);
        }
        capabilities.extend(
            media::media_fields(&source, name)
                .into_iter()
                .map(Capability::MediaField),
        );
        if source.trait_impl(name, &["SoftDeletes"]).is_some() {
            capabilities.push(Capability::SoftDelete);
        }
        if source.trait_impl(name, &["Searchable"]).is_some()
            || source.method(name, "to_searchable_array").is_some()
        {
            capabilities.push(Capability::Search);
        }
        capabilities.extend(
            translatable_columns(&source, name)
                .into_iter()
                .map(Capability::Translatable),
        );

        let flags = CapabilityFlags::from_capabilities(&capabilities);
        debug!(
            entity = %entity.name,
            relationships = flags.relationships.len(),
            media = flags.media_fields.len(),
            soft_delete = flags.has_soft_delete,
            search = flags.has_search_index,
            "Analysed entity source"
        );

        EntityAnalysis {
            entity: entity.clone(),
            table: source
                .table_name(name)
                .unwrap_or_else(|| Naming::to_table_name(name)),
            source_path: path,
            source_found: true,
            capabilities,
            flags,
        }
    }

    /// Relationship accessors whose related entity resolves to a model file
    #[must_use]
    pub fn relationships(&self, source: &SourceFile, entity: &EntityRef) -> Vec<RelationshipDescriptor> {
        relationships::accessors(source, &entity.name)
            .iter()
            .filter_map(|accessor| {
                let Some(related) = &accessor.related else {
                    return Some(relationships::describe_accessor(&entity.name, accessor, None, None));
                };
                let Some(folder) = self.locate_model(source, entity, related) else {
                    debug!(entity = %entity.name, accessor = %accessor.method, related = %related, "Related entity not found, relationship dropped");
                    return None;
                };
                Some(relationships::describe_accessor(
                    &entity.name,
                    accessor,
                    Some(related.clone()),
                    folder,
                ))
            })
            .collect()
    }

    /// Folder of the model file declaring `related`, if any
    ///
    /// The outer `Option` is whether the model exists; the inner one its
    /// folder below the models directory.
    fn locate_model(
        &self,
        source: &SourceFile,
        entity: &EntityRef,
        related: &str,
    ) -> Option<Option<String>> {
        let models = self.config.resolve(&self.config.paths.models);

        let imported = source
            .imports
            .resolve(related)
            .and_then(|path| self.config.module_file(path));
        let conventional = || {
            let file = format!("{}.rs", Naming::to_snake_case(related));
            entity
                .folder_path()
                .map(|folder| models.join(folder).join(&file))
                .into_iter()
                .chain(std::iter::once(models.join(&file)))
                .find(|candidate| candidate.is_file())
        };
        let file = imported.or_else(conventional)?;

        let folder = file
            .parent()
            .and_then(|parent| parent.strip_prefix(&models).ok())
            .map(|relative| {
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .filter(|folder| !folder.is_empty());
        Some(folder)
    }

    /// Bind remaining columns by migration, then by convention
    ///
    /// Columns already bound (by cast) keep their binding. Convention probing
    /// only applies to enumerated columns.
    pub fn complete_enum_bindings(
        &self,
        analysis: &mut EntityAnalysis,
        columns: &mut [ColumnDescriptor],
    ) {
        let migrations = enums::migration_files(&self.config.resolve(&self.config.paths.migrations));
        let folder = analysis.entity.folder_path();

        for column in columns.iter_mut().filter(|column| column.enum_binding.is_none()) {
            let binding = enums::migration_binding(&migrations, &analysis.table, &column.name)
                .or_else(|| {
                    column.is_enumerated().then(|| {
                        enums::convention_binding(
                            self.config,
                            &analysis.entity.name,
                            folder.as_deref(),
                            &*column,
                        )
                    })?
                });

            if let Some(binding) = binding {
                column.enum_binding = Some(binding.clone());
                analysis.record(Capability::EnumBinding(column.name.clone(), binding));
            }
        }
    }
}

/// Columns listed in `impl HasTranslations { const TRANSLATABLE: &[&str] = ... }`
fn translatable_columns(source: &SourceFile, entity: &str) -> Vec<String> {
    use quote::ToTokens;

    source
        .trait_impl(entity, &["HasTranslations"])
        .into_iter()
        .flat_map(|item| item.items.iter())
        .find_map(|item| match item {
            syn::ImplItem::Const(constant) if constant.ident == "TRANSLATABLE" => {
                Some(string_literals(&constant.expr.to_token_stream().to_string()))
            }
            _ => None,
        })
        .unwrap_or_default()
}
