//! Artifact generation
//!
//! An [`ArtifactOrchestrator`] takes a [`GenerationRequest`] (one entity plus
//! the artifact kinds wanted) and produces the artifacts in dependency order:
//!
//! ```text
//! Enum ──> TransferObject ──> Serializer ──> Controller ──> Route
//!    └───> Validator ─────────────────────────┘
//! ```
//!
//! Each artifact's identifier is threaded into the artifacts that import it.
//! A dependency that was not requested contributes its deterministic
//! identifier without being regenerated.

mod context;
mod layout;
mod orchestrator;

pub use context::{
    ControllerContext, EnumContext, RouteContext, SerializerContext, TransferObjectContext,
    ValidatorContext,
};
pub use layout::{ArtifactLocation, ArtifactPlan};
pub use orchestrator::{ArtifactOrchestrator, GenerationContext};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::error::ForgeError;
use crate::materialize::WriteStatus;
use crate::naming::Naming;

/// Kind of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    /// Enum for a column's allowed values
    Enum,
    /// `{Entity}Data` row struct
    TransferObject,
    /// `{Entity}Request` input validator
    Validator,
    /// `{Entity}Resource` response shape
    Serializer,
    /// `{Entity}Controller` HTTP handlers
    Controller,
    /// Entry in the shared route registry
    Route,
}

impl ArtifactKind {
    /// Every kind, in dependency order
    pub const ALL: [Self; 6] = [
        Self::Enum,
        Self::TransferObject,
        Self::Validator,
        Self::Serializer,
        Self::Controller,
        Self::Route,
    ];

    /// Kinds whose identifiers this kind imports
    #[must_use]
    pub const fn dependencies(self) -> &'static [Self] {
        match self {
            Self::Enum => &[],
            Self::TransferObject | Self::Validator => &[Self::Enum],
            Self::Serializer => &[Self::TransferObject],
            Self::Controller => &[Self::TransferObject, Self::Validator, Self::Serializer],
            Self::Route => &[Self::Controller],
        }
    }

    /// Template rendered for this kind
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::TransferObject => "transfer_object",
            Self::Validator => "validator",
            Self::Serializer => "serializer",
            Self::Controller => "controller",
            Self::Route => "route",
        }
    }

    /// Whether columns need enum bindings before this kind renders
    #[must_use]
    pub const fn needs_enums(self) -> bool {
        matches!(self, Self::Enum | Self::TransferObject | Self::Validator)
    }

    /// Order `kinds` so every kind follows the requested kinds it imports
    ///
    /// Duplicates are dropped. Among kinds whose dependencies are satisfied,
    /// the one requested first goes first.
    #[must_use]
    pub fn generation_order(kinds: &[Self]) -> Vec<Self> {
        let mut pending: Vec<Self> = Vec::new();
        for kind in kinds {
            if !pending.contains(kind) {
                pending.push(*kind);
            }
        }

        let mut ordered = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending
                .iter()
                .position(|kind| {
                    kind.dependencies()
                        .iter()
                        .all(|dependency| !pending.contains(dependency))
                })
                .unwrap_or(0);
            ordered.push(pending.remove(ready));
        }
        ordered
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enum => "enum",
            Self::TransferObject => "transfer object",
            Self::Validator => "validator",
            Self::Serializer => "serializer",
            Self::Controller => "controller",
            Self::Route => "route",
        };
        f.write_str(name)
    }
}

impl FromStr for ArtifactKind {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "enum" | "enums" => Ok(Self::Enum),
            "dto" | "data" | "transfer_object" => Ok(Self::TransferObject),
            "validator" | "request" => Ok(Self::Validator),
            "serializer" | "resource" => Ok(Self::Serializer),
            "controller" => Ok(Self::Controller),
            "route" | "routes" => Ok(Self::Route),
            other => Err(ForgeError::Config(format!(
                "Unknown artifact kind '{other}' (expected enum, dto, validator, serializer, controller or route)"
            ))),
        }
    }
}

/// Entity named by the caller, optionally inside a folder
///
/// The folder groups related entities (`billing/Invoice`); it becomes a
/// directory level in every artifact path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    /// Entity type name, e.g. `Invoice`
    pub name: String,
    /// Folder segments joined by `/`
    pub folder: Option<String>,
}

impl EntityRef {
    /// Entity at the top level
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: None,
        }
    }

    /// Place the entity in a folder; empty folders are ignored
    #[must_use]
    pub fn in_folder(mut self, folder: Option<impl Into<String>>) -> Self {
        self.folder = folder
            .map(Into::into)
            .map(|folder: String| folder.trim_matches('/').to_string())
            .filter(|folder| !folder.is_empty());
        self
    }

    /// Parse `Folder/Sub/Entity` into a folder and a name
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.trim().trim_matches('/');
        match input.rsplit_once('/') {
            Some((folder, name)) => Self::new(name).in_folder(Some(folder)),
            None => Self::new(input),
        }
    }

    /// `snake_case` entity name
    #[must_use]
    pub fn snake_name(&self) -> String {
        Naming::to_snake_case(&self.name)
    }

    /// Folder as a relative path of `snake_case` segments
    #[must_use]
    pub fn folder_path(&self) -> Option<PathBuf> {
        self.folder.as_ref().map(|folder| {
            folder
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(Naming::to_snake_case)
                .collect()
        })
    }

    /// Key used by the visited-entity guard
    #[must_use]
    pub fn key(&self) -> String {
        match &self.folder {
            Some(folder) => format!("{folder}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// One entity and the artifacts wanted for it
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Entity to generate for
    pub entity: EntityRef,
    /// Requested kinds; the first is the primary artifact
    pub kinds: Vec<ArtifactKind>,
    /// Replace differing files without asking
    pub force: bool,
}

impl GenerationRequest {
    /// Request without forced overwrites
    #[must_use]
    pub const fn new(entity: EntityRef, kinds: Vec<ArtifactKind>) -> Self {
        Self {
            entity,
            kinds,
            force: false,
        }
    }

    /// Set the force flag
    #[must_use]
    pub const fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// One artifact produced during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Entity the artifact belongs to
    pub entity: String,
    /// Artifact kind
    pub kind: ArtifactKind,
    /// Fully-qualified identifier
    pub identifier: String,
    /// File written
    pub path: PathBuf,
    /// What happened on disk
    pub status: WriteStatus,
}

/// Result of generating one request
#[derive(Debug, Clone, Default)]
pub struct GenerationOutcome {
    /// Identifier of the first requested artifact
    ///
    /// `None` only when an enum-only request finds no enumerated column.
    pub primary: Option<String>,
    /// Every artifact produced, nested and implicit ones included
    pub artifacts: Vec<GeneratedArtifact>,
}

impl GenerationOutcome {
    /// Artifacts of one kind
    pub fn of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &GeneratedArtifact> {
        self.artifacts.iter().filter(move |artifact| artifact.kind == kind)
    }
}

/// Failure of one request inside a batch
#[derive(Debug)]
pub struct EntityFailure {
    /// Entity whose remaining artifacts were skipped
    pub entity: EntityRef,
    /// Cause, naming the artifact kind that failed
    pub error: ForgeError,
}

impl EntityFailure {
    /// Kind of the artifact that failed, when known
    #[must_use]
    pub const fn kind(&self) -> Option<ArtifactKind> {
        match &self.error {
            ForgeError::Artifact { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result of a batch of requests
#[derive(Debug, Default)]
pub struct RunReport {
    /// Completed requests, in request order
    pub succeeded: Vec<(EntityRef, GenerationOutcome)>,
    /// Failed requests, in request order
    pub failed: Vec<EntityFailure>,
}

impl RunReport {
    /// Whether every request completed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Receives progress notices while generating
pub trait ProgressSink {
    /// One human-readable notice
    fn notice(&mut self, message: &str);
}

impl<T: ProgressSink + ?Sized> ProgressSink for &mut T {
    fn notice(&mut self, message: &str) {
        (**self).notice(message);
    }
}

/// Progress sink writing notices to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn notice(&mut self, message: &str) {
        info!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_order_follows_imports() {
        use ArtifactKind::*;

        assert_eq!(
            ArtifactKind::generation_order(&[Route, Controller, TransferObject]),
            vec![TransferObject, Controller, Route]
        );
        assert_eq!(
            ArtifactKind::generation_order(&[Controller, Validator, Serializer, TransferObject]),
            vec![Validator, TransferObject, Serializer, Controller]
        );
        assert_eq!(
            ArtifactKind::generation_order(&[Validator, Validator, Enum]),
            vec![Enum, Validator]
        );
    }

    #[test]
    fn test_generation_order_is_stable_for_independent_kinds() {
        use ArtifactKind::*;

        assert_eq!(
            ArtifactKind::generation_order(&[Validator, TransferObject]),
            vec![Validator, TransferObject]
        );
        assert_eq!(
            ArtifactKind::generation_order(&[TransferObject, Validator]),
            vec![TransferObject, Validator]
        );
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("dto".parse::<ArtifactKind>().unwrap(), ArtifactKind::TransferObject);
        assert_eq!("Transfer-Object".parse::<ArtifactKind>().unwrap(), ArtifactKind::TransferObject);
        assert_eq!("resource".parse::<ArtifactKind>().unwrap(), ArtifactKind::Serializer);
        assert!("widget".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_entity_ref_folder() {
        let entity = EntityRef::parse("Billing/Accounts/Invoice");
        assert_eq!(entity.name, "Invoice");
        assert_eq!(entity.folder.as_deref(), Some("Billing/Accounts"));
        assert_eq!(entity.folder_path(), Some(PathBuf::from("billing/accounts")));
        assert_eq!(entity.snake_name(), "invoice");
        assert_eq!(entity.key(), "Billing/Accounts/Invoice");

        let plain = EntityRef::new("Invoice").in_folder(Some("/"));
        assert_eq!(plain.folder, None);
        assert_eq!(plain.folder_path(), None);
    }
}
