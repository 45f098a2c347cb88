//! Writing generated files
//!
//! [`FileMaterializer::write`] owns one file per artifact. An existing file is
//! never replaced silently: identical content is left alone, different content
//! is replaced only when forced or when the [`OverwritePrompt`] agrees.
//!
//! [`FileMaterializer::append_entry`] maintains shared registries such as
//! `src/routes.rs`: the file is created with a header on first use and each
//! entry is appended at most once.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{FileOperation, ForgeError, ForgeResult};

/// Decides whether an existing file with different content is replaced
pub trait OverwritePrompt {
    /// `true` to replace `path`, currently holding `existing`, with `proposed`
    fn confirm_overwrite(&mut self, path: &Path, existing: &str, proposed: &str) -> bool;
}

impl<F> OverwritePrompt for F
where
    F: FnMut(&Path, &str, &str) -> bool,
{
    fn confirm_overwrite(&mut self, path: &Path, existing: &str, proposed: &str) -> bool {
        self(path, existing, proposed)
    }
}

/// Prompt that always keeps the existing file
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineOverwrite;

impl OverwritePrompt for DeclineOverwrite {
    fn confirm_overwrite(&mut self, _path: &Path, _existing: &str, _proposed: &str) -> bool {
        false
    }
}

/// What happened to a target file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// File did not exist
    Created,
    /// Different content replaced
    Overwritten,
    /// Existing content already matched
    Unchanged,
    /// Overwrite declined, file untouched
    Declined,
    /// Registry entry appended
    Appended,
    /// Registry entry already present
    AlreadyPresent,
}

impl WriteStatus {
    /// Whether the file on disk changed
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Created | Self::Overwritten | Self::Appended)
    }
}

impl fmt::Display for WriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Overwritten => "overwritten",
            Self::Unchanged => "unchanged",
            Self::Declined => "skipped",
            Self::Appended => "appended",
            Self::AlreadyPresent => "already registered",
        };
        f.write_str(label)
    }
}

/// Result of materializing one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Target file
    pub path: PathBuf,
    /// Identifier of the artifact, returned whatever the status
    pub identifier: String,
    /// What happened on disk
    pub status: WriteStatus,
}

/// Writes rendered artifacts to disk
pub struct FileMaterializer<'p> {
    prompt: &'p mut dyn OverwritePrompt,
}

impl fmt::Debug for FileMaterializer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMaterializer").finish_non_exhaustive()
    }
}

impl<'p> FileMaterializer<'p> {
    /// Materializer consulting `prompt` before replacing files
    pub fn new(prompt: &'p mut dyn OverwritePrompt) -> Self {
        Self { prompt }
    }

    /// Write `content` to `path`
    ///
    /// # Errors
    ///
    /// [`ForgeError::Materialize`] when a directory cannot be created or the
    /// file cannot be read or written.
    pub fn write(
        &mut self,
        path: &Path,
        content: &str,
        identifier: &str,
        force: bool,
    ) -> ForgeResult<Materialized> {
        let status = if path.exists() {
            let existing = fs::read_to_string(path)
                .map_err(|err| ForgeError::materialize(path, FileOperation::Read, err))?;

            if existing == content {
                WriteStatus::Unchanged
            } else if force || self.prompt.confirm_overwrite(path, &existing, content) {
                fs::write(path, content)
                    .map_err(|err| ForgeError::materialize(path, FileOperation::Write, err))?;
                WriteStatus::Overwritten
            } else {
                WriteStatus::Declined
            }
        } else {
            create_parent(path)?;
            fs::write(path, content)
                .map_err(|err| ForgeError::materialize(path, FileOperation::Write, err))?;
            WriteStatus::Created
        };

        if status.changed() {
            info!(path = %path.display(), status = %status, "Wrote artifact");
        } else {
            debug!(path = %path.display(), status = %status, "Artifact left in place");
        }

        Ok(Materialized {
            path: path.to_path_buf(),
            identifier: identifier.to_string(),
            status,
        })
    }

    /// Append `entry` to the registry at `path` unless already present
    ///
    /// A missing registry is created with `header` first.
    pub fn append_entry(
        &mut self,
        path: &Path,
        header: &str,
        entry: &str,
        identifier: &str,
    ) -> ForgeResult<Materialized> {
        let created = !path.exists();
        let existing = if created {
            create_parent(path)?;
            fs::write(path, header)
                .map_err(|err| ForgeError::materialize(path, FileOperation::Write, err))?;
            header.to_string()
        } else {
            fs::read_to_string(path)
                .map_err(|err| ForgeError::materialize(path, FileOperation::Read, err))?
        };

        let entry = entry.trim_end();
        let status = if contains_entry(&existing, entry) {
            WriteStatus::AlreadyPresent
        } else {
            let mut addition = String::new();
            if !existing.is_empty() && !existing.ends_with('\n') {
                addition.push('\n');
            }
            addition.push_str(entry);
            addition.push('\n');

            OpenOptions::new()
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(addition.as_bytes()))
                .map_err(|err| ForgeError::materialize(path, FileOperation::Append, err))?;
            if created {
                WriteStatus::Created
            } else {
                WriteStatus::Appended
            }
        };

        debug!(path = %path.display(), status = %status, "Registry entry");
        Ok(Materialized {
            path: path.to_path_buf(),
            identifier: identifier.to_string(),
            status,
        })
    }
}

/// Whether `entry` appears in `content` as whole lines
///
/// Lines are compared trimmed, so indentation does not matter but a
/// commented-out or embedded copy does not count.
fn contains_entry(content: &str, entry: &str) -> bool {
    let wanted: Vec<&str> = entry.lines().map(str::trim).collect();
    if wanted.is_empty() {
        return true;
    }
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    lines.windows(wanted.len()).any(|window| window == wanted.as_slice())
}

fn create_parent(path: &Path) -> ForgeResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|err| ForgeError::materialize(parent, FileOperation::CreateDir, err)),
        _ => Ok(()),
    }
}
