use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{ArchiveError, Result};
use crate::types::ArchiveEntry;

#[derive(Debug)]
pub struct WalkItem {
    pub path: PathBuf,
    pub metadata: fs::Metadata,
}

/// Walks `root` depth-first, yielding each directory before its children and
/// siblings in file-name order. Symlinks are followed; a link cycle surfaces as
/// an error item.
pub fn walk(root: &Path) -> impl Iterator<Item = Result<WalkItem>> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry?;
            let metadata = entry.metadata()?;
            Ok(WalkItem {
                path: entry.into_path(),
                metadata,
            })
        })
}

/// One input of a create: the resolved path that gets walked, and the
/// top-level segment its entries are named under.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    pub path: PathBuf,
    pub top: String,
}

impl SourceRoot {
    /// `given` is the path as the caller spelled it and decides the top-level
    /// name, so a symlinked input keeps the link's name. `resolved` is walked.
    /// Inputs without a final component (`.`, `..`) fall back to the resolved
    /// base name.
    pub fn new(given: &Path, resolved: PathBuf) -> Self {
        let top = given
            .file_name()
            .or_else(|| resolved.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: resolved,
            top,
        }
    }

    /// Archive-relative name of `path`, which must lie under this root.
    pub fn entry_name(&self, path: &Path) -> Result<String> {
        let relative = path.strip_prefix(&self.path).map_err(|_| {
            ArchiveError::InvalidArgument(format!(
                "{} is not below {}",
                path.display(),
                self.path.display()
            ))
        })?;

        let segments = relative.components().filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        });

        let mut name = self.top.clone();
        for segment in segments {
            if !name.is_empty() {
                name.push('/');
            }
            name.push_str(&segment);
        }
        Ok(name)
    }
}

pub fn entry_from_metadata(name: String, metadata: &fs::Metadata) -> ArchiveEntry {
    #[cfg(unix)]
    let mode = {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o7777
    };
    #[cfg(not(unix))]
    let mode = if metadata.is_dir() { 0o755u32 } else { 0o644u32 };

    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_default();

    let is_dir = metadata.is_dir();

    ArchiveEntry {
        name,
        is_dir,
        size: if is_dir { 0 } else { metadata.len() },
        mode,
        modified,
    }
}
