use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::core::container::EntryContent;
use crate::error::{ArchiveError, Result};
use crate::types::{ArchiveEntry, ExtractSummary};

/// Writes parsed entries under a destination root, creating missing parent
/// directories as it goes. Nothing already written is rolled back on error.
pub struct Materializer<'a> {
    root: &'a Path,
    summary: ExtractSummary,
}

impl<'a> Materializer<'a> {
    pub fn new(root: &'a Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root,
            summary: ExtractSummary::default(),
        })
    }

    pub fn materialize(&mut self, entry: &ArchiveEntry, content: EntryContent<'_>) -> Result<()> {
        match content {
            EntryContent::Directory => {
                let path = resolve_entry_path(self.root, &entry.name)?;
                fs::create_dir_all(&path)?;
                self.summary.directories += 1;
            }
            EntryContent::File(body) => {
                let path = resolve_entry_path(self.root, &entry.name)?;
                if path == self.root {
                    return Err(ArchiveError::Format(format!(
                        "file entry has an empty name: {:?}",
                        entry.name
                    )));
                }
                let written = self.write_file(&path, body, entry.mode)?;
                self.summary.files += 1;
                self.summary.bytes_written += written;
            }
            EntryContent::Unsupported(kind) => {
                log::warn!("skipping {} entry {}", kind, entry.name);
                self.summary.skipped += 1;
            }
        }
        Ok(())
    }

    pub fn finish(self) -> ExtractSummary {
        self.summary
    }

    fn write_file(&self, path: &Path, body: &mut dyn io::Read, mode: u32) -> Result<u64> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Unlink instead of truncating: an earlier run may have left it read-only.
        match fs::symlink_metadata(path) {
            Ok(existing) if !existing.is_dir() => fs::remove_file(path)?,
            _ => {}
        }

        let mut out = BufWriter::new(File::create(path)?);
        let written = io::copy(body, &mut out).map_err(ArchiveError::from_decode)?;
        out.flush()?;
        log::debug!("extracted {} ({} bytes)", path.display(), written);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if mode != 0 {
                if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
                {
                    log::warn!("failed to set permissions on {}: {}", path.display(), e);
                }
            }
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(written)
    }
}

#[cfg(windows)]
const SEPARATORS: &[char] = &['/', '\\'];
#[cfg(not(windows))]
const SEPARATORS: &[char] = &['/'];

/// Joins an archive-relative name onto `root`. Names that are absolute or
/// climb out through `..` are rejected; `.` and empty segments are dropped.
pub fn resolve_entry_path(root: &Path, name: &str) -> Result<PathBuf> {
    let escapes = || ArchiveError::Format(format!("entry escapes destination: {}", name));

    if name.starts_with('/') || name.starts_with('\\') {
        return Err(escapes());
    }

    let mut path = root.to_path_buf();
    for segment in name.split(SEPARATORS) {
        for component in Path::new(segment).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(escapes());
                }
            }
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn entry(name: &str, is_dir: bool) -> ArchiveEntry {
        ArchiveEntry {
            name: name.to_string(),
            is_dir,
            size: 0,
            mode: if is_dir { 0o755 } else { 0o640 },
            modified: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_entry_path() {
        let root = Path::new("/out");
        assert_eq!(
            resolve_entry_path(root, "a/b/c.txt").unwrap(),
            PathBuf::from("/out/a/b/c.txt")
        );
        assert_eq!(
            resolve_entry_path(root, "./a//b").unwrap(),
            PathBuf::from("/out/a/b")
        );
        assert!(resolve_entry_path(root, "../evil.txt").is_err());
        assert!(resolve_entry_path(root, "a/../../evil.txt").is_err());
        assert!(resolve_entry_path(root, "/etc/passwd").is_err());
    }

    #[test]
    fn test_materialize_file_creates_parents() {
        let dir = tempdir().unwrap();
        let mut materializer = Materializer::new(dir.path()).unwrap();
        let mut body: &[u8] = b"payload";
        materializer
            .materialize(&entry("deep/er/file.txt", false), EntryContent::File(&mut body))
            .unwrap();

        let summary = materializer.finish();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.bytes_written, 7);
        assert_eq!(
            fs::read_to_string(dir.path().join("deep/er/file.txt")).unwrap(),
            "payload"
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.path().join("deep/er/file.txt"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o640);
        }
    }

    #[test]
    fn test_directory_creation_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut materializer = Materializer::new(dir.path()).unwrap();
        materializer
            .materialize(&entry("same", true), EntryContent::Directory)
            .unwrap();
        materializer
            .materialize(&entry("same", true), EntryContent::Directory)
            .unwrap();
        assert_eq!(materializer.finish().directories, 2);
        assert!(dir.path().join("same").is_dir());
    }

    #[test]
    fn test_existing_file_is_truncated() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("f.txt"), "a much longer old body").unwrap();

        let mut materializer = Materializer::new(dir.path()).unwrap();
        let mut body: &[u8] = b"new";
        materializer
            .materialize(&entry("f.txt", false), EntryContent::File(&mut body))
            .unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("f.txt")).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_is_part_of_the_name() {
        let root = Path::new("/out");
        assert_eq!(
            resolve_entry_path(root, "dir/odd\\name.txt").unwrap(),
            PathBuf::from("/out/dir/odd\\name.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_file_is_replaced() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let mut read_only = entry("locked.txt", false);
        read_only.mode = 0o444;

        let mut materializer = Materializer::new(dir.path()).unwrap();
        let mut first: &[u8] = b"first";
        materializer
            .materialize(&read_only, EntryContent::File(&mut first))
            .unwrap();
        let mut second: &[u8] = b"second";
        materializer
            .materialize(&read_only, EntryContent::File(&mut second))
            .unwrap();

        let path = dir.path().join("locked.txt");
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(
            fs::metadata(&path).unwrap().permissions().mode() & 0o777,
            0o444
        );
    }

    #[test]
    fn test_traversal_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest");
        let mut materializer = Materializer::new(&dest).unwrap();
        let mut body: &[u8] = b"x";
        let err = materializer
            .materialize(&entry("../escaped.txt", false), EntryContent::File(&mut body))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Format(_)));
        assert!(!dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_unsupported_is_counted() {
        let dir = tempdir().unwrap();
        let mut materializer = Materializer::new(dir.path()).unwrap();
        materializer
            .materialize(&entry("link", false), EntryContent::Unsupported("symlink"))
            .unwrap();
        assert_eq!(materializer.finish().skipped, 1);
    }
}
