use chrono::{DateTime, Utc};
use std::io::{self, Read, Write};
use tar::{Archive, Builder, EntryType, Header};

use crate::core::container::{ContainerReader, ContainerWriter, EntryContent, EntryIter};
use crate::error::{ArchiveError, Result};
use crate::types::ArchiveEntry;

pub struct TarContainerWriter<W: Write> {
    builder: Builder<W>,
}

impl<W: Write> TarContainerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            builder: Builder::new(sink),
        }
    }
}

impl<W: Write> ContainerWriter for TarContainerWriter<W> {
    type Sink = W;

    fn append(&mut self, entry: &ArchiveEntry, content: Option<&mut dyn Read>) -> Result<()> {
        let mut header = Header::new_gnu();
        header.set_mode(entry.mode);
        header.set_mtime(entry.modified.timestamp().max(0) as u64);

        match content {
            Some(content) => {
                header.set_entry_type(EntryType::Regular);
                header.set_size(entry.size);
                self.builder.append_data(&mut header, &entry.name, content)?;
            }
            None => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                self.builder
                    .append_data(&mut header, &entry.name, io::empty())?;
            }
        }
        log::debug!("tar: wrote {}", entry.name);
        Ok(())
    }

    fn finish(self) -> Result<W> {
        Ok(self.builder.into_inner()?)
    }
}

/// Sequential reader; every pass is a full linear scan of the stream.
pub struct TarContainerReader<R: Read> {
    archive: Archive<R>,
}

impl<R: Read> TarContainerReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            archive: Archive::new(source),
        }
    }
}

impl<R: Read> ContainerReader for TarContainerReader<R> {
    fn entries(&mut self) -> Result<EntryIter<'_>> {
        let entries = self
            .archive
            .entries()
            .map_err(ArchiveError::from_tar)?;
        Ok(Box::new(entries.map(|entry| {
            let entry = entry.map_err(ArchiveError::from_tar)?;
            entry_metadata(&entry)
        })))
    }

    fn visit(
        &mut self,
        visitor: &mut dyn FnMut(ArchiveEntry, EntryContent<'_>) -> Result<()>,
    ) -> Result<()> {
        let entries = self
            .archive
            .entries()
            .map_err(ArchiveError::from_tar)?;

        for entry in entries {
            let mut entry = entry.map_err(ArchiveError::from_tar)?;
            let metadata = entry_metadata(&entry)?;
            let kind = entry.header().entry_type();

            if kind.is_dir() {
                visitor(metadata, EntryContent::Directory)?;
            } else if kind.is_file() {
                visitor(metadata, EntryContent::File(&mut entry))?;
            } else {
                visitor(metadata, EntryContent::Unsupported(describe(kind)))?;
            }
        }
        Ok(())
    }
}

fn entry_metadata<R: Read>(entry: &tar::Entry<'_, R>) -> Result<ArchiveEntry> {
    let header = entry.header();
    let is_dir = header.entry_type().is_dir();
    let name = String::from_utf8_lossy(&entry.path_bytes())
        .trim_end_matches('/')
        .to_string();
    let size = header.size().map_err(ArchiveError::from_tar)?;
    let mode = header.mode().map_err(ArchiveError::from_tar)?;
    let mtime = header.mtime().map_err(ArchiveError::from_tar)?;

    Ok(ArchiveEntry {
        name,
        is_dir,
        size: if is_dir { 0 } else { size },
        mode: mode & 0o7777,
        modified: i64::try_from(mtime)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_default(),
    })
}

fn describe(kind: EntryType) -> &'static str {
    match kind {
        EntryType::Symlink => "symlink",
        EntryType::Link => "hard link",
        EntryType::Char => "character device",
        EntryType::Block => "block device",
        EntryType::Fifo => "fifo",
        _ => "special entry",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn entry(name: &str, is_dir: bool, size: u64) -> ArchiveEntry {
        ArchiveEntry {
            name: name.to_string(),
            is_dir,
            size,
            mode: if is_dir { 0o755 } else { 0o600 },
            modified: Utc.with_ymd_and_hms(2023, 11, 2, 8, 15, 33).unwrap(),
        }
    }

    fn build_archive() -> Vec<u8> {
        let mut writer = TarContainerWriter::new(Vec::new());
        writer.append(&entry("pkg", true, 0), None).unwrap();
        let body = b"#!/bin/sh\necho hi\n";
        writer
            .append(&entry("pkg/run.sh", false, body.len() as u64), Some(&mut &body[..]))
            .unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_entries_in_write_order() {
        let mut reader = TarContainerReader::new(Cursor::new(build_archive()));
        let entries: Vec<ArchiveEntry> = reader.entries().unwrap().map(|e| e.unwrap()).collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry("pkg", true, 0));
        assert_eq!(entries[1], entry("pkg/run.sh", false, 18));
    }

    #[test]
    fn test_visit_reads_bodies() {
        let mut reader = TarContainerReader::new(Cursor::new(build_archive()));
        let mut seen = Vec::new();
        reader
            .visit(&mut |entry, content| {
                match content {
                    EntryContent::Directory => seen.push(format!("dir {}", entry.name)),
                    EntryContent::File(body) => {
                        let mut text = String::new();
                        body.read_to_string(&mut text)?;
                        seen.push(format!("file {} {}", entry.name, text.len()));
                    }
                    EntryContent::Unsupported(kind) => seen.push(kind.to_string()),
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec!["dir pkg", "file pkg/run.sh 18"]);
    }

    #[test]
    fn test_symlink_reported_as_unsupported() {
        let mut builder = Builder::new(Vec::new());
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        builder
            .append_link(&mut header, "latest", "pkg/run.sh")
            .unwrap();
        let bytes = builder.into_inner().unwrap();

        let mut reader = TarContainerReader::new(Cursor::new(bytes));
        let mut kinds = Vec::new();
        reader
            .visit(&mut |_, content| {
                if let EntryContent::Unsupported(kind) = content {
                    kinds.push(kind);
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(kinds, vec!["symlink"]);
    }

    #[test]
    fn test_empty_stream_has_no_entries() {
        let mut reader = TarContainerReader::new(Cursor::new(vec![0u8; 1024]));
        assert_eq!(reader.entries().unwrap().count(), 0);
    }
}
