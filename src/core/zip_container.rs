use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use std::io::{self, Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::container::{ContainerReader, ContainerWriter, EntryContent, EntryIter};
use crate::error::Result;
use crate::types::ArchiveEntry;

const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

pub struct ZipContainerWriter<W: Write + Seek> {
    writer: ZipWriter<W>,
    level: u32,
}

impl<W: Write + Seek> ZipContainerWriter<W> {
    pub fn new(sink: W, level: u32) -> Self {
        Self {
            writer: ZipWriter::new(sink),
            level,
        }
    }

    fn options(&self, entry: &ArchiveEntry) -> SimpleFileOptions {
        // Deflate rejects level 0; store those entries instead.
        let options = if self.level == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.level as i64))
        };
        options
            .unix_permissions(entry.mode)
            .last_modified_time(to_zip_time(&entry.modified))
            .large_file(entry.size >= ZIP64_THRESHOLD)
    }
}

impl<W: Write + Seek> ContainerWriter for ZipContainerWriter<W> {
    type Sink = W;

    fn append(&mut self, entry: &ArchiveEntry, content: Option<&mut dyn Read>) -> Result<()> {
        let options = self.options(entry);
        match content {
            Some(content) => {
                self.writer.start_file(entry.name.as_str(), options)?;
                io::copy(content, &mut self.writer)?;
            }
            None => {
                self.writer
                    .add_directory(format!("{}/", entry.name), options)?;
            }
        }
        log::debug!("zip: wrote {}", entry.name);
        Ok(())
    }

    fn finish(self) -> Result<W> {
        Ok(self.writer.finish()?)
    }
}

/// Reads through the central directory at the end of the archive.
pub struct ZipContainerReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipContainerReader<R> {
    pub fn new(source: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(source)?,
        })
    }
}

impl<R: Read + Seek> ContainerReader for ZipContainerReader<R> {
    fn entries(&mut self) -> Result<EntryIter<'_>> {
        let archive = &mut self.archive;
        let count = archive.len();
        Ok(Box::new((0..count).map(move |index| {
            let file = archive.by_index_raw(index)?;
            Ok(entry_metadata(
                file.name(),
                file.is_dir(),
                file.size(),
                file.unix_mode(),
                file.last_modified(),
            ))
        })))
    }

    fn visit(
        &mut self,
        visitor: &mut dyn FnMut(ArchiveEntry, EntryContent<'_>) -> Result<()>,
    ) -> Result<()> {
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            let entry = entry_metadata(
                file.name(),
                file.is_dir(),
                file.size(),
                file.unix_mode(),
                file.last_modified(),
            );
            if entry.is_dir {
                visitor(entry, EntryContent::Directory)?;
            } else {
                visitor(entry, EntryContent::File(&mut file))?;
            }
        }
        Ok(())
    }
}

fn entry_metadata(
    name: &str,
    is_dir: bool,
    size: u64,
    unix_mode: Option<u32>,
    modified: Option<zip::DateTime>,
) -> ArchiveEntry {
    let default_mode = if is_dir { 0o755 } else { 0o644 };
    ArchiveEntry {
        name: name.trim_end_matches('/').to_string(),
        is_dir,
        size: if is_dir { 0 } else { size },
        mode: unix_mode.map(|m| m & 0o7777).unwrap_or(default_mode),
        modified: modified.and_then(from_zip_time).unwrap_or_default(),
    }
}

/// DOS timestamps cover 1980..=2107 at two-second resolution; anything
/// outside the range is stored as the DOS epoch.
fn to_zip_time(time: &DateTime<Utc>) -> zip::DateTime {
    let (Ok(year), Ok(month), Ok(day), Ok(hour), Ok(minute), Ok(second)) = (
        u16::try_from(time.year()),
        u8::try_from(time.month()),
        u8::try_from(time.day()),
        u8::try_from(time.hour()),
        u8::try_from(time.minute()),
        u8::try_from(time.second()),
    ) else {
        return zip::DateTime::default();
    };
    zip::DateTime::from_date_and_time(year, month, day, hour, minute, second).unwrap_or_default()
}

fn from_zip_time(time: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(time.year() as i32, time.month() as u32, time.day() as u32)?
        .and_hms_opt(time.hour() as u32, time.minute() as u32, time.second() as u32)
        .map(|naive| naive.and_utc())
}
