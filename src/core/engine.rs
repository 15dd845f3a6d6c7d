use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::core::container::{ContainerReader, ContainerWriter, EntryContent, EntryIter};
use crate::core::extractor::Materializer;
use crate::core::format::{Container, FormatKind, Layout};
use crate::core::scanner::{entry_from_metadata, walk, SourceRoot};
use crate::core::tar_container::{TarContainerReader, TarContainerWriter};
use crate::core::zip_container::{ZipContainerReader, ZipContainerWriter};
use crate::error::{ArchiveError, Result};
use crate::types::{ArchiveEntry, CompressionOptions, CreateSummary, ExtractSummary};
use crate::utils::compression::{validate_level, wrap_reader, wrap_writer, Codec, StreamHeader};

/// Builds an archive of `kind` at `target` from `sources`.
///
/// Output is staged in a temporary file next to `target` and renamed into
/// place only once every entry, the container trailer and the codec trailer
/// have been written, so a failed run leaves no partial archive behind.
pub fn create(
    kind: FormatKind,
    sources: &[PathBuf],
    target: &Path,
    options: &CompressionOptions,
) -> Result<CreateSummary> {
    let layout = layout_for(kind)?;
    if let Some(codec) = layout.codec.filter(|codec| !codec.can_encode()) {
        return Err(ArchiveError::UnsupportedFormat(format!(
            "{} archives can only be extracted, {} compression is not available",
            kind,
            codec.name()
        )));
    }
    validate_level(options.level)?;
    warn_ignored_password(options);

    if sources.is_empty() {
        return Err(ArchiveError::InvalidArgument("no input paths given".to_string()));
    }
    if layout.container.is_none() && sources.len() > 1 {
        return Err(ArchiveError::UnsupportedOperation(format!(
            "{} compresses exactly one file, got {} inputs",
            kind,
            sources.len()
        )));
    }

    let roots = sources
        .iter()
        .map(|source| Ok(SourceRoot::new(source, canonical_source(source)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut staged = stage_output(target)?;
    let mut excluded = vec![fs::canonicalize(staged.path())?];
    if let Ok(existing) = fs::canonicalize(target) {
        excluded.push(existing);
    }

    let summary = {
        let sink = BufWriter::new(staged.as_file_mut());
        let (sink, summary) = write_archive(layout, &roots, &excluded, sink, options)?;
        sink.into_inner().map_err(|e| e.into_error())?;
        summary
    };
    staged.as_file().sync_all()?;
    staged
        .persist(target)
        .map_err(|e| ArchiveError::Io(e.error))?;

    log::info!(
        "created {} ({}, {} entries, {} bytes read)",
        target.display(),
        kind,
        summary.entries,
        summary.bytes_read
    );
    Ok(summary)
}

/// Unpacks `source` into `destination`, creating the destination and any
/// intermediate directories.
pub fn extract(
    kind: FormatKind,
    source: &Path,
    destination: &Path,
    options: &CompressionOptions,
) -> Result<ExtractSummary> {
    let layout = layout_for(kind)?;
    warn_ignored_password(options);

    let file = open_archive(source)?;
    let mut materializer = Materializer::new(destination)?;

    match (layout.container, layout.codec) {
        (Some(container), codec) => {
            let mut reader = open_container(container, codec, file)?;
            reader.visit(&mut |entry, content| materializer.materialize(&entry, content))?;
        }
        (None, Some(codec)) => {
            let mut decoder = codec.decoder(BufReader::new(file));
            let header = decoder.stream_header().ok_or_else(|| {
                ArchiveError::Format(format!(
                    "{} has no readable {} header",
                    source.display(),
                    codec.name()
                ))
            })?;
            let entry = single_stream_entry(source, &header, 0);
            materializer.materialize(&entry, EntryContent::File(&mut decoder))?;
        }
        (None, None) => return Err(unsupported(kind)),
    }

    let summary = materializer.finish();
    log::info!(
        "extracted {} into {} ({} files, {} directories)",
        source.display(),
        destination.display(),
        summary.files,
        summary.directories
    );
    Ok(summary)
}

/// Opens `source` for listing. Metadata is produced lazily by
/// [`Listing::entries`].
pub fn list(kind: FormatKind, source: &Path) -> Result<Listing> {
    let layout = layout_for(kind)?;
    let file = open_archive(source)?;

    match (layout.container, layout.codec) {
        (Some(container), codec) => {
            Ok(Listing::Container(open_container(container, codec, file)?))
        }
        (None, Some(Codec::Gzip)) => Ok(Listing::Single(gzip_entry(source, file)?)),
        _ => Err(unsupported(kind)),
    }
}

/// A single pass over an archive's entries.
pub enum Listing {
    Container(Box<dyn ContainerReader>),
    Single(ArchiveEntry),
}

impl Listing {
    pub fn entries(&mut self) -> Result<EntryIter<'_>> {
        match self {
            Self::Container(reader) => reader.entries(),
            Self::Single(entry) => Ok(Box::new(std::iter::once(Ok(entry.clone())))),
        }
    }
}

fn layout_for(kind: FormatKind) -> Result<Layout> {
    kind.layout().ok_or_else(|| unsupported(kind))
}

fn unsupported(kind: FormatKind) -> ArchiveError {
    ArchiveError::UnsupportedFormat(format!("no driver for archive type {}", kind))
}

fn warn_ignored_password(options: &CompressionOptions) {
    if options.password.is_some() {
        log::warn!("password given but encryption is not supported; archive data is not encrypted");
    }
}

fn canonical_source(source: &Path) -> Result<PathBuf> {
    fs::canonicalize(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArchiveError::NotFound(source.to_path_buf()),
        _ => ArchiveError::Io(e),
    })
}

fn open_archive(source: &Path) -> Result<File> {
    File::open(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArchiveError::NotFound(source.to_path_buf()),
        _ => ArchiveError::Io(e),
    })
}

fn stage_output(target: &Path) -> Result<tempfile::NamedTempFile> {
    let dir = target
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut builder = tempfile::Builder::new();
    builder.prefix(".omniarc-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    Ok(builder.tempfile_in(dir)?)
}

fn open_container(
    container: Container,
    codec: Option<Codec>,
    file: File,
) -> Result<Box<dyn ContainerReader>> {
    match container {
        Container::Zip => {
            if let Some(codec) = codec {
                return Err(ArchiveError::UnsupportedFormat(format!(
                    "zip archives cannot be wrapped in {}",
                    codec.name()
                )));
            }
            Ok(Box::new(ZipContainerReader::new(BufReader::new(file))?))
        }
        Container::Tar => Ok(Box::new(TarContainerReader::new(wrap_reader(
            codec,
            BufReader::new(file),
        )))),
    }
}

fn write_archive<W: Write + Seek>(
    layout: Layout,
    roots: &[SourceRoot],
    excluded: &[PathBuf],
    sink: W,
    options: &CompressionOptions,
) -> Result<(W, CreateSummary)> {
    match (layout.container, layout.codec) {
        (Some(Container::Zip), None) => {
            let mut writer = ZipContainerWriter::new(sink, options.level);
            let summary = append_roots(&mut writer, roots, excluded)?;
            Ok((writer.finish()?, summary))
        }
        (Some(Container::Tar), codec) => {
            let encoder = wrap_writer(codec, sink, options.level, None)?;
            let mut writer = TarContainerWriter::new(encoder);
            let summary = append_roots(&mut writer, roots, excluded)?;
            let sink = writer.finish()?.finish()?;
            Ok((sink, summary))
        }
        (None, Some(codec)) => compress_single(codec, &roots[0], sink, options.level),
        (container, codec) => Err(ArchiveError::UnsupportedFormat(format!(
            "cannot compose {:?} with {:?}",
            container, codec
        ))),
    }
}

fn append_roots<C: ContainerWriter>(
    writer: &mut C,
    roots: &[SourceRoot],
    excluded: &[PathBuf],
) -> Result<CreateSummary> {
    let mut summary = CreateSummary::default();

    for root in roots {
        for item in walk(&root.path) {
            let item = item?;
            if excluded.iter().any(|path| *path == item.path) {
                continue;
            }

            let name = root.entry_name(&item.path)?;
            if name.is_empty() {
                continue;
            }

            let file_type = item.metadata.file_type();
            if !file_type.is_dir() && !file_type.is_file() {
                log::warn!("skipping {}: not a regular file or directory", item.path.display());
                continue;
            }

            let entry = entry_from_metadata(name, &item.metadata);
            if entry.is_dir {
                writer.append(&entry, None)?;
            } else {
                let mut file = File::open(&item.path)?;
                writer.append(&entry, Some(&mut file))?;
                summary.bytes_read += entry.size;
            }
            summary.entries += 1;
        }
    }

    Ok(summary)
}

fn compress_single<W: Write>(
    codec: Codec,
    root: &SourceRoot,
    sink: W,
    level: u32,
) -> Result<(W, CreateSummary)> {
    let source = root.path.as_path();
    let metadata = fs::metadata(source)?;
    if !metadata.is_file() {
        return Err(ArchiveError::UnsupportedOperation(format!(
            "{} can only compress a single file, {} is not one",
            codec.name(),
            source.display()
        )));
    }

    let header = StreamHeader {
        name: Some(root.top.clone()).filter(|top| !top.is_empty()),
        mtime: metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs().min(u32::MAX as u64) as u32)
            .unwrap_or(0),
    };

    let mut encoder = codec.encoder(sink, level, Some(&header))?;
    let copied = io::copy(&mut File::open(source)?, &mut encoder)?;
    let sink = encoder.finish()?;

    Ok((
        sink,
        CreateSummary {
            entries: 1,
            bytes_read: copied,
        },
    ))
}

/// Entry for a codec-only archive. The name comes from the stream header when
/// present (reduced to its final component), otherwise from the archive's
/// own filename with the codec suffix removed.
fn single_stream_entry(source: &Path, header: &StreamHeader, size: u64) -> ArchiveEntry {
    let name = header
        .name
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| strip_codec_suffix(source));

    ArchiveEntry {
        name,
        is_dir: false,
        size,
        mode: 0,
        modified: DateTime::<Utc>::from_timestamp(header.mtime as i64, 0).unwrap_or_default(),
    }
}

fn strip_codec_suffix(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = if name.to_lowercase().ends_with(".gz") {
        &name[..name.len() - 3]
    } else {
        name.as_str()
    };

    if stem.is_empty() {
        "output".to_string()
    } else {
        stem.to_string()
    }
}

/// Reads the name from the gzip header and the uncompressed size (mod 2^32)
/// from the ISIZE trailer without inflating the body.
fn gzip_entry(source: &Path, mut file: File) -> Result<ArchiveEntry> {
    let len = file.metadata()?.len();
    let mut size = 0;
    if len >= 18 {
        let mut trailer = [0u8; 4];
        file.seek(SeekFrom::End(-4))?;
        file.read_exact(&mut trailer)?;
        size = u32::from_le_bytes(trailer) as u64;
        file.rewind()?;
    }

    let decoder = Codec::Gzip.decoder(BufReader::new(file));
    let header = decoder.stream_header().ok_or_else(|| {
        ArchiveError::Format(format!("{} has no readable gzip header", source.display()))
    })?;
    Ok(single_stream_entry(source, &header, size))
}
