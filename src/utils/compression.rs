use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use std::io::{self, Read, Write};

use crate::error::{ArchiveError, Result};

pub const MAX_LEVEL: u32 = 9;

/// Single-stream compression algorithm, independent of any container framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Gzip,
    Bzip2,
}

/// Codec-level metadata stored in a gzip header.
#[derive(Debug, Clone, Default)]
pub struct StreamHeader {
    pub name: Option<String>,
    pub mtime: u32,
}

pub fn validate_level(level: u32) -> Result<()> {
    if level > MAX_LEVEL {
        return Err(ArchiveError::InvalidArgument(format!(
            "compression level {} out of range 0-{}",
            level, MAX_LEVEL
        )));
    }
    Ok(())
}

impl Codec {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }

    pub const fn can_encode(self) -> bool {
        matches!(self, Self::Gzip)
    }

    pub fn encoder<W: Write>(
        self,
        sink: W,
        level: u32,
        header: Option<&StreamHeader>,
    ) -> Result<Encoder<W>> {
        validate_level(level)?;
        match self {
            Self::Gzip => {
                let mut builder = GzBuilder::new();
                if let Some(header) = header {
                    if let Some(name) = &header.name {
                        builder = builder.filename(name.as_bytes());
                    }
                    builder = builder.mtime(header.mtime);
                }
                Ok(Encoder::Gzip(builder.write(sink, Compression::new(level))))
            }
            Self::Bzip2 => Err(ArchiveError::UnsupportedOperation(
                "bzip2 compression is not available, only decompression".to_string(),
            )),
        }
    }

    /// Decodes every member of a concatenated stream, not just the first.
    pub fn decoder<R: Read>(self, source: R) -> Decoder<R> {
        match self {
            Self::Gzip => Decoder::Gzip(MultiGzDecoder::new(source)),
            Self::Bzip2 => Decoder::Bzip2(MultiBzDecoder::new(source)),
        }
    }
}

/// Wraps `sink` with `codec`, or passes it through untouched.
pub fn wrap_writer<W: Write>(
    codec: Option<Codec>,
    sink: W,
    level: u32,
    header: Option<&StreamHeader>,
) -> Result<Encoder<W>> {
    match codec {
        Some(codec) => codec.encoder(sink, level, header),
        None => Ok(Encoder::Identity(sink)),
    }
}

pub fn wrap_reader<R: Read>(codec: Option<Codec>, source: R) -> Decoder<R> {
    match codec {
        Some(codec) => codec.decoder(source),
        None => Decoder::Identity(source),
    }
}

pub enum Encoder<W: Write> {
    Identity(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    /// Writes any codec trailer and hands back the underlying sink.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Identity(mut sink) => {
                sink.flush()?;
                Ok(sink)
            }
            Self::Gzip(encoder) => {
                let mut sink = encoder.finish()?;
                sink.flush()?;
                Ok(sink)
            }
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Identity(sink) => sink.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Identity(sink) => sink.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}

pub enum Decoder<R: Read> {
    Identity(R),
    Gzip(MultiGzDecoder<R>),
    Bzip2(MultiBzDecoder<R>),
}

impl<R: Read> Decoder<R> {
    /// Header fields of the first gzip member. Parsed on construction for
    /// blocking readers.
    pub fn stream_header(&self) -> Option<StreamHeader> {
        match self {
            Self::Gzip(decoder) => decoder.header().map(|h| StreamHeader {
                name: h
                    .filename()
                    .map(|name| String::from_utf8_lossy(name).into_owned()),
                mtime: h.mtime(),
            }),
            _ => None,
        }
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Identity(source) => source.read(buf),
            Self::Gzip(decoder) => decoder.read(buf),
            Self::Bzip2(decoder) => decoder.read(buf),
        }
    }
}
