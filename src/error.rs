use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed archive: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Classifies an I/O error raised while decoding archive bytes. Decoders
    /// report corrupt input through these kinds rather than a dedicated type.
    pub fn from_decode(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidData
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::UnexpectedEof => Self::Format(err.to_string()),
            _ => Self::Io(err),
        }
    }

    /// Like [`ArchiveError::from_decode`], for errors surfaced by the `tar`
    /// reader, which uses `Other` for bad checksums and short blocks.
    pub fn from_tar(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::Other => Self::Format(err.to_string()),
            _ => Self::from_decode(err),
        }
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::Io(e),
            other => Self::Format(other.to_string()),
        }
    }
}

impl From<walkdir::Error> for ArchiveError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(io::Error::from(err))
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
