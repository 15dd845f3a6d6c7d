use std::fmt;
use std::path::Path;

use crate::utils::compression::Codec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    Gzip,
    Unknown,
}

/// Multiplexing layer of a format. `None` in a [`Layout`] means the codec
/// carries a single byte stream with no framing of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Zip,
    Tar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub container: Option<Container>,
    pub codec: Option<Codec>,
}

const LAYOUTS: [(FormatKind, Layout); 5] = [
    (
        FormatKind::Zip,
        Layout {
            container: Some(Container::Zip),
            codec: None,
        },
    ),
    (
        FormatKind::Tar,
        Layout {
            container: Some(Container::Tar),
            codec: None,
        },
    ),
    (
        FormatKind::TarGz,
        Layout {
            container: Some(Container::Tar),
            codec: Some(Codec::Gzip),
        },
    ),
    (
        FormatKind::TarBz2,
        Layout {
            container: Some(Container::Tar),
            codec: Some(Codec::Bzip2),
        },
    ),
    (
        FormatKind::Gzip,
        Layout {
            container: None,
            codec: Some(Codec::Gzip),
        },
    ),
];

const SUFFIXES: [(&str, FormatKind); 7] = [
    (".tar.gz", FormatKind::TarGz),
    (".tgz", FormatKind::TarGz),
    (".tar.bz2", FormatKind::TarBz2),
    (".tbz2", FormatKind::TarBz2),
    (".tar", FormatKind::Tar),
    (".zip", FormatKind::Zip),
    (".gz", FormatKind::Gzip),
];

impl FormatKind {
    /// Maps a filename's suffix chain to a kind, longest chains first and
    /// case-insensitively.
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, kind)| *kind)
            .unwrap_or(FormatKind::Unknown)
    }

    /// Parses the name accepted by `--type`.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "zip" => Some(Self::Zip),
            "tar" => Some(Self::Tar),
            "tar.gz" | "tgz" => Some(Self::TarGz),
            "tar.bz2" | "tbz2" => Some(Self::TarBz2),
            "gzip" | "gz" => Some(Self::Gzip),
            _ => None,
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::Gzip => "gz",
            Self::Unknown => "",
        }
    }

    pub fn layout(self) -> Option<Layout> {
        LAYOUTS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, layout)| *layout)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            other => f.write_str(other.extension()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(FormatKind::detect(Path::new("a.tar.gz")), FormatKind::TarGz);
        assert_eq!(FormatKind::detect(Path::new("a.tgz")), FormatKind::TarGz);
        assert_eq!(FormatKind::detect(Path::new("a.zip")), FormatKind::Zip);
        assert_eq!(FormatKind::detect(Path::new("a.xyz")), FormatKind::Unknown);
    }

    #[test]
    fn test_detect_suffix_chain_and_case() {
        assert_eq!(FormatKind::detect(Path::new("dir/B.TAR.BZ2")), FormatKind::TarBz2);
        assert_eq!(FormatKind::detect(Path::new("b.tbz2")), FormatKind::TarBz2);
        assert_eq!(FormatKind::detect(Path::new("notes.txt.gz")), FormatKind::Gzip);
        assert_eq!(FormatKind::detect(Path::new("backup.tar")), FormatKind::Tar);
        assert_eq!(FormatKind::detect(Path::new("zip")), FormatKind::Unknown);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(FormatKind::from_type_name("tgz"), Some(FormatKind::TarGz));
        assert_eq!(FormatKind::from_type_name("GZIP"), Some(FormatKind::Gzip));
        assert_eq!(FormatKind::from_type_name("rar"), None);
    }

    #[test]
    fn test_layout_table() {
        let layout = FormatKind::TarBz2.layout().unwrap();
        assert_eq!(layout.container, Some(Container::Tar));
        assert_eq!(layout.codec, Some(Codec::Bzip2));

        let layout = FormatKind::Gzip.layout().unwrap();
        assert_eq!(layout.container, None);

        assert!(FormatKind::Unknown.layout().is_none());
    }
}
