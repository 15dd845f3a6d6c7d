use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata of one archive member. The name is archive-relative, uses `/`
/// separators and never carries a trailing slash; containers that mark
/// directories by name (ZIP) add and strip it themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub mode: u32,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CompressionOptions {
    pub level: u32,
    pub password: Option<String>,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            level: 6,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateSummary {
    pub entries: usize,
    pub bytes_read: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes_written: u64,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub paths: Vec<String>,
    pub level: u32,
    pub kind: String,
    pub output: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DecompressOptions {
    pub archive: String,
    pub output: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub archive: String,
    pub json: bool,
}
