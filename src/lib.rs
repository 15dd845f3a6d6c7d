//! Archive engine behind the `omniarc` command: one create/extract/list model
//! over ZIP, TAR, TAR+gzip, TAR+bzip2 (extract only) and single-file gzip.
//!
//! Each [`FormatKind`] maps to a container driver and an optional codec
//! through a fixed table; the engine composes walker, container and codec as
//! stream decorators and never buffers a whole payload.

pub mod core;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::core::engine::{create, extract, list, Listing};
pub use crate::core::format::FormatKind;
pub use crate::error::{ArchiveError, Result};
pub use crate::types::{ArchiveEntry, CompressionOptions, CreateSummary, ExtractSummary};
