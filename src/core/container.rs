use std::io::Read;

use crate::error::Result;
use crate::types::ArchiveEntry;

/// Body of a parsed member as handed to a visitor.
pub enum EntryContent<'a> {
    Directory,
    File(&'a mut dyn Read),
    /// A member kind the materializer does not recreate (symlink, device, ...).
    Unsupported(&'static str),
}

pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<ArchiveEntry>> + 'a>;

pub trait ContainerWriter {
    type Sink;

    /// Appends one member. `content` is `Some` exactly when the entry is a file.
    fn append(&mut self, entry: &ArchiveEntry, content: Option<&mut dyn Read>) -> Result<()>;

    /// Writes the container trailer and returns the sink.
    fn finish(self) -> Result<Self::Sink>;
}

pub trait ContainerReader {
    /// Lazily yields member metadata without touching bodies.
    fn entries(&mut self) -> Result<EntryIter<'_>>;

    /// Calls `visitor` once per member in archive order, with its body.
    fn visit(
        &mut self,
        visitor: &mut dyn FnMut(ArchiveEntry, EntryContent<'_>) -> Result<()>,
    ) -> Result<()>;
}
