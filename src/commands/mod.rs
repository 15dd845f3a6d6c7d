pub mod compress;
pub mod decompress;
pub mod list;
pub mod version;
