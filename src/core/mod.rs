pub mod container;
pub mod engine;
pub mod extractor;
pub mod format;
pub mod scanner;
pub mod tar_container;
pub mod zip_container;
