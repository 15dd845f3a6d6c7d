pub mod compression;
pub mod fs;
pub mod progress;
pub mod report;
