use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use omniarc::error::ArchiveError;
use omniarc::types::{CompressOptions, CompressionOptions};
use omniarc::utils::fs::{default_output_name, format_bytes};
use omniarc::utils::progress::create_spinner;
use omniarc::utils::report::print_panel;
use omniarc::FormatKind;

pub fn compress(options: &CompressOptions, quiet: bool) -> Result<()> {
    let kind = FormatKind::from_type_name(&options.kind).ok_or_else(|| {
        ArchiveError::UnsupportedFormat(format!("unknown compression type: {}", options.kind))
    })?;

    let output = options
        .output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_name(&options.paths, kind));

    if options.password.is_some() {
        eprintln!("Warning: --password is not applied, the archive will NOT be encrypted");
    }

    eprintln!("Compressing to {}...", output.display());

    let sources: Vec<PathBuf> = options.paths.iter().map(PathBuf::from).collect();
    let engine_options = CompressionOptions {
        level: options.level,
        password: options.password.clone(),
    };

    let spinner = create_spinner("Compressing", quiet);
    let start = Instant::now();
    let result = omniarc::create(kind, &sources, &output, &engine_options);
    spinner.finish_and_clear();
    let summary = result.context("compression failed")?;
    let elapsed = start.elapsed().as_secs_f64();

    let archive_size = fs::metadata(&output)?.len();
    let ratio = if summary.bytes_read > 0 {
        (1.0 - archive_size as f64 / summary.bytes_read as f64) * 100.0
    } else {
        0.0
    };

    print_panel(
        "Compress Complete",
        &[
            format!("Output: {}", output.display()),
            format!("Type: {}", kind),
            format!("Entries: {}", summary.entries),
            format!("Original: {}", format_bytes(summary.bytes_read)),
            format!("Archive size: {}", format_bytes(archive_size)),
            format!("Saved: {:.1}%", ratio),
            format!("Time: {:.1}s", elapsed),
        ],
    );

    Ok(())
}
