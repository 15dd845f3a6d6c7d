use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Instant;

use omniarc::types::{CompressionOptions, DecompressOptions};
use omniarc::utils::fs::format_bytes;
use omniarc::utils::progress::create_spinner;
use omniarc::utils::report::print_panel;
use omniarc::FormatKind;

pub fn decompress(options: &DecompressOptions, quiet: bool) -> Result<()> {
    let archive = Path::new(&options.archive);
    let destination = Path::new(&options.output);

    if !archive.exists() {
        bail!("archive file not found: {}", archive.display());
    }

    let kind = FormatKind::detect(archive);
    if kind == FormatKind::Unknown {
        bail!("unsupported or unknown archive type: {}", archive.display());
    }

    if options.password.is_some() {
        eprintln!("Warning: --password is not applied, archives are read without decryption");
    }

    eprintln!(
        "Extracting {} to {}...",
        archive.display(),
        destination.display()
    );

    let engine_options = CompressionOptions {
        password: options.password.clone(),
        ..CompressionOptions::default()
    };

    let spinner = create_spinner("Extracting", quiet);
    let start = Instant::now();
    let result = omniarc::extract(kind, archive, destination, &engine_options);
    spinner.finish_and_clear();
    let summary = result.context("extraction failed")?;
    let elapsed = start.elapsed().as_secs_f64();

    let mut lines = vec![
        format!("Destination: {}", destination.display()),
        format!(
            "Extracted: {} files, {} directories ({})",
            summary.files,
            summary.directories,
            format_bytes(summary.bytes_written)
        ),
        format!("Time: {:.1}s", elapsed),
    ];
    if summary.skipped > 0 {
        lines.push(format!("Skipped: {} unsupported entries", summary.skipped));
    }

    print_panel("Decompress Complete", &lines);

    Ok(())
}
