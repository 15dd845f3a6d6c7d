use anyhow::{Context, Result};
use std::path::Path;

use omniarc::types::{ArchiveEntry, ListOptions};
use omniarc::utils::fs::format_bytes;
use omniarc::FormatKind;

pub fn list(options: &ListOptions) -> Result<()> {
    let archive = Path::new(&options.archive);
    let kind = FormatKind::detect(archive);

    let mut listing = omniarc::list(kind, archive)
        .with_context(|| format!("cannot list {}", archive.display()))?;

    if options.json {
        let entries = listing.entries()?.collect::<omniarc::Result<Vec<ArchiveEntry>>>()?;
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Contents of {}:\n", archive.display());
    println!("{:<10} {:<16} {}", "Size", "Modified", "Name");
    println!("{}", "-".repeat(70));

    let mut count = 0usize;
    let mut total: u64 = 0;
    for entry in listing.entries()? {
        let entry = entry?;
        let name = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        println!(
            "{:<10} {:<16} {}",
            entry.size,
            entry.modified.format("%Y-%m-%d %H:%M").to_string(),
            name
        );
        count += 1;
        total += entry.size;
    }

    println!("{}", "-".repeat(70));
    println!("{} entries, {}", count, format_bytes(total));

    Ok(())
}
