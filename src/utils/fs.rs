use std::path::{Path, PathBuf};

use crate::core::format::FormatKind;

/// Human-readable size in binary units. Whole bytes stay exact; larger sizes
/// get one decimal.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let exponent = ((63 - bytes.leading_zeros()) / 10).min(UNITS.len() as u32);
    let scaled = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    format!("{:.1} {}", scaled, UNITS[exponent as usize - 1])
}

/// Archive name used when no `--output` is given: the single input's base
/// name without its last extension, or `archive` for several inputs.
pub fn default_output_name(inputs: &[String], kind: FormatKind) -> PathBuf {
    let stem = match inputs {
        [single] => Path::new(single)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty() && stem != "." && stem != "..")
            .unwrap_or_else(|| "archive".to_string()),
        _ => "archive".to_string(),
    };
    PathBuf::from(format!("{}.{}", stem, kind.extension()))
}
