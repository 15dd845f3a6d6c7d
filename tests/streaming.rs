use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use omniarc::{CompressionOptions, FormatKind};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

const INPUT_SIZE: usize = 24 * 1024 * 1024;
const HEAP_LIMIT: usize = 8 * 1024 * 1024;

/// Fills `path` with `len` bytes of xorshift noise, one small chunk at a time.
fn write_noise(path: &Path, len: usize) {
    let mut out = BufWriter::new(File::create(path).unwrap());
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut chunk = [0u8; 4096];
    let mut remaining = len;
    while remaining > 0 {
        for byte in chunk.iter_mut() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *byte = (state >> 24) as u8;
        }
        let n = remaining.min(chunk.len());
        out.write_all(&chunk[..n]).unwrap();
        remaining -= n;
    }
    out.flush().unwrap();
}

#[test]
fn large_inputs_stream_with_bounded_heap() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("bulk");
    fs::create_dir_all(&tree).unwrap();
    let big = tree.join("blob.bin");
    write_noise(&big, INPUT_SIZE);

    let options = CompressionOptions {
        level: 1,
        password: None,
    };

    let profiler = dhat::Profiler::builder().testing().build();

    let tgz = dir.path().join("bulk.tar.gz");
    omniarc::create(FormatKind::TarGz, &[tree.clone()], &tgz, &options).unwrap();

    let zip = dir.path().join("bulk.zip");
    omniarc::create(FormatKind::Zip, &[tree.clone()], &zip, &options).unwrap();

    let gz = dir.path().join("blob.bin.gz");
    omniarc::create(FormatKind::Gzip, &[big.clone()], &gz, &options).unwrap();

    let out = dir.path().join("out");
    let summary = omniarc::extract(FormatKind::TarGz, &tgz, &out, &options).unwrap();

    let stats = dhat::HeapStats::get();
    drop(profiler);

    assert_eq!(summary.bytes_written, INPUT_SIZE as u64);
    assert_eq!(
        fs::metadata(out.join("bulk/blob.bin")).unwrap().len(),
        INPUT_SIZE as u64
    );
    assert!(
        stats.max_bytes < HEAP_LIMIT,
        "peak heap {} bytes for {} bytes of input",
        stats.max_bytes,
        INPUT_SIZE
    );
}
