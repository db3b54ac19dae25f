use std::{path::Path, time::Duration};

use anyhow::Result;
use voxell_timer::time_fn;
use walkdir::WalkDir;

use crate::{
    algorithms::pipeline::{CompressionPipeline, default_pipeline, get_preset},
    cli::{CliError, CorpusArgs, read_file, test::save_failed_equality_results_to_file},
    mutator::Mutator,
};

/// Sizes and timings for one file of the corpus.
#[derive(Debug)]
struct FileReport {
    original: usize,
    lz77: usize,
    huffman: usize,
    combined: usize,
    encode_time: Duration,
    decode_time: Duration,
}

fn encoded_len(mut pipeline: CompressionPipeline, data: &[u8]) -> Result<usize> {
    let mut buf = Vec::new();
    pipeline.drive_mutation(data, &mut buf)?;
    Ok(buf.len())
}

fn preset_len(preset: &str, data: &[u8]) -> Result<usize> {
    let make = get_preset(preset).ok_or_else(|| anyhow::anyhow!("missing preset {:?}", preset))?;
    encoded_len(make(), data)
}

/// Runs every stage combination over `input`. Returns the decoded bytes of the full pipeline
/// alongside the report.
fn measure(input: &[u8]) -> Result<(FileReport, Vec<u8>)> {
    let mut pipeline = default_pipeline();

    let mut compressed = Vec::new();
    let (res, encode_time) = time_fn(|| pipeline.drive_mutation(input, &mut compressed));
    res?;

    let mut decompressed = Vec::new();
    let (res, decode_time) = time_fn(|| pipeline.revert_mutation(&compressed, &mut decompressed));
    res?;

    let report = FileReport {
        original: input.len(),
        lz77: preset_len("lz77", input)?,
        huffman: preset_len("huffman", input)?,
        combined: compressed.len(),
        encode_time,
        decode_time,
    };
    Ok((report, decompressed))
}

fn percent(size: usize, original: usize) -> f64 {
    if original == 0 {
        100.0
    } else {
        size as f64 / original as f64 * 100.0
    }
}

fn print_report(path: &Path, passed: bool, report: &FileReport) {
    let FileReport {
        original,
        lz77,
        huffman,
        combined,
        encode_time,
        decode_time,
    } = *report;
    eprintln!(
        "======== {} {} ========\n\t{:.0?} encode\n\t{:.0?} decode\n\toriginal: {} bytes\n\tlz77: {} bytes ({:.1}%)\n\thuffman: {} bytes ({:.1}%)\n\tlz77 + huffman: {} bytes ({:.1}%)\n\tsaved: {:+} bytes",
        if passed { "PASSED" } else { "FAILED" },
        path.display(),
        encode_time,
        decode_time,
        original,
        lz77,
        percent(lz77, original),
        huffman,
        percent(huffman, original),
        combined,
        percent(combined, original),
        original as isize - combined as isize,
    );
}

/// Processes one file. `Ok(false)` means it was measured but did not survive the roundtrip.
fn corpus_file(path: &Path) -> Result<bool, CliError> {
    let input = read_file(path)?;
    let (report, decompressed) = measure(&input)?;
    let passed = input == decompressed;
    print_report(path, passed, &report);

    if !passed {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let dir = path.parent().unwrap_or(Path::new("."));
        save_failed_equality_results_to_file(&input, &decompressed, dir, &name)?;
    }
    Ok(passed)
}

pub fn corpus(args: CorpusArgs) -> Result<(), CliError> {
    let mut files = 0usize;
    let mut failures = 0usize;

    for entry in WalkDir::new(&args.input_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        files += 1;

        match corpus_file(path) {
            Ok(true) => {}
            Ok(false) => failures += 1,
            Err(err) => {
                if_tracing! {
                    tracing::error!(path = %path.display(), error = %err, "corpus file failed");
                }
                eprintln!("======== FAILED {} ========\n\terror: {}", path.display(), err);
                failures += 1;
            }
        }
    }

    if_tracing! {
        tracing::info!(files, failures, dir = %args.input_dir.display(), "corpus run complete");
    }
    eprintln!("{} file(s) processed, {} failed", files, failures);
    if failures > 0 {
        return Err(CliError::CorpusFailures(failures));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use std::fs;

    #[test]
    fn reports_every_stage() {
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabcabc".repeat(10);
        let (report, decompressed) = measure(&data).unwrap();
        assert_eq!(decompressed, data);
        assert_eq!(report.original, data.len());
        assert!(report.lz77 < report.original);
        assert!(report.combined > 0);
        assert_eq!(report.lz77 % 3, 0);
    }

    #[test]
    fn walks_nested_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.txt"), b"hello hello hello").unwrap();
        fs::write(dir.path().join("nested").join("b.bin"), (0..=255u8).collect::<Vec<_>>()).unwrap();
        fs::write(dir.path().join("empty"), b"").unwrap();

        corpus(CorpusArgs { input_dir: dir.path().to_path_buf() }).unwrap();
        assert!(!dir.path().join("a.txt.expected.bin").exists());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            corpus(CorpusArgs { input_dir: dir.path().join("nope") }),
            Err(CliError::Walk(_))
        ));
    }

    #[test]
    fn empty_file_percentages() {
        assert_eq!(percent(0, 0), 100.0);
        assert_eq!(percent(50, 200), 25.0);
    }
}
