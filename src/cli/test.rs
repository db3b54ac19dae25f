use std::path::{Path, PathBuf};

use crate::{
    cli::{CliError, TestArgs, pipeline, read_file, write_file},
    mutator::Mutator,
    registered::RegisteredCompressor,
};

#[derive(Clone, Copy)]
enum Direction {
    Encode,
    Decode,
}

/// Reads `src`, runs one stage over it and writes the result to `dst`. `src` and `dst` may be
/// the same file.
fn transform_file(mut stage: RegisteredCompressor, direction: Direction, src: &Path, dst: &Path) -> Result<usize, CliError> {
    let input = read_file(src)?;
    let mut output = Vec::new();
    match direction {
        Direction::Encode => stage.drive_mutation(&input, &mut output)?,
        Direction::Decode => stage.revert_mutation(&input, &mut output)?,
    }
    write_file(dst, &output)?;
    Ok(output.len())
}

fn file_name(path: &Path) -> Result<String, CliError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "input path has no file name"),
        })
}

/// Writes `{name}.expected.bin` and `{name}.got.bin` into `dir`.
pub(crate) fn save_failed_equality_results_to_file(expected: &[u8], got: &[u8], dir: &Path, name: &str) -> Result<(), CliError> {
    write_file(&dir.join(format!("{}.expected.bin", name)), expected)?;
    write_file(&dir.join(format!("{}.got.bin", name)), got)
}

pub fn test(args: TestArgs) -> Result<(), CliError> {
    let pipeline = pipeline::build_pipeline(args.pipeline.pipeline_selection())?;
    let name = file_name(&args.input)?;
    let enc_path: PathBuf = args.output_dir.join(format!("enc_{}", name));
    let dec_path: PathBuf = args.output_dir.join(format!("dec_{}", name));

    let mut current = args.input.clone();
    for &stage in pipeline.stages() {
        let len = transform_file(stage, Direction::Encode, &current, &enc_path)?;
        eprintln!("{} encoded: {} bytes", stage.name, len);
        current = enc_path.clone();
    }
    if pipeline.is_empty() {
        write_file(&enc_path, &read_file(&current)?)?;
    }

    let mut current = enc_path.clone();
    for &stage in pipeline.stages().iter().rev() {
        let len = transform_file(stage, Direction::Decode, &current, &dec_path)?;
        eprintln!("{} decoded: {} bytes", stage.name, len);
        current = dec_path.clone();
    }
    if pipeline.is_empty() {
        write_file(&dec_path, &read_file(&current)?)?;
    }

    let expected = read_file(&args.input)?;
    let got = read_file(&dec_path)?;
    let encoded_len = read_file(&enc_path)?.len();

    if expected != got {
        save_failed_equality_results_to_file(&expected, &got, &args.output_dir, &name)?;
        eprintln!(
            "======== FAILED {} ========\n\tpipeline: {}\n\toriginal: {} bytes\n\tdecoded: {} bytes\n\tsee {}.expected.bin and {}.got.bin in {}",
            args.input.display(),
            pipeline,
            expected.len(),
            got.len(),
            name,
            name,
            args.output_dir.display()
        );
        return Err(CliError::RoundtripMismatch(args.input));
    }

    eprintln!(
        "======== PASSED {} ========\n\tpipeline: {}\n\toriginal: {} bytes\n\tencoded: {} bytes\n\tdecoded: {} bytes",
        args.input.display(),
        pipeline,
        expected.len(),
        encoded_len,
        got.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PipelineArgs;
    use tempfile::TempDir;
    use std::fs;

    fn run(dir: &TempDir, input: &str, pipeline: PipelineArgs) -> Result<(), CliError> {
        test(TestArgs {
            input: dir.path().join(input),
            output_dir: dir.path().to_path_buf(),
            pipeline,
        })
    }

    #[test]
    fn writes_encoded_and_decoded_files() {
        let dir = TempDir::new().unwrap();
        let data: Vec<u8> = b"to be or not to be, that is the question".repeat(20);
        fs::write(dir.path().join("hamlet.txt"), &data).unwrap();

        run(&dir, "hamlet.txt", PipelineArgs::default()).unwrap();

        let encoded = fs::read(dir.path().join("enc_hamlet.txt")).unwrap();
        assert!(encoded.len() < data.len());
        assert_eq!(fs::read(dir.path().join("dec_hamlet.txt")).unwrap(), data);
        assert!(!dir.path().join("hamlet.txt.expected.bin").exists());
    }

    #[test]
    fn encoded_file_matches_the_in_memory_pipeline() {
        let dir = TempDir::new().unwrap();
        let data = b"AAAAAAAAAA";
        fs::write(dir.path().join("run"), data).unwrap();

        run(&dir, "run", PipelineArgs::default()).unwrap();

        let mut expected = vec![];
        pipeline::build_pipeline(crate::cli::PipelineSelection::Default)
            .unwrap()
            .drive_mutation(data, &mut expected)
            .unwrap();
        assert_eq!(fs::read(dir.path().join("enc_run")).unwrap(), expected);
    }

    #[test]
    fn single_stage_and_empty_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty"), b"").unwrap();

        let huffman_only = PipelineArgs {
            preset: Some("huffman".into()),
            ..PipelineArgs::default()
        };
        run(&dir, "empty", huffman_only).unwrap();
        assert!(fs::read(dir.path().join("enc_empty")).unwrap().is_empty());
        assert!(fs::read(dir.path().join("dec_empty")).unwrap().is_empty());
    }

    #[test]
    fn mismatch_keeps_both_versions() {
        let dir = TempDir::new().unwrap();
        save_failed_equality_results_to_file(b"abc", b"abd", dir.path(), "sample").unwrap();
        assert_eq!(fs::read(dir.path().join("sample.expected.bin")).unwrap(), b"abc");
        assert_eq!(fs::read(dir.path().join("sample.got.bin")).unwrap(), b"abd");
    }
}
