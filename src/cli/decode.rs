use crate::cli::{CliError, DecodeArgs, pipeline, read_file, write_file};
use crate::mutator::Mutator;
use voxell_timer::time_fn;

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub fn decode(args: DecodeArgs) -> Result<(), CliError> {
    let input_path = &args.input;
    let output_path = &args.output;
    let mut pipeline = pipeline::build_pipeline(args.pipeline.pipeline_selection())?;

    let compressed_data = read_file(input_path)?;
    let mut decompressed_data = Vec::new();
    let (res, decomp_dur) = time_fn(|| pipeline.revert_mutation(&compressed_data, &mut decompressed_data));
    if let Err(err) = res {
        if_tracing! {
            tracing::error!(event = "decode_failed", input = %input_path.display(), error = %err, "decode failed");
        }
        return Err(err.into());
    }
    if_tracing! {
        tracing::info!(event = "decode_complete", input = %input_path.display(), output = %output_path.display(), elapsed_us = %decomp_dur.as_micros(), decompressed_len = decompressed_data.len(), "decode finished");
    }
    write_file(output_path, &decompressed_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PipelineArgs;
    use tempfile::TempDir;
    use crate::error::DecompressionError;
    use std::fs;

    #[test]
    fn corrupt_input_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.lzh"), [0u8, 1, b'a']).unwrap();

        let err = decode(DecodeArgs {
            input: dir.path().join("bad.lzh"),
            output: dir.path().join("bad.out"),
            pipeline: PipelineArgs::default(),
        })
        .unwrap_err();
        match err {
            CliError::Codec(inner) => assert!(inner.downcast_ref::<DecompressionError>().is_some()),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!dir.path().join("bad.out").exists());
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = decode(DecodeArgs {
            input: dir.path().join("nothing-here"),
            output: dir.path().join("out"),
            pipeline: PipelineArgs::default(),
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
