use crate::cli::{CliError, EncodeArgs, pipeline, pipeline_config_path, read_file, write_file};
use crate::mutator::Mutator;
use voxell_timer::time_fn;

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub fn encode(args: EncodeArgs) -> Result<(), CliError> {
    let input_path = &args.input;
    let output_path = &args.output;
    let mut pipeline = pipeline::build_pipeline(args.pipeline.pipeline_selection())?;

    let input_data = read_file(input_path)?;
    let mut compressed_data = Vec::new();
    let (res, comp_dur) = time_fn(|| pipeline.drive_mutation(&input_data, &mut compressed_data));
    res?;
    if_tracing! {
        tracing::info!(event = "encode_complete", input = %input_path.display(), output = %output_path.display(), elapsed_us = %comp_dur.as_micros(), original_len = input_data.len(), compressed_len = compressed_data.len(), "encode finished");
    }
    write_file(output_path, &compressed_data)?;

    if args.save_pipeline {
        let config_path = pipeline_config_path(output_path)?;
        write_file(&config_path, &pipeline.to_bytes()?)?;
    }
    Ok(())
}
