use crate::{
    algorithms::pipeline::{CompressionPipeline, PRESETS, PipelineError, default_pipeline, get_preset},
    cli::{CliError, PipelineCommand, PipelineSelection, read_file, write_file},
    registered::ALL_COMPRESSORS,
};

pub fn build_pipeline(selection: PipelineSelection) -> Result<CompressionPipeline, CliError> {
    let pipeline = match selection {
        PipelineSelection::Inline(string) => CompressionPipeline::parse(&string)?,
        PipelineSelection::FromFile(path) => {
            let data = read_file(&path)?;
            CompressionPipeline::try_from_bytes(&data)?
        }
        PipelineSelection::Preset(preset_name) => match get_preset(&preset_name) {
            Some(make) => make(),
            None => return Err(PipelineError::UnknownPreset(preset_name).into()),
        },
        PipelineSelection::Default => default_pipeline(),
    };

    if_tracing! {
        tracing::debug!(pipeline = %pipeline, "pipeline selected");
    }
    Ok(pipeline)
}

pub fn pipeline(args: PipelineCommand) -> Result<(), CliError> {
    match args {
        PipelineCommand::ListCompressors { detailed } => {
            for algo in ALL_COMPRESSORS {
                if detailed && let Some(desc) = algo.short_description {
                    println!("Name: {}", algo.name);
                    if !algo.aliases.is_empty() {
                        println!("Aliases: {}", algo.aliases.join(", "));
                    }
                    println!("Description: {}\n", desc);
                } else {
                    println!("{}", algo.name);
                }
            }
        }
        PipelineCommand::ListPresets => {
            for (name, make) in PRESETS {
                println!("{}: {}", name, make());
            }
        }
        PipelineCommand::SaveToFile { pipeline, output_path } => {
            let pipeline = CompressionPipeline::parse(&pipeline)?;
            write_file(&output_path, &pipeline.to_bytes()?)?;
            if_tracing! {
                tracing::info!(pipeline = %pipeline, path = %output_path.display(), "pipeline saved");
            }
        }
    }
    Ok(())
}
