//! cli component of lzhuff.
//!
//! `$exename` stands for the executable name. `<description>` denotes a required argument, while
//! `[description]` denotes an optional argument.
//!
//! # Pipeline selection
//!
//! every command that runs a pipeline accepts the same three options, checked in this order:
//!
//! > `--using "lz77 -> huffman"` passes the pipeline inline, in encoding order.
//! > `--from-file pipeline.json` reads a pipeline saved with `pipeline save-to-file` or `enc --save-pipeline`.
//! > `--preset <preset id>` uses one of the built-in pipelines (`default`, `lz77`, `huffman`).
//!
//! with none of them, the default pipeline (lz77 followed by huffman) is used. the pipeline is
//! not stored in the compressed file, so the decoder must be given the same selection.
//!
//! # Commands
//!
//! > `$exename enc <input> <output> [selection] [--save-pipeline]`
//!
//! compresses a file. `--save-pipeline` also writes `{output stem}.pipeline.json` next to the output.
//!
//! > `$exename dec <input> <output> [selection]`
//!
//! > `$exename test <input> <output dir> [selection]`
//!
//! runs every stage file-to-file: the encoded file is written to `enc_{name}` and the decoded file
//! to `dec_{name}` inside the output directory, then the decoded file is compared with the input.
//!
//! > `$exename corpus [dir]`
//!
//! reports the size of every file under `dir` after lz77 alone, huffman alone, and both.
//!
//! > `$exename pipeline list-compressors [--detailed]`
//! > `$exename pipeline list-presets`
//! > `$exename pipeline save-to-file <pipeline string> <output path>`
//!
//! log output is controlled through the `RUST_LOG` environment variable.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::algorithms::pipeline::PipelineError;

pub mod corpus;
pub mod decode;
pub mod encode;
pub mod pipeline;
pub mod test;

/// Error types for CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("could not walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Codec(#[from] anyhow::Error),

    #[error("roundtrip mismatch for {}", .0.display())]
    RoundtripMismatch(PathBuf),

    #[error("{0} file(s) failed the corpus run")]
    CorpusFailures(usize),
}

type Result<T> = std::result::Result<T, CliError>;

/// CLI arguments for the lzhuff application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Supported commands for lzhuff
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode (compress) a file
    #[command(alias = "enc")]
    Encode(EncodeArgs),

    /// Decode (decompress) a file
    #[command(alias = "dec")]
    Decode(DecodeArgs),

    /// Run every stage file-to-file and check the roundtrip
    Test(TestArgs),

    /// Report compressed sizes for every file in a directory
    Corpus(CorpusArgs),

    /// Pipeline management commands
    #[command(subcommand)]
    Pipeline(PipelineCommand),
}

/// Which pipeline to run. See the module documentation for the precedence.
#[derive(Args, Debug, Default, Clone)]
pub struct PipelineArgs {
    /// Specify pipeline as a string (e.g. "lz77 -> huffman")
    #[arg(long)]
    pub using: Option<String>,

    /// Load pipeline from a JSON file
    #[arg(long)]
    pub from_file: Option<PathBuf>,

    /// Use a predefined pipeline preset
    #[arg(long)]
    pub preset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineSelection {
    Inline(String),
    FromFile(PathBuf),
    Preset(String),
    Default,
}

impl PipelineArgs {
    pub fn pipeline_selection(&self) -> PipelineSelection {
        if let Some(ref using) = self.using {
            PipelineSelection::Inline(using.clone())
        } else if let Some(ref path) = self.from_file {
            PipelineSelection::FromFile(path.clone())
        } else if let Some(ref preset) = self.preset {
            PipelineSelection::Preset(preset.clone())
        } else {
            PipelineSelection::Default
        }
    }
}

/// Arguments specific to the encode command
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Path to the input file
    pub input: PathBuf,

    /// Path for the output file
    pub output: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Also write the pipeline to `{output stem}.pipeline.json`
    #[arg(long)]
    pub save_pipeline: bool,
}

/// Arguments specific to the decode command
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Path to the input file
    pub input: PathBuf,

    /// Path for the output file
    pub output: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Arguments specific to the test command
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Path to the original file
    pub input: PathBuf,

    /// Directory for the encoded and decoded files
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Arguments specific to the corpus command
#[derive(Args, Debug)]
pub struct CorpusArgs {
    /// Directory to walk
    #[arg(default_value = "./test_data")]
    pub input_dir: PathBuf,
}

/// Pipeline management subcommands
#[derive(Subcommand, Debug)]
pub enum PipelineCommand {
    /// List available compression algorithms
    ListCompressors {
        /// Show detailed information about each compressor
        #[arg(long)]
        detailed: bool,
    },

    /// List the built-in pipeline presets
    ListPresets,

    /// Save a pipeline configuration to a file
    SaveToFile {
        /// Pipeline string (e.g. "lz77 -> huffman")
        pipeline: String,

        /// Output file path
        output_path: PathBuf,
    },
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `{output stem}.pipeline.json` next to `base_path`.
pub(crate) fn pipeline_config_path(base_path: &Path) -> Result<PathBuf> {
    let stem = base_path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| CliError::Io {
        path: base_path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"),
    })?;
    Ok(base_path.with_file_name(format!("{}.pipeline.json", stem)))
}
