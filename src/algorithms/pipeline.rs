use core::{fmt, mem};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxell_timer::time_fn;

use crate::{
    algorithms::{huffman, lz77},
    mutator::{Mutator, Result},
    registered::{RegisteredCompressor, get_specific_compressor_from_name},
};

if_tracing! {
    use tracing::{Level, span};
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown algorithm {0:?}")]
    UnknownAlgorithm(String),

    #[error("unknown preset {0:?}")]
    UnknownPreset(String),

    #[error("invalid pipeline format: {0}")]
    Format(String),

    #[error("pipeline file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializable description of a pipeline, stored as json.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Names of algorithms in the pipeline, in encoding order.
    pub algorithms: Vec<String>,

    /// Version of the program that wrote the file.
    #[serde(default)]
    pub version: String,
}

/// An ordered chain of stages. Encoding runs them first to last, decoding last to first.
#[derive(Debug, Clone, Default)]
pub struct CompressionPipeline {
    pipeline: Vec<RegisteredCompressor>,
}

impl CompressionPipeline {
    pub const fn new() -> Self {
        Self { pipeline: vec![] }
    }

    pub fn push_algorithm(&mut self, algorithm: RegisteredCompressor) {
        self.pipeline.push(algorithm);
    }

    /// Chain this method to add multiple algorithms in a shorter way.
    pub fn with_algorithm(mut self, algorithm: RegisteredCompressor) -> Self {
        self.pipeline.push(algorithm);
        self
    }

    pub fn len(&self) -> usize {
        self.pipeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipeline.is_empty()
    }

    /// The stages in encoding order.
    pub fn stages(&self) -> &[RegisteredCompressor] {
        &self.pipeline
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pipeline.iter().map(|algo| algo.name)
    }

    /// Parses a pipeline string of the form `"lz77 -> huffman"`.
    pub fn parse(pipeline_str: &str) -> Result<Self, PipelineError> {
        let parts: Vec<&str> = pipeline_str.split("->").map(|s| s.trim()).collect();
        if parts.iter().all(|s| s.is_empty()) {
            return Err(PipelineError::Format("empty pipeline string".to_string()));
        }
        if parts.iter().any(|s| s.is_empty()) {
            return Err(PipelineError::Format(format!("missing algorithm name in {:?}", pipeline_str)));
        }
        Self::from_names(parts)
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, PipelineError> {
        let mut pipeline = CompressionPipeline::new();
        for name in names {
            match get_specific_compressor_from_name(name) {
                Some(comp) => pipeline.push_algorithm(comp),
                None => {
                    if_tracing! {{
                        tracing::error!(event = "unknown_algorithm", algorithm = %name, "unknown algorithm in pipeline");
                    }}
                    return Err(PipelineError::UnknownAlgorithm(name.to_string()));
                }
            }
        }
        Ok(pipeline)
    }

    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            algorithms: self.names().map(str::to_string).collect(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        if config.algorithms.is_empty() {
            return Err(PipelineError::Format("pipeline file lists no algorithms".to_string()));
        }
        Self::from_names(config.algorithms.iter().map(String::as_str))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(serde_json::to_vec_pretty(&self.to_config())?)
    }

    pub fn try_from_bytes(data: &[u8]) -> Result<Self, PipelineError> {
        let config: PipelineConfig = serde_json::from_slice(data)?;
        Self::from_config(&config)
    }
}

impl fmt::Display for CompressionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pipeline.is_empty() {
            return f.write_str("(empty pipeline)");
        }
        for (i, algo) in self.pipeline.iter().enumerate() {
            if i != 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(algo.name)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Drive,
    Revert,
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn run_stage(algo: &mut RegisteredCompressor, stage: usize, direction: Direction, data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    let (res, elapsed) = time_fn(|| match direction {
        Direction::Drive => algo.drive_mutation(data, buf),
        Direction::Revert => algo.revert_mutation(data, buf),
    });
    if_tracing! {
        match res {
            Ok(()) => tracing::info!(stage, name = algo.name, elapsed_us = %elapsed.as_micros(), out_len = buf.len(), "stage complete"),
            Err(ref e) => tracing::error!(stage, name = algo.name, error = %e, "stage failed"),
        }
    }
    res
}

impl Mutator for CompressionPipeline {
    fn drive_mutation(&mut self, data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
        if_tracing! {
            let pipeline_span = span!(Level::INFO, "compression_pipeline", stages = self.pipeline.len());
            let _enter = pipeline_span.enter();
        }
        match self.len() {
            0 => {
                buf.clear();
                buf.extend_from_slice(data);
                Ok(())
            }
            1 => run_stage(&mut self.pipeline[0], 0, Direction::Drive, data, buf),
            n => {
                let mut intermediate: Vec<u8> = vec![];
                // first algorithm compresses from data to buf
                run_stage(&mut self.pipeline[0], 0, Direction::Drive, data, buf)?;

                {
                    let mut ref1 = &mut *buf;
                    let mut ref2 = &mut intermediate;

                    for (stage, algo) in self.pipeline.iter_mut().enumerate().skip(1) {
                        run_stage(algo, stage, Direction::Drive, ref1, ref2)?;
                        mem::swap(&mut ref1, &mut ref2);
                    }
                }

                // write intermediate into buf if it was not the last buffer to get written
                if n % 2 == 0 {
                    mem::swap(buf, &mut intermediate);
                }

                Ok(())
            }
        }
    }

    fn revert_mutation(&mut self, data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
        if_tracing! {
            let pipeline_span = span!(Level::INFO, "decompression_pipeline", stages = self.pipeline.len());
            let _enter = pipeline_span.enter();
        }

        match self.len() {
            0 => {
                buf.clear();
                buf.extend_from_slice(data);
                Ok(())
            }
            1 => run_stage(&mut self.pipeline[0], 0, Direction::Revert, data, buf),
            n => {
                let mut intermediate: Vec<u8> = vec![];

                // last algorithm decompresses from data to buf
                run_stage(&mut self.pipeline[n - 1], n - 1, Direction::Revert, data, buf)?;

                {
                    let mut ref1 = &mut *buf;
                    let mut ref2 = &mut intermediate;

                    for (stage, algo) in self.pipeline.iter_mut().enumerate().rev().skip(1) {
                        run_stage(algo, stage, Direction::Revert, ref1, ref2)?;
                        mem::swap(&mut ref1, &mut ref2);
                    }
                }

                if n % 2 == 0 {
                    mem::swap(buf, &mut intermediate);
                }

                Ok(())
            }
        }
    }
}

/// LZ77 followed by huffman coding of the tuple stream.
pub fn default_pipeline() -> CompressionPipeline {
    CompressionPipeline::new()
        .with_algorithm(lz77::Lz77)
        .with_algorithm(huffman::HuffmanCoding)
}

fn lz77_only() -> CompressionPipeline {
    CompressionPipeline::new().with_algorithm(lz77::Lz77)
}

fn huffman_only() -> CompressionPipeline {
    CompressionPipeline::new().with_algorithm(huffman::HuffmanCoding)
}

#[rustfmt::skip]
pub static PRESETS: &[(&str, fn() -> CompressionPipeline)] = &[
    ("default", default_pipeline),
    ("lz77", lz77_only),
    ("huffman", huffman_only),
];

pub fn get_preset(name: &str) -> Option<fn() -> CompressionPipeline> {
    PRESETS.iter().find(|(preset, _)| *preset == name).map(|&(_, make)| make)
}
