use thiserror::Error;

/// Represents an error emitted by a decoder while reverting a stage.
///
/// Stages return these wrapped in an [`anyhow::Error`], so callers that care about the exact
/// failure can `downcast_ref::<DecompressionError>()` the result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompressionError {
    /// The input ended before a complete header could be read.
    #[error("input ended inside the {0} header")]
    TruncatedHeader(&'static str),

    /// The header was present but described something no encoder produces.
    #[error("malformed header: {0}")]
    InvalidHeader(String),

    /// The payload could not be resolved against the header.
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// The payload decoded cleanly but to a different number of bytes than the header promised.
    #[error("decoded {actual} bytes, header promised {expected}")]
    LengthMismatch { expected: u64, actual: u64 },
}

/// Represents an input that an encoder cannot describe in its container format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A symbol occurs more often than the frequency field can hold.
    #[error("byte {byte:#04x} occurs {count} times, more than a frequency field can hold")]
    FrequencyOverflow { byte: u8, count: u64 },
}
