use std::io;
use thiserror::Error;

/// Error types for RTM decoding and import
#[derive(Error, Debug)]
pub enum RtmError {
    /// I/O error during reading (anything other than end-of-stream)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream starts with the `BMTR` marker: a binarized RTM container
    /// this crate recognizes but does not decode
    #[error("binarized (BMTR) RTM files are not supported")]
    UnsupportedVariant,

    /// The 8-byte signature is neither `RTM_0101` nor a `BMTR` prefix
    #[error("unrecognized file signature '{signature}'")]
    UnrecognizedFormat {
        /// Lossy-decoded signature bytes, for diagnostics
        signature: String,
    },

    /// The byte source ended before a required field was fully read
    #[error("truncated RTM data after {offset} bytes")]
    Truncated {
        /// Number of bytes consumed before the stream ran out
        offset: u64,
    },
}

/// Result type using `RtmError`
pub type Result<T> = std::result::Result<T, RtmError>;
