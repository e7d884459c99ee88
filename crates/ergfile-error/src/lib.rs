//! Unified error type for the ergfile workspace.
//!
//! Environment and metadata failures discovered while opening an archive are
//! `Err(ErgError::…)`; per-query misses (unknown signal name, empty data)
//! are `Option::None` at the call sites and never appear here.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, ErgError>;

/// All fatal conditions an archive can surface.
#[derive(Debug, Error)]
pub enum ErgError {
    /// A file could not be opened or read.
    #[error("failed to open `{path}`: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The binary file could not be memory-mapped.
    #[error("failed to map `{path}`: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The binary file is smaller than its fixed header.
    #[error("`{path}` is {size} bytes, shorter than the {header}-byte header")]
    Truncated {
        path: PathBuf,
        size: u64,
        header: u64,
    },

    /// A metadata key the format requires was not present in the sidecar.
    #[error("required metadata key `{key}` is missing")]
    MissingKey { key: String },

    /// The archive declares a byte order this reader does not support.
    #[error("unsupported byte order `{value}`; only `LittleEndian` archives are readable")]
    UnsupportedByteOrder { value: String },

    /// The declared signals sum to a zero row stride.
    #[error("zero row size across {signals} declared signal(s)")]
    ZeroRowSize { signals: usize },

    /// Plain I/O failure outside open/map (e.g. writing a sidecar back).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant violation that indicates a bug in this library.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErgError {
    /// Shorthand for [`ErgError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        ErgError::Internal(message.into())
    }
}
