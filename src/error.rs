//! Error taxonomy for reading, decoding and selecting scope records

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Which part of a framed record was cut short
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSection {
    /// The 4-byte little-endian length prefix
    LengthPrefix,
    /// The payload following the prefix
    Payload,
}

impl fmt::Display for FrameSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSection::LengthPrefix => f.write_str("length prefix"),
            FrameSection::Payload => f.write_str("payload"),
        }
    }
}

/// Errors that can occur while working with scope captures
///
/// Every variant is `Clone` so a stream can hand back the same terminal
/// error on every call after it failed.
#[derive(Error, Debug, Clone)]
pub enum ScopeError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error(
        "truncated stream at record {index} (byte offset {offset}): \
         {section} needs {expected} bytes, found {found}"
    )]
    TruncatedStream {
        index: u64,
        offset: u64,
        section: FrameSection,
        expected: usize,
        found: usize,
    },

    #[error("malformed record {index} at byte offset {offset}: {reason}")]
    MalformedRecord {
        index: u64,
        offset: u64,
        reason: String,
    },

    #[error("I/O error reading record {index} at byte offset {offset}: {source}")]
    Io {
        index: u64,
        offset: u64,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to encode scope record: {reason}")]
    Encode { reason: String },

    #[error("failed to write scope capture: {source}")]
    Write {
        #[source]
        source: Arc<io::Error>,
    },

    #[error("No entries found for scope {tag}")]
    EmptySelection { tag: String },
}

impl ScopeError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScopeError::Open {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Index of the record the error refers to, if it came from a stream
    pub fn record_index(&self) -> Option<u64> {
        match self {
            ScopeError::TruncatedStream { index, .. }
            | ScopeError::MalformedRecord { index, .. }
            | ScopeError::Io { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// True for the stream-level failures (truncation, bad payload, read error)
    pub fn is_stream_error(&self) -> bool {
        self.record_index().is_some()
    }
}

/// Result type for scope capture operations
pub type Result<T> = std::result::Result<T, ScopeError>;
