//! Common error type for segment processing pipelines

use crate::stream::StreamError;

/// Error from processing a single archive segment (download + parse).
///
/// Wraps a network/HTTP error ([`StreamError`]), a local I/O error, or a
/// malformed-archive error from the record walker.
#[derive(Debug)]
pub enum SegmentError {
    Stream(StreamError),
    Io(std::io::Error),
    Archive(String),
}

impl std::fmt::Display for SegmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
            Self::Archive(msg) => write!(f, "malformed archive: {msg}"),
        }
    }
}

impl std::error::Error for SegmentError {}

impl SegmentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Stream(e) => e.is_retryable(),
            Self::Io(e) => e.kind() != std::io::ErrorKind::StorageFull,
            // A malformed segment stays malformed on re-download
            Self::Archive(_) => false,
        }
    }
}

impl From<StreamError> for SegmentError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl From<std::io::Error> for SegmentError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
