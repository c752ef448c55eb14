//! Error types for cache operations.

use std::path::PathBuf;

use crate::cache::StorageFormat;

/// A reachback specification that could not be turned into a cutoff.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReachbackError {
    /// The text matches neither the absolute nor the relative grammar.
    #[error("malformed reachback {0:?}: expected a date like \"2000-12-31\" or a span like \"3 days, 4 hours\"")]
    Malformed(String),

    /// The text is an absolute date, but not a real calendar date.
    #[error("reachback {0:?} is not a valid date")]
    InvalidDate(String),

    /// Subtracting the span from the current time leaves the calendar.
    #[error("reachback {0:?} reaches outside the supported calendar")]
    OutOfRange(String),
}

/// Failure to encode or decode a cached value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Binary encoding failed.
    #[error("bincode encode failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Binary decoding failed.
    #[error("bincode decode failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// The CSV reader or writer failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// An absent value reached the encoder.
    #[error("absent values are never stored")]
    Absent,
}

/// Errors raised by the result cache.
///
/// Every storage failure is surfaced to the caller. A corrupt or missing
/// file is never treated as a cache miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading, writing or scanning cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A value could not be encoded or decoded.
    #[error("cache codec error at {path}: {source}")]
    Codec {
        /// The cache file involved.
        path: PathBuf,
        /// The underlying codec error.
        source: CodecError,
    },

    /// A cache file's extension does not match the value type being loaded.
    #[error("cache file {path} is not in {expected:?} format")]
    FormatMismatch {
        /// The cache file involved.
        path: PathBuf,
        /// The format the value type is stored in.
        expected: StorageFormat,
    },

    /// The operation name cannot be used in a file name.
    #[error("operation name {0:?} cannot be used in a cache file name")]
    InvalidName(String),

    /// The configured reachback could not be parsed or applied.
    #[error(transparent)]
    Reachback(#[from] ReachbackError),
}

/// Error returned by a cached operation.
#[derive(Debug)]
pub enum CachedCallError<E> {
    /// The cache failed to load, store or locate a result.
    Storage(CacheError),
    /// The operation itself failed. Nothing was cached.
    Operation(E),
}

impl<E> CachedCallError<E> {
    /// Returns true if the cache itself failed.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if the wrapped operation failed.
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Get the operation's own error if present.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Storage(_) => None,
        }
    }
}

impl<E> From<CacheError> for CachedCallError<E> {
    fn from(err: CacheError) -> Self {
        Self::Storage(err)
    }
}

impl<E> From<ReachbackError> for CachedCallError<E> {
    fn from(err: ReachbackError) -> Self {
        Self::Storage(CacheError::Reachback(err))
    }
}

impl<E: std::fmt::Display> std::fmt::Display for CachedCallError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "{}", e),
            Self::Operation(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CachedCallError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::Operation(e) => Some(e),
        }
    }
}
