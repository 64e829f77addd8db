//! Error types for cache I/O and distribution comparison.
//!
//! Misuse of the recording API (wrong entry kind, stopwatch out of sequence,
//! sampling without a bound) panics instead; these types only cover failures
//! a caller is expected to check and report.

use std::path::PathBuf;

use thiserror::Error;

use crate::stats::StatsKind;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Environmental failures while touching the cache directory.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache path exists but is a file (or something else).
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Could not encode a header or experiment.
    #[error("failed to encode cache entry for '{name}': {source}")]
    Encode {
        /// Experiment name being saved
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value sample is NaN or infinite, which JSON cannot represent.
    #[error("cannot cache experiment '{experiment}': entry '{entry}' holds a non-finite value")]
    NonFiniteSample {
        /// Experiment being saved
        experiment: String,
        /// Entry holding the offending sample
        entry: String,
    },

    /// A cache file exists but its header does not decode.
    #[error("malformed cache header in {}: {source}", path.display())]
    MalformedHeader {
        /// File that failed to decode
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Precondition failures for [`compute_z_score`](crate::compute_z_score).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    /// Value stats compared against duration stats.
    #[error("stats kind mismatch - have {0} and {1} which are not the same")]
    KindMismatch(StatsKind, StatsKind),

    /// At least one side has no samples.
    #[error("at least one set of stats is empty")]
    EmptyDistribution,
}
