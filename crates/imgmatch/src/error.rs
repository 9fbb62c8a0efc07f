use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single image comparison.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("cannot access {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{} has no pixels", path.display())]
    EmptyImage { path: PathBuf },

    #[error("diff failed: {0}")]
    Diff(String),

    #[error("comparison timed out after {}s", after.as_secs())]
    TimedOut { after: Duration },

    #[error("comparison cancelled")]
    Cancelled,

    #[error("comparison task failed: {0}")]
    Task(String),
}

/// Scan-level failure of a similarity search.
///
/// Individual candidates that fail to compare are dropped from the ranking and
/// never surface here.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cannot access query image {}: {source}", path.display())]
    QueryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot use query image {}: {source}", path.display())]
    QueryDecode {
        path: PathBuf,
        #[source]
        source: CompareError,
    },

    #[error("cannot read corpus directory {}: {source}", dir.display())]
    CorpusRead {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no images found in {}", dir.display())]
    EmptyCorpus { dir: PathBuf },

    #[error("could not compare any of the {attempted} image(s) in {}", dir.display())]
    AllComparisonsFailed { dir: PathBuf, attempted: usize },

    #[error("search cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode diff image: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot access {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to decode image buffer: {0}")]
    DecodeBuffer(#[source] image::ImageError),

    #[error("refusing to overwrite the input {} with its conversion", path.display())]
    SameFile { path: PathBuf },

    #[error("failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),
}
