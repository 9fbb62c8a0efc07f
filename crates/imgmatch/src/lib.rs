//! Perceptual image comparison and similarity search.
//!
//! [`Comparator`] compares two images with a pixelmatch-style diff and reports
//! the share of differing pixels. [`SimilaritySearch`] runs the comparator over
//! every image in a directory and ranks the candidates against a query.

pub mod compare;
pub mod convert;
pub mod error;
pub mod raster;
pub mod search;

pub use self::compare::diff::{DifyDiffer, PixelDiff, PixelDiffer};
pub use self::compare::{CompareOptions, Comparator, ComparisonResult, DiffBuffer};
pub use self::error::{CompareError, ConvertError, ExportError, SearchError};
pub use self::raster::RawImage;
pub use self::search::{
    Candidate, SearchOptions, SearchResult, SimilaritySearch, ThresholdMatches, TopMatches,
};
