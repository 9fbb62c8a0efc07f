use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{parse_equal_below, parse_parallel, parse_threshold};

/// Pixel comparison settings.
///
/// Fields are `Option`: `None` means "use default".
/// Serves both TOML deserialization (`[diff]`) and CLI argument parsing.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Per-pixel color sensitivity (0.0-1.0). Lower flags subtler changes.
    #[arg(long, value_parser = parse_threshold)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Count anti-aliased pixels as differences
    #[arg(
        long = "include-aa",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_anti_aliasing: Option<bool>,

    /// Difference percentage below which two images are visually equal
    #[arg(long, value_parser = parse_equal_below)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal_below: Option<f64>,
}

impl DiffConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &DiffConfig) {
        if other.threshold.is_some() {
            self.threshold = other.threshold;
        }
        if other.include_anti_aliasing.is_some() {
            self.include_anti_aliasing = other.include_anti_aliasing;
        }
        if other.equal_below.is_some() {
            self.equal_below = other.equal_below;
        }
    }
}

/// Corpus scan settings.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Directory of candidate images
    #[arg(long, short = 'c')]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus: Option<PathBuf>,

    /// Number of comparisons to run concurrently
    #[arg(long, short = 'p', value_parser = parse_parallel)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,

    /// Give up on a single comparison after this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl SearchConfig {
    pub fn merge(&mut self, other: &SearchConfig) {
        if other.corpus.is_some() {
            self.corpus = other.corpus.clone();
        }
        if other.parallel.is_some() {
            self.parallel = other.parallel;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }
}
