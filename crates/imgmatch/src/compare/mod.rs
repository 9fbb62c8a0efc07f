pub mod diff;
pub mod export;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use self::export::DiffBuffer;
use self::diff::{DifyDiffer, PixelDiff, PixelDiffer};
use crate::error::CompareError;
use crate::raster::{self, RawImage};

/// Pairs whose difference stays below this percentage are visually equal.
pub const DEFAULT_EQUAL_BELOW: f64 = 1.0;

/// Upper bound for decoding and diffing a single pair.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct CompareOptions {
    /// Per-pixel color sensitivity (0.0-1.0) handed to the pixel differ.
    pub threshold: f32,
    /// Count anti-aliased pixels as differences.
    pub include_anti_aliasing: bool,
    /// Difference percentage under which a pair counts as visually equal.
    pub equal_below: f64,
    /// Per-comparison timeout for the async entry points.
    pub timeout: Duration,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            include_anti_aliasing: false,
            equal_below: DEFAULT_EQUAL_BELOW,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Outcome of comparing two images after canonicalization.
#[derive(Clone, Debug, Serialize)]
pub struct ComparisonResult {
    /// `differing_pixels / total_pixels * 100`, rounded to 2 decimals.
    pub difference_percent: f64,
    pub visually_equal: bool,
    pub differing_pixels: u64,
    pub total_pixels: u64,
    /// Dimensions of the compared pair (those of the first image).
    pub width: u32,
    pub height: u32,
    /// The second image was stretched to the first image's dimensions.
    pub resized: bool,
    /// Diff overlay produced by this comparison.
    #[serde(skip)]
    pub diff: Option<DiffBuffer>,
}

impl ComparisonResult {
    /// `100 - difference_percent`, rounded to 2 decimals.
    pub fn similarity(&self) -> f64 {
        round2(100.0 - self.difference_percent)
    }
}

/// Compares image pairs and keeps the most recent diff overlay for export.
///
/// Safe to share between tasks: every result carries its own overlay, and the
/// retained copy is a single mutex-guarded slot where the last writer wins.
pub struct Comparator {
    options: CompareOptions,
    differ: Arc<dyn PixelDiffer>,
    last_diff: Mutex<Option<DiffBuffer>>,
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Self {
        let differ = DifyDiffer {
            threshold: options.threshold,
            include_anti_aliasing: options.include_anti_aliasing,
        };
        Self::with_differ(options, Arc::new(differ))
    }

    /// Use a custom pixel differ. `threshold` and `include_anti_aliasing` in
    /// `options` are then up to the differ to honor.
    pub fn with_differ(options: CompareOptions, differ: Arc<dyn PixelDiffer>) -> Self {
        Self {
            options,
            differ,
            last_diff: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Compare two image files.
    ///
    /// Decoding and diffing run on the blocking pool, bounded by the
    /// configured timeout. `second` is resized to `first`'s dimensions when
    /// they differ.
    pub async fn compare(
        &self,
        first: &Path,
        second: &Path,
    ) -> Result<ComparisonResult, CompareError> {
        self.compare_with_cancel(first, second, &CancellationToken::new())
            .await
    }

    /// Like [`Comparator::compare`], abandoning the pair once `cancel` fires.
    pub async fn compare_with_cancel(
        &self,
        first: &Path,
        second: &Path,
        cancel: &CancellationToken,
    ) -> Result<ComparisonResult, CompareError> {
        let differ = Arc::clone(&self.differ);
        let options = self.options.clone();
        let first = first.to_path_buf();
        let second = second.to_path_buf();

        self.run_blocking(cancel, move || {
            let first = raster::load(&first)?;
            let second = raster::load(&second)?;
            measure(differ.as_ref(), &options, &first, second)
        })
        .await
    }

    /// Compare an already-decoded `first` image with the file at `second`.
    ///
    /// Only `second` is decoded, so one reference can be scored against many
    /// files without decoding it again for each.
    pub async fn compare_decoded(
        &self,
        first: Arc<RawImage>,
        second: &Path,
        cancel: &CancellationToken,
    ) -> Result<ComparisonResult, CompareError> {
        let differ = Arc::clone(&self.differ);
        let options = self.options.clone();
        let second = second.to_path_buf();

        self.run_blocking(cancel, move || {
            let second = raster::load(&second)?;
            measure(differ.as_ref(), &options, &first, second)
        })
        .await
    }

    /// Run `job` on the blocking pool, bounded by the timeout and `cancel`.
    async fn run_blocking<F>(
        &self,
        cancel: &CancellationToken,
        job: F,
    ) -> Result<ComparisonResult, CompareError>
    where
        F: FnOnce() -> Result<ComparisonResult, CompareError> + Send + 'static,
    {
        let timeout = self.options.timeout;
        let task = tokio::task::spawn_blocking(job);

        // A timed-out or cancelled task keeps running on the blocking pool;
        // its result is discarded.
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompareError::Cancelled),
            joined = tokio::time::timeout(timeout, task) => joined,
        };
        let result = match joined {
            Err(_) => Err(CompareError::TimedOut { after: timeout }),
            Ok(Err(e)) => Err(CompareError::Task(e.to_string())),
            Ok(Ok(result)) => result,
        }?;

        self.retain(&result);
        Ok(result)
    }

    /// Compare two already-decoded images on the calling thread.
    pub fn compare_raw(
        &self,
        first: &RawImage,
        second: RawImage,
    ) -> Result<ComparisonResult, CompareError> {
        let result = measure(self.differ.as_ref(), &self.options, first, second)?;
        self.retain(&result);
        Ok(result)
    }

    /// The overlay from the most recent successful comparison.
    pub fn last_diff(&self) -> Option<DiffBuffer> {
        self.slot().clone()
    }

    fn retain(&self, result: &ComparisonResult) {
        *self.slot() = result.diff.clone();
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<DiffBuffer>> {
        // The slot holds plain data; a panic mid-write cannot leave it torn.
        self.last_diff
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Canonicalize, diff and score a pair.
fn measure(
    differ: &dyn PixelDiffer,
    options: &CompareOptions,
    first: &RawImage,
    second: RawImage,
) -> Result<ComparisonResult, CompareError> {
    let (width, height) = first.dimensions();
    let resized = second.dimensions() != (width, height);
    let second = if resized {
        debug!(
            from_w = second.width(),
            from_h = second.height(),
            width,
            height,
            "resizing second image to match first"
        );
        second.resize_exact(width, height)
    } else {
        second
    };

    let PixelDiff {
        differing_pixels,
        diff,
    } = differ.diff(first, &second)?;

    let total_pixels = first.total_pixels();
    let differing_pixels = differing_pixels.min(total_pixels);
    let percent = difference_percent(differing_pixels, total_pixels);
    debug!(
        differ = differ.name(),
        differing_pixels,
        total_pixels,
        percent,
        "compared"
    );

    Ok(ComparisonResult {
        difference_percent: round2(percent),
        visually_equal: percent < options.equal_below,
        differing_pixels,
        total_pixels,
        width,
        height,
        resized,
        diff: Some(DiffBuffer::new(diff)),
    })
}

/// Unrounded share of differing pixels, in percent.
pub fn difference_percent(differing_pixels: u64, total_pixels: u64) -> f64 {
    if total_pixels == 0 {
        return 0.0;
    }
    differing_pixels as f64 / total_pixels as f64 * 100.0
}

/// Round to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
