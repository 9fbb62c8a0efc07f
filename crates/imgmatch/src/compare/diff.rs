use std::collections::HashSet;

use image::RgbaImage;

use crate::error::CompareError;
use crate::raster::RawImage;

/// Maximum possible delta in YIQ color space (used by dify internally).
const MAX_YIQ_POSSIBLE_DELTA: f32 = 35215.0;

/// Opacity of unchanged pixels in the diff overlay.
const UNCHANGED_BLEND: f32 = 0.1;

/// Output of a pixel differ over two equal-sized images.
pub struct PixelDiff {
    /// Pixels whose color distance exceeds the threshold.
    pub differing_pixels: u64,
    /// Overlay with the same dimensions as the inputs.
    pub diff: RgbaImage,
}

/// Per-pixel comparison of two images with identical dimensions.
pub trait PixelDiffer: Send + Sync {
    fn name(&self) -> &str;
    fn diff(&self, left: &RawImage, right: &RawImage) -> Result<PixelDiff, CompareError>;
}

/// pixelmatch-style differ: YIQ color distance with optional anti-aliasing
/// detection, implemented by `dify`.
#[derive(Clone, Copy, Debug)]
pub struct DifyDiffer {
    /// Color sensitivity in `0.0..=1.0`. Smaller values flag subtler changes.
    pub threshold: f32,
    /// When false, pixels classified as anti-aliasing are not counted.
    pub include_anti_aliasing: bool,
}

impl Default for DifyDiffer {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            include_anti_aliasing: false,
        }
    }
}

impl PixelDiffer for DifyDiffer {
    fn name(&self) -> &str {
        "dify"
    }

    fn diff(&self, left: &RawImage, right: &RawImage) -> Result<PixelDiff, CompareError> {
        if left.dimensions() != right.dimensions() {
            return Err(CompareError::Diff(format!(
                "dimension mismatch: {}x{} vs {}x{}",
                left.width(),
                left.height(),
                right.width(),
                right.height()
            )));
        }

        // get_results expects a pre-computed threshold:
        // raw_threshold^2 * MAX_YIQ_POSSIBLE_DELTA
        let computed_threshold = MAX_YIQ_POSSIBLE_DELTA * self.threshold * self.threshold;

        let output_base = Some(dify::cli::OutputImageBase::LeftImage);
        let block_out: Option<HashSet<(u32, u32)>> = None;

        // dify takes ownership of both buffers.
        match dify::diff::get_results(
            left.as_rgba().clone(),
            right.as_rgba().clone(),
            computed_threshold,
            !self.include_anti_aliasing,
            Some(UNCHANGED_BLEND),
            &output_base,
            &block_out,
        ) {
            Some((diff_count, diff)) => Ok(PixelDiff {
                differing_pixels: diff_count.max(0) as u64,
                diff,
            }),
            // None means no pixel crossed the threshold; dify renders
            // nothing, so the overlay is the output base as-is.
            None => Ok(PixelDiff {
                differing_pixels: 0,
                diff: left.as_rgba().clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, color: Rgba<u8>) -> RawImage {
        RawImage::from_rgba(RgbaImage::from_pixel(w, h, color)).unwrap()
    }

    /// Paint `n` pixels red on a grid with a 3px pitch so no two touch.
    fn with_isolated_diffs(src: &RawImage, n: u32) -> RawImage {
        let mut img = src.as_rgba().clone();
        let (w, h) = img.dimensions();
        let per_row = w.div_ceil(3);
        for i in 0..n {
            let x = (i % per_row) * 3;
            let y = (i / per_row) * 3;
            assert!(y < h, "too many diffs for a {w}x{h} image");
            img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
        }
        RawImage::from_rgba(img).unwrap()
    }

    #[test]
    fn identical_images_have_no_diff() {
        let a = solid(20, 20, Rgba([200, 200, 200, 255]));
        let d = DifyDiffer::default().diff(&a, &a.clone()).unwrap();
        assert_eq!(d.differing_pixels, 0);
        assert_eq!(d.diff.dimensions(), (20, 20));
    }

    #[test]
    fn isolated_pixels_are_counted() {
        let a = solid(30, 30, Rgba([200, 200, 200, 255]));
        let b = with_isolated_diffs(&a, 25);
        let d = DifyDiffer::default().diff(&a, &b).unwrap();
        assert_eq!(d.differing_pixels, 25);
        assert_eq!(d.diff.dimensions(), (30, 30));
    }

    #[test]
    fn sub_threshold_nudge_is_ignored() {
        let a = solid(10, 10, Rgba([128, 128, 128, 255]));
        let mut img = a.as_rgba().clone();
        img.put_pixel(0, 0, Rgba([129, 128, 128, 255]));
        let b = RawImage::from_rgba(img).unwrap();
        assert_eq!(DifyDiffer::default().diff(&a, &b).unwrap().differing_pixels, 0);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let a = solid(10, 10, Rgba([0, 0, 0, 255]));
        let b = solid(10, 11, Rgba([0, 0, 0, 255]));
        let err = DifyDiffer::default().diff(&a, &b).err().unwrap();
        assert!(err.to_string().contains("10x10 vs 10x11"));
    }

    #[test]
    fn unchanged_pair_overlay_is_the_left_image() {
        let mut img = RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 255]));
        img.put_pixel(2, 1, Rgba([90, 80, 70, 255]));
        let a = RawImage::from_rgba(img).unwrap();
        let d = DifyDiffer::default().diff(&a, &a.clone()).unwrap();
        assert_eq!(d.differing_pixels, 0);
        assert_eq!(&d.diff, a.as_rgba());
    }
}
