use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use super::Comparator;
use crate::error::ExportError;
use crate::raster;

/// Diff overlay of a compared pair. Clones share the same pixels.
#[derive(Clone, Debug)]
pub struct DiffBuffer {
    image: Arc<RgbaImage>,
}

impl DiffBuffer {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn to_png(&self) -> Result<Vec<u8>, ExportError> {
        Ok(raster::encode_png(&self.image)?)
    }

    /// Write the overlay as PNG, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        let png = self.to_png()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            debug!(path = %parent.display(), "creating parent directory");
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, png)?;
        Ok(())
    }
}

impl Comparator {
    /// Write the most recent diff overlay to `path` as PNG.
    ///
    /// Returns `false` when no comparison has produced an overlay yet, or when
    /// encoding or writing fails. Failures are logged, not raised.
    pub fn export_diff(&self, path: &Path) -> bool {
        let Some(diff) = self.last_diff() else {
            debug!(path = %path.display(), "no diff to export");
            return false;
        };
        match diff.save(path) {
            Ok(()) => {
                info!(
                    path = %path.display(),
                    width = diff.width(),
                    height = diff.height(),
                    "diff image saved"
                );
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to save diff image");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::CompareOptions;
    use crate::raster::RawImage;
    use image::Rgba;

    fn solid(w: u32, h: u32, color: Rgba<u8>) -> RawImage {
        RawImage::from_rgba(RgbaImage::from_pixel(w, h, color)).unwrap()
    }

    #[test]
    fn nothing_to_export_before_a_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("diff.png");
        let comparator = Comparator::new(CompareOptions::default());
        assert!(!comparator.export_diff(&out));
        assert!(!out.exists());
    }

    #[test]
    fn export_writes_decodable_png_of_compared_size() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("diff.png");
        let comparator = Comparator::new(CompareOptions::default());
        let a = solid(12, 8, Rgba([200, 200, 200, 255]));
        let b = solid(12, 8, Rgba([0, 0, 0, 255]));
        comparator.compare_raw(&a, b).unwrap();

        assert!(comparator.export_diff(&out));
        let written = image::open(&out).unwrap();
        assert_eq!((written.width(), written.height()), (12, 8));
    }

    #[test]
    fn unwritable_target_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let comparator = Comparator::new(CompareOptions::default());
        let a = solid(4, 4, Rgba([1, 2, 3, 255]));
        comparator.compare_raw(&a, a.clone()).unwrap();

        // A directory cannot be overwritten with a file.
        assert!(!comparator.export_diff(dir.path()));
    }

    #[test]
    fn clones_share_pixels() {
        let buf = DiffBuffer::new(RgbaImage::new(3, 3));
        let copy = buf.clone();
        assert!(std::ptr::eq(buf.as_rgba(), copy.as_rgba()));
    }
}
