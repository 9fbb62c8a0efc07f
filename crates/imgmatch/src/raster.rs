//! Decoding images into a fixed RGBA layout.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, RgbaImage};

use crate::error::CompareError;

/// Every decoded image carries exactly four channels.
pub const CHANNELS: usize = 4;

/// Decoded pixels in RGBA8 layout with non-zero dimensions.
#[derive(Clone, Debug)]
pub struct RawImage {
    pixels: RgbaImage,
}

impl RawImage {
    /// Wrap an RGBA buffer. Returns `None` for a zero-sized image.
    pub fn from_rgba(pixels: RgbaImage) -> Option<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn total_pixels(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Raw bytes, `width * height * CHANNELS` long.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Stretch to exactly `width x height`. Aspect ratio is not preserved.
    pub fn resize_exact(&self, width: u32, height: u32) -> RawImage {
        let pixels = image::imageops::resize(&self.pixels, width, height, FilterType::Lanczos3);
        RawImage { pixels }
    }
}

/// Decode `path` into RGBA8. Sources without alpha get an opaque channel.
///
/// The format is sniffed from the content, so a mislabelled extension still
/// decodes.
pub fn load(path: &Path) -> Result<RawImage, CompareError> {
    let access = |source| CompareError::Access {
        path: path.to_path_buf(),
        source,
    };

    let decoded = ImageReader::open(path)
        .map_err(access)?
        .with_guessed_format()
        .map_err(access)?
        .decode()
        .map_err(|source| CompareError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    RawImage::from_rgba(decoded.to_rgba8()).ok_or_else(|| CompareError::EmptyImage {
        path: path.to_path_buf(),
    })
}

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    pixels.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
