//! Re-encode images as JPEG.

use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use tracing::info;

use crate::error::ConvertError;

pub const DEFAULT_QUALITY: u8 = 80;

/// Where [`convert_to_jpeg`] writes when no output is given: next to the
/// input, with a `.jpg` extension.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("jpg")
}

/// Convert `input` to a JPEG file at `output` (or [`default_output`]).
///
/// Returns the path written. Transparency is flattened away. Fails with
/// [`ConvertError::SameFile`] rather than overwrite `input` itself, which is
/// what the default output would do for an input that is already `.jpg`.
pub fn convert_to_jpeg(
    input: &Path,
    output: Option<&Path>,
    quality: u8,
) -> Result<PathBuf, ConvertError> {
    let jpeg = jpeg_bytes(input, quality)?;
    let output = output.map_or_else(|| default_output(input), Path::to_path_buf);
    if same_file(input, &output) {
        return Err(ConvertError::SameFile { path: output });
    }

    write_output(&output, &jpeg)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        quality,
        bytes = jpeg.len(),
        "converted to jpeg"
    );
    Ok(output)
}

/// Encode `input` as JPEG in memory.
pub fn jpeg_bytes(input: &Path, quality: u8) -> Result<Vec<u8>, ConvertError> {
    check_quality(quality)?;

    let access = |source| ConvertError::Access {
        path: input.to_path_buf(),
        source,
    };
    let decoded = ImageReader::open(input)
        .map_err(access)?
        .with_guessed_format()
        .map_err(access)?
        .decode()
        .map_err(|source| ConvertError::Decode {
            path: input.to_path_buf(),
            source,
        })?;

    encode(&decoded, quality)
}

/// Convert an encoded image held in memory (PNG, GIF, ...) to a JPEG file.
pub fn convert_bytes_to_jpeg(
    bytes: &[u8],
    output: &Path,
    quality: u8,
) -> Result<(), ConvertError> {
    check_quality(quality)?;
    let decoded = image::load_from_memory(bytes).map_err(ConvertError::DecodeBuffer)?;
    let jpeg = encode(&decoded, quality)?;

    write_output(output, &jpeg)?;
    info!(
        output = %output.display(),
        quality,
        input_bytes = bytes.len(),
        bytes = jpeg.len(),
        "converted buffer to jpeg"
    );
    Ok(())
}

fn check_quality(quality: u8) -> Result<(), ConvertError> {
    if !(1..=100).contains(&quality) {
        return Err(ConvertError::InvalidQuality(quality));
    }
    Ok(())
}

fn encode(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ConvertError> {
    let mut buf = Vec::new();
    image
        .to_rgb8()
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .map_err(ConvertError::Encode)?;
    Ok(buf)
}

fn write_output(output: &Path, jpeg: &[u8]) -> Result<(), ConvertError> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, jpeg)?;
    Ok(())
}

/// Both paths name the same file, either literally or once resolved.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
