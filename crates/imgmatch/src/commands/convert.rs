use std::path::Path;

use anyhow::{Context, Result};

/// `imgmatch convert`: re-encode an image as JPEG.
pub fn convert(input: &Path, output: Option<&Path>, quality: u8) -> Result<()> {
    let written = imgmatch::convert::convert_to_jpeg(input, output, quality)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    println!("Wrote {}", written.display());
    Ok(())
}
