use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::PreprocessError;
use crate::inference::preprocess::load_image;

/// Scales `(width, height)` so the longer side equals `max_size`.
///
/// Small images are scaled up as well. The shorter side is truncated and
/// never drops below one pixel.
pub fn fit_within(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let (width, height) = (width.max(1) as u64, height.max(1) as u64);
    let max = max_size as u64;
    let (new_width, new_height) = if width > height {
        (max, height * max / width)
    } else {
        (width * max / height, max)
    };
    (new_width.max(1) as u32, new_height.max(1) as u32)
}

/// Decodes `image_path` and resizes it for display, keeping the aspect ratio.
///
/// Accepts the same inputs as the preprocessor, so anything previewed can
/// also be classified.
pub fn render_preview(image_path: &Path, max_size: u32) -> Result<DynamicImage, PreprocessError> {
    let image = load_image(image_path)?;
    let (width, height) = fit_within(image.width(), image.height(), max_size);
    Ok(image.resize_exact(width, height, FilterType::Lanczos3))
}
