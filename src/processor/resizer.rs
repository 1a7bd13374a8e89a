use image::imageops::FilterType;
use image::DynamicImage;

use crate::errors::{DecodeError, EncodeError};

/// The largest width or height libjpeg accepts.
pub const MAX_DIMENSION: u32 = 65500;

/// Decodes the raw upload, guessing the format from its content.
pub fn decode(data: &[u8]) -> Result<DynamicImage, DecodeError> {
    Ok(image::load_from_memory(data)?)
}

/// The height matching `width` while keeping the source aspect ratio.
#[inline]
pub fn target_height(src_width: u32, src_height: u32, width: u32) -> u32 {
    let height = (src_height as f64 * width as f64 / src_width.max(1) as f64).round();
    (height as u32).max(1)
}

/// Resizes the image to exactly `width` pixels wide.
///
/// Images narrower than `width` are scaled up. The target size is checked
/// before any buffer is allocated, anything JPEG cannot hold is rejected.
pub fn resize_to_width(img: &DynamicImage, width: u32) -> Result<DynamicImage, EncodeError> {
    let width = width.max(1);
    let height = target_height(img.width(), img.height(), width);

    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(EncodeError::TooLarge { width, height });
    }

    Ok(img.resize_exact(width, height, FilterType::Lanczos3))
}
