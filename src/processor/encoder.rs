use std::any::Any;
use std::panic::catch_unwind;

use bytes::Bytes;
use image::DynamicImage;

use crate::errors::EncodeError;

/// The JPEG quality used when a variant does not set one.
pub const DEFAULT_QUALITY: u8 = 60;

/// Encodes the image as a progressive JPEG with optimised scans.
///
/// libjpeg reports errors by unwinding, which is caught here and
/// returned as `EncodeError::Aborted`.
pub fn encode_jpeg(img: &DynamicImage, quality: Option<u8>) -> Result<Bytes, EncodeError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let quality = quality.unwrap_or(DEFAULT_QUALITY).min(100);

    let result = catch_unwind(|| -> std::io::Result<Vec<u8>> {
        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_scans(true);
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(rgb.as_raw())?;
        comp.finish()
    });

    match result {
        Ok(Ok(data)) => Ok(Bytes::from(data)),
        Ok(Err(e)) => Err(e.into()),
        Err(panic) => Err(EncodeError::Aborted(panic_message(panic))),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown encoder failure".to_string()
    }
}
