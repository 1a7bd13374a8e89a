/// The crc32 checksum of an uploaded file.
#[inline]
pub fn crc_hash(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::default();
    hasher.update(data);
    hasher.finalize()
}

/// A PNG encoded gradient of the given size.
#[cfg(test)]
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    use std::io::Cursor;

    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });

    let mut buff = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buff, image::ImageFormat::Png)
        .expect("encode sample image");
    buff.into_inner()
}
