use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use tokio::sync::oneshot;

use crate::errors::{DecodeError, EncodeError};

pub mod encoder;
pub mod resizer;

/// Turns the decoded source into the encoded bytes of one variant.
#[async_trait]
pub trait VariantEncoder: Sync + Send + 'static {
    async fn encode(
        &self,
        source: Arc<DynamicImage>,
        width: u32,
        quality: Option<u8>,
    ) -> Result<Bytes, EncodeError>;
}

/// Resizes to width and encodes as progressive JPEG on the rayon pool.
pub struct JpegVariantEncoder;

#[async_trait]
impl VariantEncoder for JpegVariantEncoder {
    async fn encode(
        &self,
        source: Arc<DynamicImage>,
        width: u32,
        quality: Option<u8>,
    ) -> Result<Bytes, EncodeError> {
        derive(source, width, quality).await
    }
}

/// Runs a CPU bound job on the rayon pool and waits for it without
/// blocking the runtime.
///
/// Returns `None` if the job panicked. The panic is caught on the worker,
/// rayon would otherwise abort the whole process.
async fn run_on_pool<F, T>(job: F) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    rayon::spawn(move || {
        let _ = tx.send(catch_unwind(AssertUnwindSafe(job)).ok());
    });

    rx.await.ok().flatten()
}

/// Decodes the source image once so every variant can be derived from it.
pub async fn decode(data: Bytes) -> Result<Arc<DynamicImage>, DecodeError> {
    run_on_pool(move || resizer::decode(&data))
        .await
        .ok_or(DecodeError::WorkerGone)?
        .map(Arc::new)
}

/// Produces one variant of the source, resized to `width` and encoded as JPEG.
///
/// The source is only read, so repeated calls against the same image
/// never see each other's output.
pub async fn derive(
    source: Arc<DynamicImage>,
    width: u32,
    quality: Option<u8>,
) -> Result<Bytes, EncodeError> {
    run_on_pool(move || {
        let resized = resizer::resize_to_width(&source, width)?;
        encoder::encode_jpeg(&resized, quality)
    })
    .await
    .ok_or(EncodeError::WorkerGone)?
}

#[cfg(test)]
mod tests {
    use image::GenericImageView;

    use super::*;
    use crate::utils::sample_png;

    /// Start Of Frame marker for progressive DCT.
    const SOF2: [u8; 2] = [0xFF, 0xC2];

    #[tokio::test]
    async fn test_derive_keeps_aspect_ratio() -> anyhow::Result<()> {
        let source = decode(Bytes::from(sample_png(800, 600))).await?;

        let data = derive(source.clone(), 400, Some(60)).await?;
        assert_eq!(image::guess_format(&data)?, image::ImageFormat::Jpeg);

        let out = image::load_from_memory(&data)?;
        assert_eq!(out.dimensions(), (400, 300));

        Ok(())
    }

    #[tokio::test]
    async fn test_derive_upscales_narrow_sources() -> anyhow::Result<()> {
        let source = decode(Bytes::from(sample_png(200, 100))).await?;

        let data = derive(source, 400, None).await?;
        let out = image::load_from_memory(&data)?;
        assert_eq!(out.dimensions(), (400, 200));

        Ok(())
    }

    #[tokio::test]
    async fn test_output_is_progressive() -> anyhow::Result<()> {
        let source = decode(Bytes::from(sample_png(64, 64))).await?;

        let data = derive(source, 32, Some(80)).await?;
        assert!(data.windows(2).any(|w| w == SOF2));

        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_derivation_is_independent() -> anyhow::Result<()> {
        let source = decode(Bytes::from(sample_png(640, 480))).await?;

        let first = derive(source.clone(), 320, Some(80)).await?;
        let _thumb = derive(source.clone(), 40, Some(60)).await?;
        let second = derive(source.clone(), 320, Some(80)).await?;

        assert_eq!(first, second);
        assert_eq!(source.dimensions(), (640, 480));

        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_source_fails_to_decode() {
        let result = decode(Bytes::from_static(b"definitely not an image")).await;
        assert!(matches!(result, Err(DecodeError::Image(_))));
    }

    #[tokio::test]
    async fn test_oversized_variant_is_rejected_before_resizing() -> anyhow::Result<()> {
        let source = decode(Bytes::from(sample_png(1, 40000))).await?;

        let result = derive(source, 1920, Some(80)).await;
        assert!(matches!(
            result,
            Err(EncodeError::TooLarge { width: 1920, height }) if height > resizer::MAX_DIMENSION
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_panicking_job_maps_to_worker_gone() {
        let result = run_on_pool(|| -> Result<Bytes, EncodeError> { panic!("decoder bug") })
            .await
            .ok_or(EncodeError::WorkerGone);
        assert!(matches!(result, Err(EncodeError::WorkerGone)));

        // The pool keeps serving jobs afterwards.
        assert_eq!(run_on_pool(|| 7u32).await, Some(7));
    }

    #[test]
    fn test_target_height_rounds() {
        assert_eq!(resizer::target_height(3, 2, 1920), 1280);
        assert_eq!(resizer::target_height(1000, 333, 400), 133);
        assert_eq!(resizer::target_height(4000, 1, 400), 1);
    }
}
