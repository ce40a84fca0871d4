use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use service_core::error::AppError;
use std::io::Cursor;

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_QUALITY: u8 = 80;

/// A client-supplied image re-encoded for upload.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// Original file name, kept verbatim; the content type changes instead.
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Downscale an image to at most `max_width` (aspect ratio preserved, no-op
/// when already narrower) and re-encode as JPEG at `quality`.
///
/// Never called implicitly by the upload path; callers opt in.
pub fn compress_image(
    name: &str,
    data: &[u8],
    max_width: u32,
    quality: u8,
) -> Result<CompressedImage, AppError> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to decode image: {}", e)))?;

    let img = if img.width() > max_width {
        let height = (img.height() as u64 * max_width as u64 / img.width() as u64).max(1) as u32;
        img.resize_exact(max_width, height, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode image: {}", e)))?;

    Ok(CompressedImage {
        name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        data: buf.into_inner(),
    })
}

/// Run `compress_image` off the async runtime's worker threads.
pub async fn compress_in_background(
    name: String,
    data: Vec<u8>,
    max_width: u32,
    quality: u8,
) -> Result<CompressedImage, AppError> {
    tokio::task::spawn_blocking(move || compress_image(&name, &data, max_width, quality))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Image task failed: {}", e)))?
}
