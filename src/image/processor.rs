use crate::{Error, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Every captioning upload is a baseline JPEG.
pub const CAPTION_MIME_TYPE: &str = "image/jpeg";

/// Convert any channel layout (alpha, grayscale, 16-bit) to 8-bit RGB.
///
/// Alpha is dropped rather than composited; captioning only cares about the
/// visible content.
pub fn normalize_rgb(image: &DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        other => {
            tracing::debug!("Converting {:?} image to RGB before captioning", other.color());
            other.to_rgb8()
        }
    }
}

fn encode_jpeg_sync(image: DynamicImage) -> Result<Vec<u8>> {
    let rgb = normalize_rgb(&image);
    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
    Ok(bytes)
}

/// Normalize and JPEG-encode an image off the async executor.
pub async fn encode_for_captioning(image: &DynamicImage) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking({
        let image = image.clone();
        move || encode_jpeg_sync(image)
    })
    .await
    .map_err(|e| Error::Invariant(format!("Image encoding task join error: {}", e)))?
}

/// Decode an image file off the async executor.
pub async fn load_image(path: &Path) -> Result<DynamicImage> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || image::open(&path).map_err(Error::from))
        .await
        .map_err(|e| Error::Invariant(format!("Image decoding task join error: {}", e)))?
}
