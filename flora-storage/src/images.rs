//! Inline image decoding and upload compression.
//!
//! Images picked in the record form arrive as `data:` URLs. Before upload they
//! are decoded, scaled down to at most [`MAX_WIDTH`] pixels wide (aspect ratio
//! kept) and re-encoded as JPEG at [`JPEG_QUALITY`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

/// Widest image stored after compression.
pub const MAX_WIDTH: u32 = 800;

/// JPEG quality used for uploads (0-100).
pub const JPEG_QUALITY: u8 = 70;

/// Errors decoding or compressing an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("Not a data URL")]
    NotDataUrl,

    #[error("Data URL is not base64-encoded")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode JPEG: {0}")]
    Encode(String),
}

/// Bytes and declared MIME type of an inline image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Parse a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(url: &str) -> Result<DecodedImage, ImageError> {
    let rest = url.strip_prefix("data:").ok_or(ImageError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUrl)?;
    let mime_type = header.strip_suffix(";base64").ok_or(ImageError::NotBase64)?;
    let mime_type = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;

    Ok(DecodedImage {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Encode bytes as a base64 JPEG data URL.
pub fn encode_jpeg_data_url(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
}

/// Scale an image down to [`MAX_WIDTH`] and re-encode it as JPEG.
pub fn compress_jpeg(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;

    let img = if img.width() > MAX_WIDTH {
        let height = (u64::from(img.height()) * u64::from(MAX_WIDTH) / u64::from(img.width())).max(1);
        img.resize_exact(MAX_WIDTH, height as u32, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out)
}
