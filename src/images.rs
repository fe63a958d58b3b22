//! Base64 image payloads used for avatars and recipe pictures.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, ImageReader};

pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum decoded image size (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Decode a `data:image/<ext>;base64,<payload>` string (or bare base64) and
/// check that it holds a readable image in one of the allowed formats.
pub fn decode_image_payload(payload: &str) -> Result<DecodedImage, String> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err("Image is empty".to_string());
    }

    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest
                .split_once(',')
                .ok_or_else(|| "Malformed data URI".to_string())?;
            if !header.starts_with("image/") || !header.ends_with(";base64") {
                return Err("Expected a base64 encoded image data URI".to_string());
            }
            body
        }
        None => payload,
    };

    let data = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("Invalid base64 data: {e}"))?;

    if data.len() > MAX_FILE_SIZE {
        return Err(format!(
            "Image too large: {} bytes (max {})",
            data.len(),
            MAX_FILE_SIZE
        ));
    }

    let content_type = validate_image(&data)?;
    Ok(DecodedImage { data, content_type })
}

/// Detects the format and reads the header so truncated or fake payloads are
/// rejected. Returns the MIME type.
pub fn validate_image(data: &[u8]) -> Result<String, String> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {e}"))?;

    let format = reader
        .format()
        .ok_or_else(|| "Could not detect image format".to_string())?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format: {format:?}. Allowed: JPEG, PNG, GIF, WebP"
        ));
    }

    reader
        .into_dimensions()
        .map_err(|e| format!("Failed to read image: {e}"))?;

    Ok(format.to_mime_type().to_string())
}
