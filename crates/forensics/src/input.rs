//! Receipt image intake for the request layer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUPPORTED_FORMATS: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
    "image/bmp",
    "image/tiff",
    "image/heic",
    "image/heif",
];

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image is empty")]
    Empty,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },
}

/// Accepts raw base64 or a `data:<mime>;base64,` URL.
pub fn decode_base64_image(text: &str) -> Result<Vec<u8>, InputError> {
    let payload = match text.find("base64,") {
        Some(index) => &text[index + "base64,".len()..],
        None => text,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Checks size and container type, returning the detected MIME type.
pub fn validate_image(image: &[u8], max_bytes: usize) -> Result<&'static str, InputError> {
    if image.is_empty() {
        return Err(InputError::Empty);
    }
    if image.len() > max_bytes {
        return Err(InputError::TooLarge {
            size: image.len(),
            limit: max_bytes,
        });
    }

    let mime = infer::get(image)
        .map(|kind| kind.mime_type())
        .ok_or_else(|| InputError::UnsupportedType("unknown".to_string()))?;

    if SUPPORTED_FORMATS.contains(&mime) {
        Ok(mime)
    } else {
        Err(InputError::UnsupportedType(mime.to_string()))
    }
}

pub fn load_image(path: &Path, base64: bool, max_bytes: usize) -> Result<Vec<u8>, InputError> {
    let unreadable = |source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let image = if base64 {
        let text = std::fs::read_to_string(path).map_err(unreadable)?;
        decode_base64_image(&text)?
    } else {
        std::fs::read(path).map_err(unreadable)?
    };

    validate_image(&image, max_bytes)?;
    Ok(image)
}
