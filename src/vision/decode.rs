//! Data-URL frame decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image payload is empty")]
    Empty,
    #[error("image payload is not a data URL (missing ',' separator)")]
    MissingSeparator,
    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image bytes could not be decoded: {0}")]
    Image(#[from] image::ImageError),
}

/// Decodes `data:<mime>;base64,<data>` into a raster image.
///
/// Everything up to and including the first comma is discarded; the image
/// format is sniffed from the decoded bytes, not from the MIME prefix.
pub fn decode_data_url(payload: &str) -> Result<DynamicImage, DecodeError> {
    if payload.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    let (_, data) = payload
        .split_once(',')
        .ok_or(DecodeError::MissingSeparator)?;
    let bytes = STANDARD.decode(data.trim())?;
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(image::load_from_memory(&bytes)?)
}
