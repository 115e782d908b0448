use base64::Engine;
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobState;

/// Request to start a generation for a funnel session.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    /// Room photo as a base64 `data:` URL, produced by the funnel page.
    #[garde(length(min = 1))]
    pub image: String,

    #[garde(length(min = 1, max = 80))]
    pub style: String,

    #[garde(length(min = 1, max = 80))]
    pub zone: String,
}

/// Response after a generation was accepted and the poller started.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub job_id: Uuid,
    pub status: JobState,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageRefError {
    #[error("image must be a base64 data URL")]
    NotADataUrl,

    #[error("image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("image payload is not a recognized image format")]
    UnknownFormat,
}

/// Decode and sanity-check an uploaded `data:image/...;base64,` URL.
///
/// Runs before any network call so a bad upload never reaches the
/// generation API.
pub fn decode_image_data_url(data_url: &str) -> Result<Vec<u8>, ImageRefError> {
    let payload = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_mime, payload)| payload)
        .ok_or(ImageRefError::NotADataUrl)?;

    let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;

    image::guess_format(&bytes).map_err(|_| ImageRefError::UnknownFormat)?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid 1x1 PNG.
    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x62, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn png_data_url() -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(PNG_1X1)
        )
    }

    #[test]
    fn accepts_png_data_url() {
        let bytes = decode_image_data_url(&png_data_url()).unwrap();
        assert_eq!(bytes, PNG_1X1);
    }

    #[test]
    fn rejects_plain_url() {
        let err = decode_image_data_url("https://example.com/photo.jpg").unwrap_err();
        assert!(matches!(err, ImageRefError::NotADataUrl));
    }

    #[test]
    fn rejects_bad_base64() {
        let err = decode_image_data_url("data:image/png;base64,not-base64!!").unwrap_err();
        assert!(matches!(err, ImageRefError::Decode(_)));
    }

    #[test]
    fn rejects_non_image_payload() {
        let payload = base64::engine::general_purpose::STANDARD.encode(b"just some text");
        let data_url = format!("data:text/plain;base64,{payload}");
        let err = decode_image_data_url(&data_url).unwrap_err();
        assert!(matches!(err, ImageRefError::UnknownFormat));
    }

    #[test]
    fn generate_request_requires_all_fields() {
        let request = GenerateRequest {
            image: String::new(),
            style: "Moderno".to_string(),
            zone: "Sala".to_string(),
        };
        assert!(request.validate().is_err());

        let request = GenerateRequest {
            image: png_data_url(),
            style: "Moderno".to_string(),
            zone: "Sala".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
