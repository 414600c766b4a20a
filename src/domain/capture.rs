//! Capture boundary: URL normalization for the screenshot endpoint and the
//! shape of its JSON response. Acquisition itself happens outside the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Viewport the capture endpoint renders pages at.
pub const CAPTURE_VIEWPORT_WIDTH: u32 = 1280;
pub const CAPTURE_VIEWPORT_HEIGHT: u32 = 720;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureMetadata {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_boxes: Option<Vec<BoundingBox>>,
}

impl CaptureMetadata {
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    /// Base64 PNG, with or without the data URL prefix.
    pub image: String,
    pub metadata: CaptureMetadata,
}

impl CaptureResult {
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Response {
            Ok(CaptureResult),
            Failed { error: String },
        }

        match serde_json::from_str::<Response>(json) {
            Ok(Response::Ok(result)) => {
                if result.metadata.has_area() {
                    Ok(result)
                } else {
                    Err(CaptureError::EmptyImage)
                }
            }
            Ok(Response::Failed { error }) => Err(CaptureError::Remote(error)),
            Err(e) => Err(CaptureError::Malformed(e.to_string())),
        }
    }

    pub fn image_data_url(&self) -> String {
        if self.image.starts_with("data:") {
            self.image.clone()
        } else {
            format!("{}{}", PNG_DATA_URL_PREFIX, self.image)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    MissingUrl,
    UnsupportedScheme(String),
    Malformed(String),
    EmptyImage,
    /// Failure reported by the capture endpoint (timeout, navigation error, ...).
    Remote(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::MissingUrl => write!(f, "Missing URL"),
            CaptureError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported URL scheme '{}', only http and https can be captured", scheme)
            }
            CaptureError::Malformed(msg) => write!(f, "Malformed capture response: {}", msg),
            CaptureError::EmptyImage => write!(f, "Capture returned an image without pixels"),
            CaptureError::Remote(msg) => write!(f, "Capture failed: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Trims the input and makes it an absolute `http`/`https` URL.
///
/// Bare hosts get `https://`; any other explicit scheme is rejected.
pub fn normalize_capture_url(input: &str) -> Result<String, CaptureError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CaptureError::MissingUrl);
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Ok(trimmed.to_string());
    }

    if let Some((scheme, _)) = trimmed.split_once("://") {
        return Err(CaptureError::UnsupportedScheme(scheme.to_string()));
    }

    Ok(format!("https://{}", trimmed))
}
