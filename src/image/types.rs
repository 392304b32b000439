//! Core types for image generation.

use crate::error::{Result, StudioError};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// File name prefix for downloaded studio shots.
pub const DOWNLOAD_PREFIX: &str = "studio-pro";

/// Media type assumed when a file gives no better hint.
pub const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Maps a MIME type to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// An image held in memory together with its media type.
///
/// Its string form is a `data:<media type>;base64,<payload>` URL, which is
/// what gets displayed and sent over the wire. The bytes are never empty.
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    media_type: String,
    data: Arc<[u8]>,
}

impl EncodedImage {
    /// Wraps raw bytes with their media type.
    pub fn new(media_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<Self> {
        let media_type = media_type.into().trim().to_string();
        let data: Vec<u8> = data.into();
        if media_type.is_empty() {
            return Err(StudioError::InvalidRequest(
                "image media type must not be empty".into(),
            ));
        }
        if data.is_empty() {
            return Err(StudioError::InvalidRequest("image data is empty".into()));
        }
        Ok(Self {
            media_type,
            data: data.into(),
        })
    }

    /// Parses a `data:` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| StudioError::Decode("not a data URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| StudioError::Decode("data URL has no payload separator".into()))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| StudioError::Decode("data URL is not base64 encoded".into()))?;
        let media_type = if media_type.is_empty() {
            DEFAULT_MEDIA_TYPE
        } else {
            media_type
        };

        let data = decode_base64_lenient(payload).map_err(|e| StudioError::Decode(e.to_string()))?;
        Self::new(media_type, data)
    }

    /// Reads an image file from disk.
    ///
    /// The media type is taken from the extension, as a file picker would
    /// report it, then from the file's magic bytes.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let media_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .map_or(DEFAULT_MEDIA_TYPE, |f| f.mime_type());
        Self::new(media_type, data)
    }

    /// The media type this image was labelled with.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size of the image data in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed image.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The format detected from the bytes themselves.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_magic_bytes(&self.data)
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    /// Writes the raw bytes to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_data_url())
    }
}

impl FromStr for EncodedImage {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_data_url(s)
    }
}

/// The outcome of one successful generation.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "generation result should be saved or displayed"]
pub struct GenerationResult {
    /// The photo that was sent.
    pub source_image: EncodedImage,
    /// The studio shot that came back.
    pub produced_image: EncodedImage,
    /// When the studio shot was received.
    pub produced_at: DateTime<Utc>,
}

impl GenerationResult {
    /// Creates a result stamped with the current time.
    pub fn new(source_image: EncodedImage, produced_image: EncodedImage) -> Self {
        Self {
            source_image,
            produced_image,
            produced_at: Utc::now(),
        }
    }

    /// File name used when the result is downloaded: `studio-pro-<unix millis>.png`.
    pub fn download_file_name(&self) -> String {
        format!(
            "{DOWNLOAD_PREFIX}-{}.png",
            self.produced_at.timestamp_millis()
        )
    }
}

/// Decodes a base64 string that may be imperfectly formatted.
///
/// Accepts a data URI prefix, missing `=` padding and embedded whitespace.
pub(crate) fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(cleaned.trim_end_matches('='))
}
