//! Snapshot renderers for the retrieval endpoint.
//!
//! A [`SnapshotRenderer`] turns a stored payload into response bytes.
//! The server ships [`QrPngRenderer`]; tests plug in their own.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

/// Errors raised while rendering a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The payload does not fit in a QR code.
    #[error("QR encoding failed: {0}")]
    Encode(String),

    /// The rendered image could not be written out.
    #[error("image encoding failed: {0}")]
    Image(String),
}

/// Turns a stored payload into an HTTP response body.
pub trait SnapshotRenderer: Send + Sync {
    /// MIME type of the rendered bytes.
    fn content_type(&self) -> &'static str;

    /// Render `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the payload cannot be rendered.
    fn render(&self, payload: &str) -> Result<Vec<u8>, RenderError>;
}

/// Renders payloads as PNG QR codes.
#[derive(Debug, Clone)]
pub struct QrPngRenderer {
    size: u32,
    level: EcLevel,
}

impl QrPngRenderer {
    /// Default minimum edge length, in pixels.
    pub const DEFAULT_SIZE: u32 = 256;

    /// Create a renderer producing images at least `size` pixels wide,
    /// using low error correction (densest code, shortest scan).
    pub const fn new(size: u32) -> Self {
        Self {
            size,
            level: EcLevel::L,
        }
    }

    /// Use a different error correction level.
    #[must_use]
    pub const fn with_level(mut self, level: EcLevel) -> Self {
        self.level = level;
        self
    }
}

impl Default for QrPngRenderer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

impl SnapshotRenderer for QrPngRenderer {
    fn content_type(&self) -> &'static str {
        "image/png"
    }

    fn render(&self, payload: &str) -> Result<Vec<u8>, RenderError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.level)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(self.size, self.size)
            .build();

        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| RenderError::Image(e.to_string()))?;
        Ok(png.into_inner())
    }
}
