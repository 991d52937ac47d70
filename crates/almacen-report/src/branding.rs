//! Optional branding image for report headers.
//!
//! Loading never fails the export: a missing or undecodable image is logged
//! with `warn!` and the header is drawn without it.

use std::path::Path;

use image::GenericImageView;
use serde::Serialize;
use tracing::{debug, warn};

/// A decoded branding image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branding {
    /// Source path, for recorded layouts.
    pub source: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl Branding {
    /// Decodes an in-memory image.
    pub fn from_bytes(source: impl Into<String>, bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(&bytes)?;
        let (width_px, height_px) = decoded.dimensions();
        Ok(Branding {
            source: source.into(),
            bytes,
            width_px,
            height_px,
        })
    }

    /// Width for a given height, keeping the aspect ratio.
    pub fn width_for_height(&self, height: f32) -> f32 {
        if self.height_px == 0 {
            return height;
        }
        height * self.width_px as f32 / self.height_px as f32
    }
}

/// Loads the branding image, or `None` (logged) when it cannot be used.
pub fn load_branding(path: Option<&Path>) -> Option<Branding> {
    let path = path?;

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Branding image unavailable, continuing without it");
            return None;
        }
    };

    match Branding::from_bytes(path.display().to_string(), bytes) {
        Ok(branding) => {
            debug!(
                path = %path.display(),
                width = branding.width_px,
                height = branding.height_px,
                "Branding image loaded"
            );
            Some(branding)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Branding image could not be decoded, continuing without it");
            None
        }
    }
}
