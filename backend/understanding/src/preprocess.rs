//! Image preparation ahead of OCR.
//!
//! decode → grayscale → resize to a fixed width → crop the region of interest.
//! The crop is clamped to the resized image; a region lying wholly outside it
//! is skipped and the full image is used.

use std::path::{Path, PathBuf};

use cardscan_config::{CropRegion, OcrSettings};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageError, ImageReader, Limits};
use thiserror::Error;
use tracing::{debug, warn};

/// Largest source image accepted by the decoder, per side.
pub const MAX_SOURCE_DIMENSION: u32 = 20_000;

/// Decoder allocation ceiling.
pub const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// Largest resized image handed to OCR, in pixels.
pub const MAX_OUTPUT_PIXELS: u64 = 40_000_000;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to read image. Please upload a valid image.")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("Image dimensions are too large to process.")]
    TooLarge { width: u64, height: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    resize_width: u32,
    crop: Option<CropRegion>,
}

impl Preprocessor {
    pub fn new(resize_width: u32, crop: Option<CropRegion>) -> Self {
        Self {
            resize_width: resize_width.max(1),
            crop,
        }
    }

    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self::new(settings.resize_width, settings.crop)
    }

    /// Decode the file at `path` (format sniffed from content) and prepare it.
    pub fn load(&self, path: &Path) -> Result<GrayImage, PreprocessError> {
        let unreadable = |source: ImageError| PreprocessError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = ImageReader::open(path)
            .map_err(|e| unreadable(ImageError::IoError(e)))?
            .with_guessed_format()
            .map_err(|e| unreadable(ImageError::IoError(e)))?;
        reader.limits(decode_limits());
        let image = reader.decode().map_err(unreadable)?;

        self.prepare(&image)
    }

    pub fn prepare(&self, image: &DynamicImage) -> Result<GrayImage, PreprocessError> {
        let (width, height) = self.target_size(image.width(), image.height())?;
        let gray = image.to_luma8();
        let resized = imageops::resize(&gray, width, height, FilterType::Triangle);
        debug!(
            from_width = gray.width(),
            from_height = gray.height(),
            width,
            height,
            "Resized image"
        );

        let Some(region) = self.crop else {
            return Ok(resized);
        };
        Ok(match clamp_region(region, width, height) {
            Some((x, y, w, h)) => imageops::crop_imm(&resized, x, y, w, h).to_image(),
            None => {
                warn!(
                    crop_x = region.x,
                    crop_y = region.y,
                    width,
                    height,
                    "Crop region lies outside the resized image; using the full image"
                );
                resized
            }
        })
    }

    /// Height follows the aspect ratio, truncated, never below one pixel.
    /// Fails when the result exceeds [`MAX_OUTPUT_PIXELS`].
    fn target_size(&self, width: u32, height: u32) -> Result<(u32, u32), PreprocessError> {
        let target_width = u64::from(self.resize_width);
        let target_height = (target_width * u64::from(height) / u64::from(width.max(1))).max(1);
        let too_large = || PreprocessError::TooLarge {
            width: target_width,
            height: target_height,
        };
        if target_width.saturating_mul(target_height) > MAX_OUTPUT_PIXELS {
            return Err(too_large());
        }
        let target_height = u32::try_from(target_height).map_err(|_| too_large())?;
        Ok((self.resize_width, target_height))
    }
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SOURCE_DIMENSION);
    limits.max_image_height = Some(MAX_SOURCE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Intersect `region` with a `width`×`height` image. `None` when empty.
fn clamp_region(region: CropRegion, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    if region.x >= width || region.y >= height {
        return None;
    }
    let w = region.width.min(width - region.x);
    let h = region.height.min(height - region.y);
    (w > 0 && h > 0).then_some((region.x, region.y, w, h))
}
