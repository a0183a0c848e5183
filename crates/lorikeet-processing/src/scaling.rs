//! Downscaling rules for the display image and thumbnail

use lorikeet_core::IngestConfig;

/// Bounding box an image is shrunk to fit. A zero on either axis means that
/// axis is unbounded. Images are never enlarged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingPolicy {
    pub max_width: u32,
    pub max_height: u32,
}

impl ScalingPolicy {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Bounds of the display image
    pub fn display(config: &IngestConfig) -> Self {
        Self::new(config.max_width, config.max_height)
    }

    /// Bounds of the thumbnail
    pub fn thumbnail(config: &IngestConfig) -> Self {
        Self::new(config.thumbnail_max_width, config.thumbnail_max_height)
    }

    /// Uniform scale factor in (0, 1] for an image of the given size.
    pub fn ratio(&self, width: u32, height: u32) -> f64 {
        let x = axis_ratio(width, self.max_width);
        let y = axis_ratio(height, self.max_height);
        x.min(y)
    }

    /// Output dimensions: each axis scaled by [`Self::ratio`], truncated, and
    /// never below one pixel.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let ratio = self.ratio(width, height);
        (scale(width, ratio), scale(height, ratio))
    }
}

fn axis_ratio(natural: u32, max: u32) -> f64 {
    if max > 0 && max < natural {
        f64::from(max) / f64::from(natural)
    } else {
        1.0
    }
}

fn scale(natural: u32, ratio: f64) -> u32 {
    // ratio <= 1, so the product always fits back into u32
    ((f64::from(natural) * ratio).floor() as u32).max(1)
}
