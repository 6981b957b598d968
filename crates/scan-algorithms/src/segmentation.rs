//! Laser-stripe extraction from camera frames.

use anyhow::Result;
use scan_core::capabilities::LaserSegmentation;
use scan_core::data::{Frame, StripePoint};
use serde::Deserialize;

/// Configuration for [`MaxIntensitySegmentation`].
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    /// Minimum luma (0-255) for a scanline peak to count as laser light.
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Half-width in pixels of the centroid window around the peak.
    #[serde(default = "default_window")]
    pub window: u32,
}

fn default_threshold() -> u8 {
    40
}

fn default_window() -> u32 {
    3
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            window: default_window(),
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            anyhow::bail!("threshold must be positive");
        }
        if self.window == 0 {
            anyhow::bail!("centroid window must be at least 1 pixel");
        }
        Ok(())
    }
}

/// Per-scanline peak detector.
///
/// For every image row, finds the brightest pixel; rows whose peak reaches
/// the configured threshold yield one stripe point whose column is the
/// luma-weighted centroid of the window around the peak. The overlay output
/// is a gray frame with the detected pixels marked.
pub struct MaxIntensitySegmentation {
    config: SegmentationConfig,
}

impl MaxIntensitySegmentation {
    pub fn new() -> Self {
        Self::with_config(SegmentationConfig::default())
    }

    pub fn with_config(config: SegmentationConfig) -> Self {
        Self { config }
    }
}

impl Default for MaxIntensitySegmentation {
    fn default() -> Self {
        Self::new()
    }
}

impl LaserSegmentation for MaxIntensitySegmentation {
    fn compute_2d_points(&self, image: &Frame) -> Result<(Vec<StripePoint>, Frame)> {
        let mut points = Vec::new();
        let mut overlay = vec![0u8; (image.width * image.height) as usize];

        for v in 0..image.height {
            let mut peak_col = 0u32;
            let mut peak_luma = 0u8;
            for x in 0..image.width {
                let luma = image.luma_at(x, v).unwrap_or(0);
                if luma > peak_luma {
                    peak_luma = luma;
                    peak_col = x;
                }
            }
            if peak_luma < self.config.threshold {
                continue;
            }

            let lo = peak_col.saturating_sub(self.config.window);
            let hi = (peak_col + self.config.window).min(image.width - 1);
            let mut weight_sum = 0.0f64;
            let mut weighted_col = 0.0f64;
            for x in lo..=hi {
                let luma = image.luma_at(x, v).unwrap_or(0) as f64;
                weight_sum += luma;
                weighted_col += luma * x as f64;
            }
            if weight_sum <= 0.0 {
                continue;
            }
            let u = (weighted_col / weight_sum) as f32;

            let marked = (u.round() as u32).min(image.width - 1);
            overlay[(v * image.width + marked) as usize] = 255;
            points.push(StripePoint { u, v });
        }

        Ok((points, Frame::from_gray(image.width, image.height, overlay)))
    }
}
