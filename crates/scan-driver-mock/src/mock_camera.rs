//! Mock camera producing synthetic texture and laser-stripe frames.

use crate::fail::FailPlan;
use crate::pattern;
use anyhow::Result;
use async_trait::async_trait;
use scan_core::capabilities::ImageSource;
use scan_core::data::{Frame, LASER_COUNT};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Configuration for [`MockCamera`].
#[derive(Debug, Clone, Deserialize)]
pub struct MockCameraConfig {
    /// Frame width in pixels (default: 64)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height in pixels (default: 48)
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    64
}

fn default_height() -> u32 {
    48
}

impl Default for MockCameraConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Camera operations that can be failure-injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraOp {
    CaptureTexture,
    CaptureLaser,
}

/// Mock camera.
///
/// Texture frames are a diagonal gradient; laser frames are a dark field
/// with one bright stripe whose column follows [`pattern::stripe_column`],
/// so segmentation has something real to find.
pub struct MockCamera {
    width: u32,
    height: u32,
    streaming: AtomicBool,
    frames: AtomicU64,
    fail: FailPlan<CameraOp>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::with_config(MockCameraConfig::default())
    }

    pub fn with_config(config: MockCameraConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            streaming: AtomicBool::new(false),
            frames: AtomicU64::new(0),
            fail: FailPlan::new(),
        }
    }

    /// Let `op` succeed `successes` more times, then fail every call.
    pub fn fail_after(&self, op: CameraOp, successes: u32) {
        self.fail.fail_after(op, successes);
    }

    /// Current live-preview streaming flag.
    pub fn streaming(&self) -> bool {
        self.streaming.load(Ordering::Relaxed)
    }

    /// Total frames captured (texture and laser).
    pub fn frames_captured(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSource for MockCamera {
    fn set_stream(&self, enabled: bool) {
        self.streaming.store(enabled, Ordering::Relaxed);
    }

    async fn capture_texture(&self) -> Result<Frame> {
        self.fail.check(CameraOp::CaptureTexture, "capture_texture")?;
        let n = self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(pattern::texture_frame(self.width, self.height, n))
    }

    async fn capture_laser(&self, index: usize) -> Result<Frame> {
        if index >= LASER_COUNT {
            anyhow::bail!("laser index {index} out of range");
        }
        self.fail.check(CameraOp::CaptureLaser, "capture_laser")?;
        let n = self.frames.fetch_add(1, Ordering::Relaxed);
        let column = pattern::stripe_column(self.width, index, n);
        Ok(pattern::stripe_frame(self.width, self.height, column))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
