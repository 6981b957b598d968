//! Preview sink that retains the latest frames for assertions.

use parking_lot::Mutex;
use scan_core::capabilities::PreviewSink;
use scan_core::data::{Frame, LASER_COUNT};
use std::sync::atomic::{AtomicU32, Ordering};

/// Collects the most recent preview frames.
///
/// Frames are copied on delivery, per the [`PreviewSink`] contract.
#[derive(Default)]
pub struct CollectingPreview {
    texture: Mutex<Option<Frame>>,
    lasers: Mutex<[Option<Frame>; LASER_COUNT]>,
    overlays: Mutex<[Option<Frame>; LASER_COUNT]>,
    texture_updates: AtomicU32,
    overlay_updates: AtomicU32,
}

impl CollectingPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_texture(&self) -> Option<Frame> {
        self.texture.lock().clone()
    }

    pub fn latest_laser_frames(&self) -> [Option<Frame>; LASER_COUNT] {
        self.lasers.lock().clone()
    }

    pub fn latest_overlays(&self) -> [Option<Frame>; LASER_COUNT] {
        self.overlays.lock().clone()
    }

    pub fn texture_updates(&self) -> u32 {
        self.texture_updates.load(Ordering::Relaxed)
    }

    pub fn overlay_updates(&self) -> u32 {
        self.overlay_updates.load(Ordering::Relaxed)
    }
}

impl PreviewSink for CollectingPreview {
    fn set_texture(&self, frame: &Frame) {
        *self.texture.lock() = Some(frame.clone());
        self.texture_updates.fetch_add(1, Ordering::Relaxed);
    }

    fn set_laser_frames(&self, frames: &[Option<Frame>; LASER_COUNT]) {
        *self.lasers.lock() = frames.clone();
    }

    fn set_overlay_frames(&self, frames: &[Option<Frame>; LASER_COUNT]) {
        *self.overlays.lock() = frames.clone();
        self.overlay_updates.fetch_add(1, Ordering::Relaxed);
    }
}
