//! Hardware and algorithm capability traits.
//!
//! The scanning pipeline depends only on these seams, never on concrete
//! implementations:
//!
//! - [`ScannerBoard`]: turntable motor and laser power control
//! - [`ImageSource`]: camera frames, with per-laser strobing
//! - [`LaserSegmentation`]: stripe-frame to 2D stripe points
//! - [`PointCloudGeneration`]: 2D stripe points + angle to 3D points
//! - [`PreviewSink`]: fire-and-forget live preview frames
//!
//! Hardware traits are async (`#[async_trait]`), thread-safe
//! (`Send + Sync`), and use `anyhow::Result` for errors; the pipeline maps
//! failures to its own error kinds at the call site. The pure-computation
//! and preview traits are synchronous.

use crate::data::{Frame, StripePoint, LASER_COUNT};
use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Hardware Capabilities
// =============================================================================

/// Capability: turntable motor and laser power control.
///
/// # Contract
/// - Motion is relative: `motor_relative` queues a move of the given number
///   of degrees, `motor_move` executes the queued move and resolves once the
///   controller has accepted it.
/// - Speed and acceleration apply to subsequent moves.
/// - Failures are hardware-communication errors; the pipeline does not retry
///   them, it surfaces them through the scan completion callback.
#[async_trait]
pub trait ScannerBoard: Send + Sync {
    /// Switch all lasers off.
    async fn lasers_off(&self) -> Result<()>;

    /// Energize the motor so it holds position and accepts moves.
    async fn motor_enable(&self) -> Result<()>;

    /// De-energize the motor.
    async fn motor_disable(&self) -> Result<()>;

    /// Queue a relative move of `degrees` (signed).
    async fn motor_relative(&self, degrees: f64) -> Result<()>;

    /// Set motor speed for subsequent moves.
    async fn motor_speed(&self, value: f64) -> Result<()>;

    /// Set motor acceleration for subsequent moves.
    async fn motor_acceleration(&self, value: f64) -> Result<()>;

    /// Execute the queued relative move, resolving once the controller has
    /// executed it.
    async fn motor_move(&self) -> Result<()>;
}

/// Capability: camera frame acquisition.
///
/// # Contract
/// - `set_stream` latches the live-preview streaming mode; it is a
///   lightweight flag the driver observes and must not block.
/// - `capture_laser(i)` must strobe laser `i` during the exposure and
///   return the raw frame.
/// - Failures are capture errors; the pipeline does not retry them.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Enable or disable live-preview streaming.
    fn set_stream(&self, enabled: bool);

    /// Capture a texture frame (no laser).
    async fn capture_texture(&self) -> Result<Frame>;

    /// Capture a stripe frame with laser `index` strobed during exposure.
    async fn capture_laser(&self, index: usize) -> Result<Frame>;

    /// Sensor resolution (width, height) in pixels.
    fn resolution(&self) -> (u32, u32);
}

// =============================================================================
// Algorithm Capabilities
// =============================================================================

/// Capability: laser-stripe extraction.
pub trait LaserSegmentation: Send + Sync {
    /// Extract 2D stripe coordinates from a stripe frame.
    ///
    /// Returns the detected points plus a debug/overlay image suitable for
    /// on-screen feedback.
    fn compute_2d_points(&self, image: &Frame) -> Result<(Vec<StripePoint>, Frame)>;
}

/// Capability: lifting 2D stripe points to 3D.
pub trait PointCloudGeneration: Send + Sync {
    /// Compute 3D points from stripe coordinates at turntable angle `theta`.
    ///
    /// The output is aligned 1:1 with `points`.
    fn compute_point_cloud(
        &self,
        theta: f64,
        points: &[StripePoint],
        laser_index: usize,
    ) -> Result<Vec<[f32; 3]>>;
}

// =============================================================================
// Preview Sink
// =============================================================================

/// Live-preview consumer for the latest frames.
///
/// # Contract
/// - Calls are fire-and-forget: implementations MUST NOT block and must
///   complete quickly. A slow sink stalls both stage loops.
/// - To persist frames, implementations must copy them.
pub trait PreviewSink: Send + Sync {
    /// Latest texture frame.
    fn set_texture(&self, frame: &Frame);

    /// Latest stripe frames, one slot per laser.
    fn set_laser_frames(&self, frames: &[Option<Frame>; LASER_COUNT]);

    /// Latest segmentation overlay frames, one slot per laser.
    fn set_overlay_frames(&self, frames: &[Option<Frame>; LASER_COUNT]);
}

/// Preview sink that discards everything.
pub struct NullPreview;

impl PreviewSink for NullPreview {
    fn set_texture(&self, _frame: &Frame) {}
    fn set_laser_frames(&self, _frames: &[Option<Frame>; LASER_COUNT]) {}
    fn set_overlay_frames(&self, _frames: &[Option<Frame>; LASER_COUNT]) {}
}
