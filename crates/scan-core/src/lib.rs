//! `scan-core`
//!
//! Core trait definitions and types for the turnscan scanning engine.
//!
//! This crate provides the fundamental building blocks shared by the engine,
//! the algorithm implementations and the hardware drivers:
//!
//! - [`Frame`]: byte-backed 8-bit camera image (gray or RGB)
//! - [`ScanCapture`]: immutable per-rotation-step record
//! - [`PointCloudChunk`]: one laser's 3D points (with colors) for one step
//! - [`capabilities`]: the seams the pipeline depends on (board, camera,
//!   segmentation, point-cloud generation, preview sink)
//! - [`ScanError`]: the error kinds a scan session can end with
//!
//! The pipeline in `scan-engine` depends only on the traits defined here,
//! never on concrete driver or algorithm implementations.

pub mod capabilities;
pub mod data;
pub mod error;

pub use capabilities::{
    ImageSource, LaserSegmentation, NullPreview, PointCloudGeneration, PreviewSink, ScannerBoard,
};
pub use data::{Frame, PointCloudChunk, Progress, ScanCapture, StripePoint, LASER_COUNT};
pub use error::{ScanError, ScanResult};
