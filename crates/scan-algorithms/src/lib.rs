//! `scan-algorithms`
//!
//! Reference implementations of the two algorithm seams the scanning
//! pipeline consumes:
//!
//! - [`MaxIntensitySegmentation`]: per-scanline peak detection with a
//!   sub-pixel centroid, implementing
//!   [`scan_core::LaserSegmentation`]
//! - [`PlaneTriangulator`]: pinhole back-projection onto the laser plane,
//!   rotated into the turntable frame, implementing
//!   [`scan_core::PointCloudGeneration`]
//!
//! Both carry serde-derived configurations with validated defaults so they
//! can be loaded from the same TOML files as the rest of the system.

pub mod segmentation;
pub mod triangulation;

pub use segmentation::{MaxIntensitySegmentation, SegmentationConfig};
pub use triangulation::{PlaneTriangulator, TriangulatorConfig};
