//! `scan-driver-mock`
//!
//! Mock hardware drivers for testing and hardware-free simulation:
//!
//! - [`MockBoard`]: simulated turntable/laser control board with
//!   configurable move timing and deterministic fail-after-N error
//!   injection
//! - [`MockCamera`]: synthetic texture and laser-stripe frames
//! - [`CollectingPreview`]: preview sink that retains the latest frames so
//!   tests can assert on them
//!
//! The mocks implement the `scan-core` capability traits and track enough
//! internal state (laser power, motor enablement, commanded position) for
//! tests to verify the pipeline's cleanup guarantees.

mod fail;
pub mod mock_board;
pub mod mock_camera;
pub mod pattern;
pub mod preview;

pub use mock_board::{BoardOp, MockBoard, MockBoardConfig};
pub use mock_camera::{CameraOp, MockCamera, MockCameraConfig};
pub use preview::CollectingPreview;
