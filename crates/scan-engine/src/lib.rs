//! `scan-engine`
//!
//! The scanning pipeline for a laser-triangulation turntable scanner: a
//! capture stage (turntable, lasers, camera) and a process stage (stripe
//! segmentation, point-cloud generation) running as two concurrent tasks
//! bridged by bounded queues.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  record queue (100)  ┌───────────────┐
//! │ Capture Stage │─────────────────────▶│ Process Stage │
//! │ motor, lasers │                      │ segmentation, │
//! │ camera frames │                      │ triangulation │
//! └───────────────┘                      └───────┬───────┘
//!                                                │ increment queue (1000)
//!                                                ▼
//!                                        external consumer
//! ```
//!
//! Backpressure is blocking: a full queue suspends its producer, so a slow
//! consumer throttles the whole pipeline instead of losing data.
//! Cancellation is cooperative: `stop()` clears a shared flag both stages
//! observe within one polling interval (~100 ms), and the capture stage
//! always leaves the lasers off and the motor disabled on exit.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pipeline = ScanPipeline::new(board, camera, segmentation, generation);
//! pipeline.set_motor_step(0.45);
//! pipeline.set_completion_callback(|result| println!("scan: {result:?}"));
//! pipeline.start().await?;
//! while pipeline.is_scanning() {
//!     if let Some(chunk) = pipeline.get_point_cloud_increment() {
//!         cloud.extend(chunk.points);
//!     }
//! }
//! ```

mod capture;
pub mod config;
mod process;
pub mod pipeline;
mod session;

pub use config::ScanConfig;
pub use pipeline::{
    CompletionCallback, ScanPipeline, CAPTURE_QUEUE_CAPACITY, POINT_CLOUD_QUEUE_CAPACITY,
};
pub use session::ScanState;
