//! Error types for a scan session.

use thiserror::Error;

/// Convenience alias for results using the scan error type.
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Primary error type for a scan session.
///
/// Every non-nominal scan exit produces exactly one of these through the
/// completion callback. Hardware and capture errors are not retried by the
/// pipeline; they terminate the active scan after cleanup (lasers off,
/// motor disabled, streaming re-enabled).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The session was stopped externally before completing a full rotation.
    #[error("scan aborted before completing a full rotation")]
    Aborted,

    /// A motor/laser controller call failed.
    #[error("hardware communication error: {0}")]
    HardwareComm(String),

    /// Camera frame acquisition failed.
    #[error("frame capture error: {0}")]
    Capture(String),

    /// Laser segmentation or point-cloud generation failed.
    #[error("processing error: {0}")]
    Processing(String),
}
