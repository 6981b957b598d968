//! Shared per-scan session state.

use parking_lot::{Mutex, RwLock};
use scan_core::data::Progress;
use scan_core::error::ScanError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Externally visible pipeline state.
///
/// Scanning and Paused both keep both stage tasks alive; only Idle has no
/// tasks running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No scan active.
    Idle,
    /// Both stages running, records being produced.
    Scanning,
    /// Both stages alive but inactive; no records are produced.
    Paused,
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Idle => write!(f, "idle"),
            ScanState::Scanning => write!(f, "scanning"),
            ScanState::Paused => write!(f, "paused"),
        }
    }
}

/// State shared between the two stage tasks and the controller for one scan.
///
/// A fresh session is created per `start()`, so tasks left over from a
/// stopped scan can never observe a later session's flags or queues.
pub(crate) struct Session {
    /// Cooperative cancellation flag; both stages observe a cleared flag
    /// within one polling interval.
    scanning: watch::Sender<bool>,

    /// Paused state: stages keep running but produce nothing.
    inactive: AtomicBool,

    /// Progress snapshot, written by the capture stage only.
    progress: RwLock<Progress>,

    /// First error recorded by either stage; reported once via the
    /// completion callback.
    error: Mutex<Option<ScanError>>,
}

impl Session {
    pub fn new() -> Arc<Self> {
        let (scanning, _) = watch::channel(true);
        Arc::new(Self {
            scanning,
            inactive: AtomicBool::new(false),
            progress: RwLock::new(Progress::default()),
            error: Mutex::new(None),
        })
    }

    pub fn is_scanning(&self) -> bool {
        *self.scanning.borrow()
    }

    /// Subscribe for cancellation-raced blocking operations.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.scanning.subscribe()
    }

    pub fn request_stop(&self) {
        self.scanning.send_replace(false);
    }

    pub fn set_inactive(&self, inactive: bool) {
        self.inactive.store(inactive, Ordering::Relaxed);
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive.load(Ordering::Relaxed)
    }

    /// Record the first error and stop the session.
    pub fn fail(&self, error: ScanError) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
        drop(slot);
        self.request_stop();
    }

    pub fn take_error(&self) -> Option<ScanError> {
        self.error.lock().take()
    }

    pub fn theta(&self) -> f64 {
        self.progress.read().theta
    }

    pub fn progress(&self) -> Progress {
        *self.progress.read()
    }

    /// Publish the advanced angle and the derived progress metrics.
    pub fn update_progress(&self, theta: f64, motor_step_deg: f64) {
        let mut snapshot = self.progress.write();
        snapshot.theta = theta;
        if motor_step_deg != 0.0 {
            snapshot.progress = (theta.to_degrees() / motor_step_deg).abs();
            snapshot.range = (360.0 / motor_step_deg).abs();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_display() {
        assert_eq!(ScanState::Idle.to_string(), "idle");
        assert_eq!(ScanState::Scanning.to_string(), "scanning");
        assert_eq!(ScanState::Paused.to_string(), "paused");
    }

    #[test]
    fn first_error_wins() {
        let session = Session::new();
        session.fail(ScanError::Capture("camera gone".into()));
        session.fail(ScanError::Aborted);
        assert!(!session.is_scanning());
        assert_eq!(
            session.take_error(),
            Some(ScanError::Capture("camera gone".into()))
        );
        assert_eq!(session.take_error(), None);
    }

    #[test]
    fn progress_tracks_step() {
        let session = Session::new();
        let step = 1.8f64;
        session.update_progress(step.to_radians() * 10.0, step);
        let progress = session.progress();
        assert!((progress.progress - 10.0).abs() < 1e-9);
        assert!((progress.range - 200.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn stop_wakes_subscribers() {
        let session = Session::new();
        let mut rx = session.subscribe();
        session.request_stop();
        rx.wait_for(|scanning| !*scanning).await.unwrap();
        assert!(!session.is_scanning());
    }
}
