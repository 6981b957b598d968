//! Scanning pipeline controller.
//!
//! [`ScanPipeline`] owns the collaborator handles and the per-scan session;
//! it is constructed explicitly by the caller (GUI or CLI) and passed by
//! reference wherever it is needed. There is no global instance.

use crate::capture::CaptureStage;
use crate::config::ScanConfig;
use crate::process::ProcessStage;
use crate::session::{ScanState, Session};
use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use scan_core::capabilities::{
    ImageSource, LaserSegmentation, NullPreview, PointCloudGeneration, PreviewSink, ScannerBoard,
};
use scan_core::data::PointCloudChunk;
use scan_core::error::{ScanError, ScanResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::info;

/// Capacity of the record queue bridging capture to processing.
pub const CAPTURE_QUEUE_CAPACITY: usize = 100;

/// Capacity of the increment queue drained by the external consumer.
pub const POINT_CLOUD_QUEUE_CAPACITY: usize = 1000;

/// Settle time after configuring the motor, before the first step.
const MOTOR_SETTLE: Duration = Duration::from_millis(100);

/// Invoked exactly once per scan session.
pub type CompletionCallback = Box<dyn FnOnce(ScanResult<()>) + Send + 'static>;

/// The scanning pipeline: two stage tasks bridged by bounded queues.
///
/// Configuration setters apply to the next `start()`; mutating them while
/// a scan is active is disallowed and has no effect on the running session.
pub struct ScanPipeline {
    board: Arc<dyn ScannerBoard>,
    camera: Arc<dyn ImageSource>,
    segmentation: Arc<dyn LaserSegmentation>,
    generation: Arc<dyn PointCloudGeneration>,
    preview: Arc<dyn PreviewSink>,

    config: RwLock<ScanConfig>,
    session: RwLock<Option<Arc<Session>>>,
    increments: Mutex<Option<mpsc::Receiver<PointCloudChunk>>>,
    callback: Mutex<Option<CompletionCallback>>,
    tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl ScanPipeline {
    pub fn new(
        board: Arc<dyn ScannerBoard>,
        camera: Arc<dyn ImageSource>,
        segmentation: Arc<dyn LaserSegmentation>,
        generation: Arc<dyn PointCloudGeneration>,
    ) -> Self {
        Self {
            board,
            camera,
            segmentation,
            generation,
            preview: Arc::new(NullPreview),
            config: RwLock::new(ScanConfig::default()),
            session: RwLock::new(None),
            increments: Mutex::new(None),
            callback: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Attach a live-preview sink. Applies to the next `start()`.
    pub fn set_preview(&mut self, preview: Arc<dyn PreviewSink>) {
        self.preview = preview;
    }

    // -------------------------------------------------------------------------
    // Pre-scan configuration
    // -------------------------------------------------------------------------

    pub fn set_config(&self, config: ScanConfig) {
        *self.config.write() = config;
    }

    pub fn config(&self) -> ScanConfig {
        self.config.read().clone()
    }

    pub fn set_capture_texture(&self, value: bool) {
        self.config.write().capture_texture = value;
    }

    pub fn set_use_left_laser(&self, value: bool) {
        self.config.write().lasers[0] = value;
    }

    pub fn set_use_right_laser(&self, value: bool) {
        self.config.write().lasers[1] = value;
    }

    pub fn set_move_motor(&self, value: bool) {
        self.config.write().move_motor = value;
    }

    pub fn set_motor_step(&self, degrees: f64) {
        self.config.write().motor_step_deg = degrees;
    }

    pub fn set_motor_speed(&self, value: f64) {
        self.config.write().motor_speed = value;
    }

    pub fn set_motor_acceleration(&self, value: f64) {
        self.config.write().motor_acceleration = value;
    }

    pub fn set_background_color(&self, rgb: [u8; 3]) {
        self.config.write().background_color = rgb;
    }

    /// Register the completion callback for the next scan session.
    ///
    /// Delivered exactly once, with `Ok(())` after a full rotation or the
    /// terminating [`ScanError`] otherwise.
    pub fn set_completion_callback<F>(&self, callback: F)
    where
        F: FnOnce(ScanResult<()>) + Send + 'static,
    {
        *self.callback.lock() = Some(Box::new(callback));
    }

    // -------------------------------------------------------------------------
    // Control surface
    // -------------------------------------------------------------------------

    /// Reset state, set up the hardware and launch both stage tasks.
    ///
    /// Fails without spawning anything (and without invoking the completion
    /// callback) when a scan is already active, the configuration is
    /// invalid, or the hardware setup sequence errors.
    pub async fn start(&self) -> Result<()> {
        if self.is_scanning() {
            anyhow::bail!("cannot start: scan already active");
        }
        let config = self.config.read().clone();
        config.validate()?;

        // wait out the previous session's tasks so their hardware cleanup
        // cannot interleave with this session's setup
        let finished: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in finished {
            let _ = task.await;
        }

        // scanner setup, as one sequence before any task runs
        self.camera.set_stream(false);
        self.board.lasers_off().await.map_err(hardware_error)?;
        if config.move_motor {
            self.board.motor_enable().await.map_err(hardware_error)?;
            self.board
                .motor_relative(config.motor_step_deg)
                .await
                .map_err(hardware_error)?;
            self.board
                .motor_speed(config.motor_speed)
                .await
                .map_err(hardware_error)?;
            self.board
                .motor_acceleration(config.motor_acceleration)
                .await
                .map_err(hardware_error)?;
            sleep(MOTOR_SETTLE).await;
        } else {
            self.board.motor_disable().await.map_err(hardware_error)?;
        }

        // fresh queues and session per scan: increments from a previous
        // scan are discarded, stale tasks keep their own dead session
        let (record_tx, record_rx) = mpsc::channel(CAPTURE_QUEUE_CAPACITY);
        let (chunk_tx, chunk_rx) = mpsc::channel(POINT_CLOUD_QUEUE_CAPACITY);
        let session = Session::new();
        let callback = self.callback.lock().take();

        *self.increments.lock() = Some(chunk_rx);
        *self.session.write() = Some(session.clone());

        info!(
            step_deg = config.motor_step_deg,
            move_motor = config.move_motor,
            lasers = ?config.lasers,
            "starting scan"
        );

        let capture = tokio::spawn(
            CaptureStage {
                board: self.board.clone(),
                camera: self.camera.clone(),
                preview: self.preview.clone(),
                session: session.clone(),
                config: config.clone(),
                records: record_tx,
            }
            .run(),
        );
        let process = tokio::spawn(
            ProcessStage {
                camera: self.camera.clone(),
                segmentation: self.segmentation.clone(),
                generation: self.generation.clone(),
                preview: self.preview.clone(),
                cancel: session.subscribe(),
                session,
                records: record_rx,
                chunks: chunk_tx,
                callback,
            }
            .run(),
        );
        *self.tasks.lock() = vec![capture, process];
        Ok(())
    }

    /// Request a stop; both stages observe it within one polling interval
    /// and exit after cleanup. Idempotent.
    pub fn stop(&self) {
        if let Some(session) = self.session.read().as_ref() {
            if session.is_scanning() {
                info!("stop requested");
            }
            session.request_stop();
        }
    }

    /// Suspend frame production; the stage tasks keep running.
    pub fn pause(&self) -> Result<()> {
        let guard = self.session.read();
        match guard.as_ref() {
            Some(session) if session.is_scanning() => {
                session.set_inactive(true);
                Ok(())
            }
            _ => anyhow::bail!("cannot pause: scanner is idle"),
        }
    }

    /// Resume frame production after a pause.
    pub fn resume(&self) -> Result<()> {
        let guard = self.session.read();
        match guard.as_ref() {
            Some(session) if session.is_scanning() => {
                session.set_inactive(false);
                Ok(())
            }
            _ => anyhow::bail!("cannot resume: scanner is idle"),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.session
            .read()
            .as_ref()
            .is_some_and(|s| s.is_scanning())
    }

    pub fn state(&self) -> ScanState {
        match self.session.read().as_ref() {
            Some(session) if session.is_scanning() => {
                if session.is_inactive() {
                    ScanState::Paused
                } else {
                    ScanState::Scanning
                }
            }
            _ => ScanState::Idle,
        }
    }

    // -------------------------------------------------------------------------
    // Polling surface
    // -------------------------------------------------------------------------

    /// `(progress, range)` snapshot for UI display.
    ///
    /// Stale single-field reads are acceptable; no cross-field consistency
    /// is guaranteed.
    pub fn get_progress(&self) -> (f64, f64) {
        match self.session.read().as_ref() {
            Some(session) => {
                let progress = session.progress();
                (progress.progress, progress.range)
            }
            None => (0.0, 0.0),
        }
    }

    /// Pop the oldest unread increment, or `None` when the queue is empty.
    ///
    /// Never blocks; increments remaining after completion stay drainable
    /// until the next `start()`.
    pub fn get_point_cloud_increment(&self) -> Option<PointCloudChunk> {
        self.increments.lock().as_mut()?.try_recv().ok()
    }
}

fn hardware_error(error: anyhow::Error) -> ScanError {
    ScanError::HardwareComm(error.to_string())
}
