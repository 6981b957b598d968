//! Capture stage: drives the turntable and lasers, assembles records.

use crate::config::ScanConfig;
use crate::session::Session;
use scan_core::capabilities::{ImageSource, PreviewSink, ScannerBoard};
use scan_core::data::{Frame, ScanCapture, LASER_COUNT};
use scan_core::error::{ScanError, ScanResult};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Sleep while the session is paused before re-checking.
const INACTIVE_POLL: Duration = Duration::from_millis(100);

/// Pacing sleep per step when the motor is not driven.
const NO_MOTOR_PACE: Duration = Duration::from_millis(50);

pub(crate) struct CaptureStage {
    pub board: Arc<dyn ScannerBoard>,
    pub camera: Arc<dyn ImageSource>,
    pub preview: Arc<dyn PreviewSink>,
    pub session: Arc<Session>,
    pub config: ScanConfig,
    pub records: mpsc::Sender<ScanCapture>,
}

impl CaptureStage {
    pub async fn run(self) {
        if let Err(error) = self.run_loop().await {
            warn!(%error, "capture stage failed");
            self.session.fail(error);
        }

        // cleanup runs on every exit path
        if let Err(error) = self.board.lasers_off().await {
            warn!(%error, "failed to switch lasers off after capture");
        }
        if let Err(error) = self.board.motor_disable().await {
            warn!(%error, "failed to disable motor after capture");
        }
        debug!("capture stage exited");
    }

    async fn run_loop(&self) -> ScanResult<()> {
        let mut cancel = self.session.subscribe();
        let step_rad = self.config.motor_step_deg.to_radians();

        while self.session.is_scanning() {
            if self.session.is_inactive() {
                self.camera.set_stream(true);
                sleep(INACTIVE_POLL).await;
                continue;
            }

            let theta = self.session.theta();
            if theta.abs() > TAU {
                // leave the stream flag to the process stage's completion
                // path, which re-enables it last
                break;
            }
            self.camera.set_stream(false);

            let begin = Instant::now();
            let record = self.capture_record(theta).await?;

            if self.config.move_motor {
                self.board
                    .motor_relative(self.config.motor_step_deg)
                    .await
                    .map_err(hardware_error)?;
                self.board.motor_move().await.map_err(hardware_error)?;
            } else {
                sleep(NO_MOTOR_PACE).await;
            }

            // Enqueue before publishing the advanced angle: once the process
            // stage observes a full rotation, every completed step's record
            // is already in the queue. A full queue blocks here, throttling
            // acquisition instead of dropping data.
            tokio::select! {
                sent = self.records.send(record) => {
                    if sent.is_err() {
                        break;
                    }
                }
                _ = cancel.wait_for(|scanning| !*scanning) => break,
            }

            self.session
                .update_progress(theta + step_rad, self.config.motor_step_deg);
            debug!(
                elapsed_ms = begin.elapsed().as_millis() as u64,
                theta, "capture step"
            );
        }
        Ok(())
    }

    async fn capture_record(&self, theta: f64) -> ScanResult<ScanCapture> {
        let texture = if self.config.capture_texture {
            self.camera
                .capture_texture()
                .await
                .map_err(capture_error)?
        } else {
            let (width, height) = self.camera.resolution();
            Frame::solid(width, height, self.config.background_color)
        };

        let mut lasers: [Option<Frame>; LASER_COUNT] = [None, None];
        for (index, enabled) in self.config.lasers.iter().enumerate() {
            if *enabled {
                lasers[index] = Some(
                    self.camera
                        .capture_laser(index)
                        .await
                        .map_err(capture_error)?,
                );
            }
        }

        self.preview.set_texture(&texture);
        self.preview.set_laser_frames(&lasers);

        Ok(ScanCapture {
            theta,
            texture,
            lasers,
        })
    }
}

fn hardware_error(error: anyhow::Error) -> ScanError {
    ScanError::HardwareComm(error.to_string())
}

fn capture_error(error: anyhow::Error) -> ScanError {
    ScanError::Capture(error.to_string())
}
