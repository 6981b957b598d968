//! Process stage: turns records into point-cloud increments.

use crate::pipeline::CompletionCallback;
use crate::session::Session;
use scan_core::capabilities::{ImageSource, LaserSegmentation, PointCloudGeneration, PreviewSink};
use scan_core::data::{Frame, PointCloudChunk, ScanCapture, StripePoint, LASER_COUNT};
use scan_core::error::{ScanError, ScanResult};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Sleep while the session is paused before re-checking.
const INACTIVE_POLL: Duration = Duration::from_millis(100);

/// Bounded wait for the next record, so the scanning flag is re-checked
/// regularly even when the capture stage has stopped producing.
const QUEUE_POLL: Duration = Duration::from_millis(100);

pub(crate) struct ProcessStage {
    pub camera: Arc<dyn ImageSource>,
    pub segmentation: Arc<dyn LaserSegmentation>,
    pub generation: Arc<dyn PointCloudGeneration>,
    pub preview: Arc<dyn PreviewSink>,
    pub session: Arc<Session>,
    pub records: mpsc::Receiver<ScanCapture>,
    pub chunks: mpsc::Sender<PointCloudChunk>,
    pub cancel: watch::Receiver<bool>,
    pub callback: Option<CompletionCallback>,
}

impl ProcessStage {
    pub async fn run(mut self) {
        let completed = match self.run_loop().await {
            Ok(completed) => completed,
            Err(error) => {
                warn!(%error, "process stage failed");
                self.session.fail(error);
                false
            }
        };
        self.session.request_stop();
        self.camera.set_stream(true);

        let result = if completed {
            info!("scan completed");
            Ok(())
        } else {
            let error = self.session.take_error().unwrap_or(ScanError::Aborted);
            warn!(%error, "scan ended early");
            Err(error)
        };
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
        debug!("process stage exited");
    }

    /// Returns `Ok(true)` when a full rotation was reached.
    async fn run_loop(&mut self) -> ScanResult<bool> {
        while self.session.is_scanning() {
            if self.session.is_inactive() {
                self.camera.set_stream(true);
                sleep(INACTIVE_POLL).await;
                continue;
            }
            self.camera.set_stream(false);

            if self.session.theta().abs() > TAU {
                // Rotation finished; the capture stage enqueued every
                // record before publishing the final angle, so whatever is
                // still queued belongs to completed steps.
                while let Ok(record) = self.records.try_recv() {
                    self.process_record(record).await?;
                }
                return Ok(true);
            }

            match timeout(QUEUE_POLL, self.records.recv()).await {
                Ok(Some(record)) => self.process_record(record).await?,
                // Sender gone; the loop conditions resolve on the next pass.
                Ok(None) => sleep(QUEUE_POLL).await,
                // Timed out; re-check the scanning flag.
                Err(_) => {}
            }
        }
        Ok(false)
    }

    async fn process_record(&mut self, record: ScanCapture) -> ScanResult<()> {
        let begin = Instant::now();
        let mut overlays: [Option<Frame>; LASER_COUNT] = [None, None];

        for index in 0..LASER_COUNT {
            let Some(stripe) = &record.lasers[index] else {
                continue;
            };
            let (points_2d, overlay) = self
                .segmentation
                .compute_2d_points(stripe)
                .map_err(processing_error)?;
            let points = self
                .generation
                .compute_point_cloud(record.theta, &points_2d, index)
                .map_err(processing_error)?;
            let colors = sample_colors(&record.texture, &points_2d);
            overlays[index] = Some(overlay);

            let chunk = PointCloudChunk { points, colors };
            // A full queue blocks until the consumer drains; backpressure
            // propagates to the capture stage through the record queue.
            tokio::select! {
                sent = self.chunks.send(chunk) => {
                    if sent.is_err() {
                        return Ok(());
                    }
                }
                _ = self.cancel.wait_for(|scanning| !*scanning) => return Ok(()),
            }
        }

        self.preview.set_overlay_frames(&overlays);
        debug!(
            elapsed_ms = begin.elapsed().as_millis() as u64,
            theta = record.theta,
            "processed record"
        );
        Ok(())
    }
}

/// Sample the record texture at each stripe point, clamped to the frame.
fn sample_colors(texture: &Frame, points: &[StripePoint]) -> Vec<[u8; 3]> {
    points
        .iter()
        .map(|p| {
            let x = (p.u.round().max(0.0) as u32).min(texture.width.saturating_sub(1));
            let y = p.v.min(texture.height.saturating_sub(1));
            texture.rgb_at(x, y).unwrap_or([0, 0, 0])
        })
        .collect()
}

fn processing_error(error: anyhow::Error) -> ScanError {
    ScanError::Processing(error.to_string())
}
