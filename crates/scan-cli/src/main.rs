//! Headless scan runner.
//!
//! Drives one full simulated scan (mock board, mock camera, reference
//! algorithms), reporting progress and point totals. Useful for exercising
//! the pipeline without a scanner attached:
//!
//! ```bash
//! turnscan --step 1.8 --move-delay-ms 2
//! turnscan --config scan.toml -v
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::{Format, Toml};
use figment::Figment;
use scan_algorithms::{MaxIntensitySegmentation, PlaneTriangulator, TriangulatorConfig};
use scan_driver_mock::{MockBoard, MockBoardConfig, MockCamera, MockCameraConfig};
use scan_engine::{ScanConfig, ScanPipeline};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "turnscan")]
#[command(about = "Run a simulated turntable scan with mock hardware", long_about = None)]
struct Cli {
    /// Scan configuration TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the motor step per capture, in degrees
    #[arg(long)]
    step: Option<f64>,

    /// Disable texture capture (uses the background color instead)
    #[arg(long)]
    no_texture: bool,

    /// Scan with the left laser only
    #[arg(long, conflicts_with = "right_only")]
    left_only: bool,

    /// Scan with the right laser only
    #[arg(long)]
    right_only: bool,

    /// Simulated motor move duration in milliseconds
    #[arg(long, default_value_t = 5)]
    move_delay_ms: u64,

    /// Camera frame width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Camera frame height in pixels
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    let config: ScanConfig = match path {
        Some(path) => Figment::new()
            .merge(Toml::file(path))
            .extract()
            .with_context(|| format!("failed to load scan config from {}", path.display()))?,
        None => ScanConfig::default(),
    };
    Ok(config)
}

fn apply_overrides(config: &mut ScanConfig, cli: &Cli) {
    if let Some(step) = cli.step {
        config.motor_step_deg = step;
    }
    if cli.no_texture {
        config.capture_texture = false;
    }
    if cli.left_only {
        config.lasers = [true, false];
    }
    if cli.right_only {
        config.lasers = [false, true];
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let board = Arc::new(MockBoard::with_config(MockBoardConfig {
        move_duration_ms: cli.move_delay_ms,
    }));
    let camera = Arc::new(MockCamera::with_config(MockCameraConfig {
        width: cli.width,
        height: cli.height,
    }));
    let triangulator = PlaneTriangulator::with_config(TriangulatorConfig {
        center_px: [cli.width as f64 / 2.0, cli.height as f64 / 2.0],
        ..TriangulatorConfig::default()
    });

    let pipeline = ScanPipeline::new(
        board,
        camera,
        Arc::new(MaxIntensitySegmentation::new()),
        Arc::new(triangulator),
    );
    pipeline.set_config(config);

    let (done_tx, mut done_rx) = oneshot::channel();
    pipeline.set_completion_callback(move |result| {
        let _ = done_tx.send(result);
    });

    let begin = Instant::now();
    pipeline.start().await?;

    let mut points = 0usize;
    let mut chunks = 0usize;
    let mut ticks = 0u32;
    let result: Result<()> = loop {
        while let Some(chunk) = pipeline.get_point_cloud_increment() {
            points += chunk.len();
            chunks += 1;
        }
        match done_rx.try_recv() {
            Ok(result) => break result.map_err(anyhow::Error::from),
            Err(oneshot::error::TryRecvError::Closed) => {
                anyhow::bail!("scan ended without reporting a result")
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }
        ticks += 1;
        if ticks % 10 == 0 {
            let (progress, range) = pipeline.get_progress();
            info!(progress, range, points, "scanning");
        }
        sleep(Duration::from_millis(100)).await;
    };
    while let Some(chunk) = pipeline.get_point_cloud_increment() {
        points += chunk.len();
        chunks += 1;
    }

    result.context("scan failed")?;
    info!(
        points,
        chunks,
        elapsed_ms = begin.elapsed().as_millis() as u64,
        "scan finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_config_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.motor_step_deg, ScanConfig::default().motor_step_deg);
    }

    #[test]
    fn config_file_is_loaded_and_merged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "motor_step_deg = 1.8\nbackground_color = [10, 20, 30]"
        )
        .unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.motor_step_deg, 1.8);
        assert_eq!(config.background_color, [10, 20, 30]);
        // unspecified fields keep their defaults
        assert!(config.capture_texture);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "motor_step_deg = \"fast\"").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn cli_overrides_apply() {
        let cli = Cli::parse_from(["turnscan", "--step", "0.9", "--no-texture", "--left-only"]);
        let mut config = ScanConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.motor_step_deg, 0.9);
        assert!(!config.capture_texture);
        assert_eq!(config.lasers, [true, false]);
    }
}
