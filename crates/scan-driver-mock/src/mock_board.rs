//! Mock turntable/laser control board.

use crate::fail::FailPlan;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use scan_core::capabilities::ScannerBoard;
use scan_core::data::LASER_COUNT;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Configuration for [`MockBoard`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockBoardConfig {
    /// Simulated execution time of one `motor_move` call in milliseconds
    /// (default: 0, instant moves for fast tests).
    #[serde(default)]
    pub move_duration_ms: u64,
}

/// Board operations that can be failure-injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardOp {
    LasersOff,
    MotorEnable,
    MotorDisable,
    MotorRelative,
    MotorSpeed,
    MotorAcceleration,
    MotorMove,
}

/// Mock scanner control board.
///
/// Tracks laser power, motor enablement and the accumulated commanded
/// position so tests can verify both the motion sequence and the
/// pipeline's cleanup guarantees.
pub struct MockBoard {
    config: MockBoardConfig,

    lasers_lit: [AtomicBool; LASER_COUNT],
    motor_enabled: AtomicBool,

    /// Executed position, accumulated by `motor_move`.
    position_deg: Mutex<f64>,
    /// Step queued by `motor_relative`, consumed by `motor_move`.
    pending_step_deg: Mutex<f64>,
    speed: Mutex<f64>,
    acceleration: Mutex<f64>,

    move_count: AtomicU32,
    lasers_off_count: AtomicU32,

    fail: FailPlan<BoardOp>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self::with_config(MockBoardConfig::default())
    }

    pub fn with_config(config: MockBoardConfig) -> Self {
        Self {
            config,
            lasers_lit: [AtomicBool::new(false), AtomicBool::new(false)],
            motor_enabled: AtomicBool::new(false),
            position_deg: Mutex::new(0.0),
            pending_step_deg: Mutex::new(0.0),
            speed: Mutex::new(0.0),
            acceleration: Mutex::new(0.0),
            move_count: AtomicU32::new(0),
            lasers_off_count: AtomicU32::new(0),
            fail: FailPlan::new(),
        }
    }

    /// Let `op` succeed `successes` more times, then fail every call.
    pub fn fail_after(&self, op: BoardOp, successes: u32) {
        self.fail.fail_after(op, successes);
    }

    /// Power a laser on, as the scanner's alignment commands would.
    pub fn laser_on(&self, index: usize) {
        if index < LASER_COUNT {
            self.lasers_lit[index].store(true, Ordering::Relaxed);
        }
    }

    pub fn lasers_are_off(&self) -> bool {
        self.lasers_lit.iter().all(|l| !l.load(Ordering::Relaxed))
    }

    pub fn motor_is_enabled(&self) -> bool {
        self.motor_enabled.load(Ordering::Relaxed)
    }

    /// Executed position in degrees.
    pub fn position(&self) -> f64 {
        *self.position_deg.lock()
    }

    pub fn speed(&self) -> f64 {
        *self.speed.lock()
    }

    pub fn acceleration(&self) -> f64 {
        *self.acceleration.lock()
    }

    /// Number of executed `motor_move` calls.
    pub fn moves_executed(&self) -> u32 {
        self.move_count.load(Ordering::Relaxed)
    }

    pub fn lasers_off_calls(&self) -> u32 {
        self.lasers_off_count.load(Ordering::Relaxed)
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScannerBoard for MockBoard {
    async fn lasers_off(&self) -> Result<()> {
        self.fail.check(BoardOp::LasersOff, "lasers_off")?;
        for laser in &self.lasers_lit {
            laser.store(false, Ordering::Relaxed);
        }
        self.lasers_off_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn motor_enable(&self) -> Result<()> {
        self.fail.check(BoardOp::MotorEnable, "motor_enable")?;
        self.motor_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn motor_disable(&self) -> Result<()> {
        self.fail.check(BoardOp::MotorDisable, "motor_disable")?;
        self.motor_enabled.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn motor_relative(&self, degrees: f64) -> Result<()> {
        self.fail.check(BoardOp::MotorRelative, "motor_relative")?;
        *self.pending_step_deg.lock() = degrees;
        Ok(())
    }

    async fn motor_speed(&self, value: f64) -> Result<()> {
        self.fail.check(BoardOp::MotorSpeed, "motor_speed")?;
        *self.speed.lock() = value;
        Ok(())
    }

    async fn motor_acceleration(&self, value: f64) -> Result<()> {
        self.fail.check(BoardOp::MotorAcceleration, "motor_acceleration")?;
        *self.acceleration.lock() = value;
        Ok(())
    }

    async fn motor_move(&self) -> Result<()> {
        self.fail.check(BoardOp::MotorMove, "motor_move")?;
        if !self.motor_enabled.load(Ordering::Relaxed) {
            anyhow::bail!("motor is not energized");
        }
        if self.config.move_duration_ms > 0 {
            sleep(Duration::from_millis(self.config.move_duration_ms)).await;
        }
        let step = *self.pending_step_deg.lock();
        let position = {
            let mut position = self.position_deg.lock();
            *position += step;
            *position
        };
        self.move_count.fetch_add(1, Ordering::Relaxed);
        debug!(step, position, "mock motor move");
        Ok(())
    }
}
