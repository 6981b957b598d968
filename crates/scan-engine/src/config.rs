//! Pre-scan configuration.

use anyhow::Result;
use scan_core::data::LASER_COUNT;
use serde::Deserialize;

/// Configuration applied before a scan starts.
///
/// The stages read a snapshot taken at `start()`; mutating the
/// configuration while a scan is active does not affect the running
/// session and is disallowed.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Capture a real texture frame per step; when off, a solid
    /// `background_color` frame is used instead.
    #[serde(default = "default_true")]
    pub capture_texture: bool,

    /// Per-laser enablement (left, right).
    #[serde(default = "default_lasers")]
    pub lasers: [bool; LASER_COUNT],

    /// Drive the turntable motor; when off, capture is paced by a fixed
    /// sleep and the motor stays disabled.
    #[serde(default = "default_true")]
    pub move_motor: bool,

    /// Turntable step per capture, in degrees (signed, non-zero).
    #[serde(default = "default_motor_step")]
    pub motor_step_deg: f64,

    /// Motor speed for the session.
    #[serde(default = "default_motor_speed")]
    pub motor_speed: f64,

    /// Motor acceleration for the session.
    #[serde(default = "default_motor_acceleration")]
    pub motor_acceleration: f64,

    /// Texture color used when `capture_texture` is off.
    #[serde(default)]
    pub background_color: [u8; 3],
}

fn default_true() -> bool {
    true
}

fn default_lasers() -> [bool; LASER_COUNT] {
    [true; LASER_COUNT]
}

fn default_motor_step() -> f64 {
    0.45
}

fn default_motor_speed() -> f64 {
    200.0
}

fn default_motor_acceleration() -> f64 {
    200.0
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            capture_texture: true,
            lasers: default_lasers(),
            move_motor: true,
            motor_step_deg: default_motor_step(),
            motor_speed: default_motor_speed(),
            motor_acceleration: default_motor_acceleration(),
            background_color: [0, 0, 0],
        }
    }
}

impl ScanConfig {
    /// Steps in a full rotation, `|360 / motor_step|`.
    pub fn step_range(&self) -> f64 {
        (360.0 / self.motor_step_deg).abs()
    }

    pub fn validate(&self) -> Result<()> {
        if self.motor_step_deg == 0.0 || !self.motor_step_deg.is_finite() {
            anyhow::bail!(
                "motor step must be a non-zero angle, got {}",
                self.motor_step_deg
            );
        }
        if self.motor_speed <= 0.0 {
            anyhow::bail!("motor speed must be positive");
        }
        if self.motor_acceleration <= 0.0 {
            anyhow::bail!("motor acceleration must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.capture_texture);
        assert_eq!(config.lasers, [true, true]);
        assert_eq!(config.step_range(), 800.0);
    }

    #[test]
    fn zero_step_is_rejected() {
        let config = ScanConfig {
            motor_step_deg: 0.0,
            ..ScanConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_step_is_allowed() {
        let config = ScanConfig {
            motor_step_deg: -1.8,
            ..ScanConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.step_range(), 200.0);
    }

    #[test]
    fn deserializes_from_partial_toml() {
        let config: ScanConfig = toml::from_str(
            r#"
            motor_step_deg = 1.8
            background_color = [10, 20, 30]
            "#,
        )
        .unwrap();
        assert_eq!(config.motor_step_deg, 1.8);
        assert_eq!(config.background_color, [10, 20, 30]);
        assert!(config.move_motor);
    }
}
