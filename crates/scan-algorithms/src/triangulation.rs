//! Lifting 2D stripe points into the turntable frame.

use anyhow::Result;
use nalgebra::{Rotation3, Vector3};
use scan_core::data::{StripePoint, LASER_COUNT};
use scan_core::PointCloudGeneration;
use serde::Deserialize;

pub type Real = f64;
pub type Vec3 = Vector3<Real>;

/// Camera intrinsics and laser geometry for [`PlaneTriangulator`].
///
/// The camera sits at the origin looking down +z; the turntable axis is the
/// vertical line through `(0, _, camera_distance)`. Each laser projects a
/// vertical plane through the axis at `±laser_angle_deg` from the optical
/// axis (laser 0 positive, laser 1 negative).
#[derive(Debug, Clone, Deserialize)]
pub struct TriangulatorConfig {
    /// Focal length in pixels.
    #[serde(default = "default_focal_px")]
    pub focal_px: f64,

    /// Principal point (cx, cy) in pixels.
    #[serde(default = "default_center_px")]
    pub center_px: [f64; 2],

    /// Distance from the camera to the turntable axis, in millimeters.
    #[serde(default = "default_camera_distance")]
    pub camera_distance_mm: f64,

    /// Angle between the optical axis and each laser plane, in degrees.
    #[serde(default = "default_laser_angle")]
    pub laser_angle_deg: f64,
}

fn default_focal_px() -> f64 {
    800.0
}

fn default_center_px() -> [f64; 2] {
    [320.0, 240.0]
}

fn default_camera_distance() -> f64 {
    300.0
}

fn default_laser_angle() -> f64 {
    30.0
}

impl Default for TriangulatorConfig {
    fn default() -> Self {
        Self {
            focal_px: default_focal_px(),
            center_px: default_center_px(),
            camera_distance_mm: default_camera_distance(),
            laser_angle_deg: default_laser_angle(),
        }
    }
}

impl TriangulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.focal_px <= 0.0 {
            anyhow::bail!("focal length must be positive");
        }
        if self.camera_distance_mm <= 0.0 {
            anyhow::bail!("camera distance must be positive");
        }
        if self.laser_angle_deg == 0.0 || self.laser_angle_deg.abs() >= 90.0 {
            anyhow::bail!(
                "laser angle {} deg must be non-zero and below 90",
                self.laser_angle_deg
            );
        }
        Ok(())
    }
}

/// Pinhole back-projection onto the laser plane.
///
/// Each stripe pixel defines a viewing ray; the ray is intersected with the
/// laser's plane, translated so the turntable axis becomes the origin
/// (y up), and rotated by `-theta` so points land in the turntable frame
/// regardless of the rotation at capture time.
pub struct PlaneTriangulator {
    config: TriangulatorConfig,
}

impl PlaneTriangulator {
    pub fn new() -> Self {
        Self::with_config(TriangulatorConfig::default())
    }

    pub fn with_config(config: TriangulatorConfig) -> Self {
        Self { config }
    }
}

impl Default for PlaneTriangulator {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudGeneration for PlaneTriangulator {
    fn compute_point_cloud(
        &self,
        theta: f64,
        points: &[StripePoint],
        laser_index: usize,
    ) -> Result<Vec<[f32; 3]>> {
        if laser_index >= LASER_COUNT {
            anyhow::bail!("laser index {} out of range", laser_index);
        }
        let cfg = &self.config;
        let alpha = if laser_index == 0 {
            cfg.laser_angle_deg.to_radians()
        } else {
            -cfg.laser_angle_deg.to_radians()
        };
        let axis_point = Vec3::new(0.0, 0.0, cfg.camera_distance_mm);
        // plane through the axis spanned by the vertical and the in-plane
        // laser direction (sin a, 0, cos a)
        let normal = Vec3::new(alpha.cos(), 0.0, -alpha.sin());
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), -theta);
        let [cx, cy] = cfg.center_px;

        let mut cloud = Vec::with_capacity(points.len());
        for p in points {
            let ray = Vec3::new(
                (p.u as f64 - cx) / cfg.focal_px,
                (p.v as f64 - cy) / cfg.focal_px,
                1.0,
            );
            let denom = normal.dot(&ray);
            if denom.abs() < 1e-5 {
                anyhow::bail!("stripe ray at row {} is parallel to the laser plane", p.v);
            }
            let t = normal.dot(&axis_point) / denom;
            let hit = ray * t - axis_point;
            // image y grows downward; the turntable frame is y-up
            let local = Vec3::new(hit.x, -hit.y, hit.z);
            let world = rotation * local;
            cloud.push([world.x as f32, world.y as f32, world.z as f32]);
        }
        Ok(cloud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangulator() -> PlaneTriangulator {
        PlaneTriangulator::with_config(TriangulatorConfig {
            focal_px: 100.0,
            center_px: [8.0, 6.0],
            camera_distance_mm: 200.0,
            laser_angle_deg: 30.0,
        })
    }

    fn assert_close(value: f32, expected: f64) {
        assert!(
            (value as f64 - expected).abs() < 1e-3,
            "value {value} expected {expected}"
        );
    }

    #[test]
    fn output_aligned_with_input() {
        let tri = triangulator();
        let points: Vec<StripePoint> = (0..5).map(|v| StripePoint { u: 4.0, v }).collect();
        let cloud = tri.compute_point_cloud(0.3, &points, 0).unwrap();
        assert_eq!(cloud.len(), points.len());
    }

    #[test]
    fn principal_column_lands_on_axis() {
        let tri = triangulator();
        let cloud = tri
            .compute_point_cloud(0.0, &[StripePoint { u: 8.0, v: 0 }], 0)
            .unwrap();
        let [x, y, z] = cloud[0];
        assert_close(x, 0.0);
        assert_close(y, 12.0); // (cy - v) / f * distance
        assert_close(z, 0.0);
    }

    #[test]
    fn axis_points_are_rotation_invariant() {
        let tri = triangulator();
        let p = StripePoint { u: 8.0, v: 2 };
        let at_zero = tri.compute_point_cloud(0.0, &[p], 0).unwrap()[0];
        let at_one = tri.compute_point_cloud(1.0, &[p], 0).unwrap()[0];
        for (a, b) in at_zero.iter().zip(at_one.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn off_axis_point_matches_plane_intersection() {
        let tri = triangulator();
        let p = StripePoint { u: -42.0, v: 6 }; // u - cx = -50
        let cloud = tri.compute_point_cloud(0.0, &[p], 0).unwrap();
        let [x, y, z] = cloud[0];
        assert_close(x, -53.5898);
        assert_close(y, 0.0);
        assert_close(z, -92.8203);

        // quarter turn rotates the same hit into the turntable frame
        let rotated = tri
            .compute_point_cloud(std::f64::consts::FRAC_PI_2, &[p], 0)
            .unwrap();
        let [rx, ry, rz] = rotated[0];
        assert_close(rx, 92.8203);
        assert_close(ry, 0.0);
        assert_close(rz, -53.5898);
    }

    #[test]
    fn lasers_mirror_each_other() {
        let tri = triangulator();
        let p = StripePoint { u: 8.0, v: 6 };
        let left = tri.compute_point_cloud(0.0, &[p], 0).unwrap()[0];
        let right = tri.compute_point_cloud(0.0, &[p], 1).unwrap()[0];
        // the axis ray hits both planes on the axis itself
        assert_close(left[0], right[0] as f64);
        assert_close(left[2], right[2] as f64);
    }

    #[test]
    fn invalid_laser_index_is_rejected() {
        let tri = triangulator();
        assert!(tri
            .compute_point_cloud(0.0, &[StripePoint { u: 1.0, v: 0 }], 2)
            .is_err());
    }

    #[test]
    fn parallel_ray_is_rejected() {
        let tri = triangulator();
        // u - cx = f * tan(30 deg) makes the ray parallel to the left plane
        let u = 8.0 + 100.0 * (30.0f64).to_radians().tan();
        let result = tri.compute_point_cloud(0.0, &[StripePoint { u: u as f32, v: 6 }], 0);
        assert!(result.is_err());
    }

    #[test]
    fn config_validation() {
        assert!(TriangulatorConfig::default().validate().is_ok());
        let bad = TriangulatorConfig {
            laser_angle_deg: 0.0,
            ..TriangulatorConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
