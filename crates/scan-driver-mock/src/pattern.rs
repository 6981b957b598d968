//! Synthetic frame generation for the mock camera.

use scan_core::data::Frame;

/// Simple pseudo-random number generator (LCG) for reproducible noise.
#[inline]
fn prng(seed: u64) -> u64 {
    seed.wrapping_mul(1103515245).wrapping_add(12345) & 0x7fff_ffff
}

/// Generate an RGB texture frame: diagonal gradient with mild per-frame
/// noise so successive frames are distinguishable.
pub fn texture_frame(width: u32, height: u32, frame_num: u64) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    let w = width.max(2) as u64;
    let h = height.max(2) as u64;
    for y in 0..height as u64 {
        for x in 0..width as u64 {
            let r = (x * 255 / (w - 1)) as u8;
            let g = (y * 255 / (h - 1)) as u8;
            let noise = prng(frame_num ^ (y * w + x)) % 32;
            let b = (96 + noise) as u8;
            data.extend_from_slice(&[r, g, b]);
        }
    }
    Frame::from_rgb(width, height, data)
}

/// Column of the simulated laser line for the given laser and frame.
///
/// Laser 0 projects left of the image center, laser 1 right; a slow
/// sinusoidal sway imitates the profile of a rotating object.
pub fn stripe_column(width: u32, laser_index: usize, frame_num: u64) -> f64 {
    let w = width as f64;
    let center = w / 2.0;
    let side = if laser_index == 0 { -1.0 } else { 1.0 };
    let sway = (frame_num as f64 * 0.1).sin() * w * 0.05;
    (center + side * w * 0.15 + sway).clamp(1.0, w - 2.0)
}

/// Generate a stripe frame: dark field with one bright red vertical line.
///
/// The line has a triangular intensity falloff over ~2.5 px so sub-pixel
/// segmentation has a real centroid to find.
pub fn stripe_frame(width: u32, height: u32, column: f64) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let distance = (x as f64 - column).abs();
            if distance < 2.5 {
                let lum = (255.0 * (1.0 - distance / 2.5)) as u8;
                data.extend_from_slice(&[lum, lum / 3, lum / 3]);
            } else {
                let floor = (prng((y as u64) << 16 | x as u64) % 8) as u8;
                data.extend_from_slice(&[floor, floor, floor]);
            }
        }
    }
    Frame::from_rgb(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripe_peak_sits_on_the_requested_column() {
        let frame = stripe_frame(32, 4, 10.0);
        for y in 0..4 {
            let brightest = (0..32)
                .max_by_key(|&x| frame.luma_at(x, y).unwrap_or(0))
                .unwrap();
            assert_eq!(brightest, 10);
        }
    }

    #[test]
    fn stripe_column_stays_inside_the_frame() {
        for frame_num in 0..500 {
            for laser in 0..2 {
                let col = stripe_column(64, laser, frame_num);
                assert!(col >= 1.0 && col <= 62.0, "column {col}");
            }
        }
    }

    #[test]
    fn lasers_project_on_opposite_sides() {
        let left = stripe_column(64, 0, 0);
        let right = stripe_column(64, 1, 0);
        assert!(left < 32.0);
        assert!(right > 32.0);
    }

    #[test]
    fn texture_frame_has_expected_shape() {
        let frame = texture_frame(16, 8, 3);
        assert_eq!(frame.data.len(), 16 * 8 * 3);
        // gradient: right edge redder than left edge
        let left = frame.rgb_at(0, 4).unwrap();
        let right = frame.rgb_at(15, 4).unwrap();
        assert!(right[0] > left[0]);
    }
}
