//! Probabilistic line-segment extraction
//!
//! Progressive probabilistic Hough transform over a binary edge map.
//! Edge points are visited in a deterministic shuffled order; each point
//! votes across all line angles, and once a candidate line collects enough
//! votes its full extent is traced pixel by pixel with gap tolerance.
//! Pixels consumed by an accepted segment are removed from the pool and
//! their votes retracted, so overlapping lines do not double-report.

use image::GrayImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Angular resolution: one accumulator bin per degree
const THETA_STEPS: usize = 180;

/// Line-segment extraction parameters
#[derive(Debug, Clone, Deserialize)]
pub struct HoughParams {
    /// Accumulator votes required before a candidate line is traced
    pub threshold: i32,
    /// Minimum accepted segment length in pixels
    pub min_length: f32,
    /// Maximum run of non-edge pixels bridged within one segment
    pub max_gap: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            threshold: 100,
            min_length: 100.0,
            max_gap: 10,
        }
    }
}

/// Detected line segment in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Segment {
    /// Euclidean length
    pub fn length(&self) -> f32 {
        let dx = (self.x2 - self.x1) as f32;
        let dy = (self.y2 - self.y1) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Absolute horizontal extent
    pub fn dx(&self) -> i32 {
        (self.x2 - self.x1).abs()
    }

    /// Absolute vertical extent
    pub fn dy(&self) -> i32 {
        (self.y2 - self.y1).abs()
    }

    /// Midpoint x coordinate
    pub fn midpoint_x(&self) -> i32 {
        (self.x1 + self.x2) / 2
    }
}

/// Extract line segments from a binary edge map (non-zero pixels are
/// edges).
pub fn detect_segments(edges: &GrayImage, params: &HoughParams) -> Vec<Segment> {
    let (w, h) = edges.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let mut points: Vec<(i32, i32)> = Vec::new();
    let mut mask = vec![false; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            if edges.get_pixel(x, y)[0] > 0 {
                points.push((x as i32, y as i32));
                mask[(y * w + x) as usize] = true;
            }
        }
    }
    if points.is_empty() {
        return Vec::new();
    }

    // Fixed-seed shuffle keeps segment extraction reproducible across runs
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    for i in (1..points.len()).rev() {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let j = ((state >> 33) as usize) % (i + 1);
        points.swap(i, j);
    }

    let diag = f64::from(w).hypot(f64::from(h)).ceil() as i32;
    let n_rho = (2 * diag + 1) as usize;
    let mut accum = Array2::<i32>::zeros((THETA_STEPS, n_rho));

    let mut sin_t = [0.0f64; THETA_STEPS];
    let mut cos_t = [0.0f64; THETA_STEPS];
    for (t, (s, c)) in sin_t.iter_mut().zip(cos_t.iter_mut()).enumerate() {
        let angle = t as f64 * std::f64::consts::PI / THETA_STEPS as f64;
        *s = angle.sin();
        *c = angle.cos();
    }

    let mut voted = vec![false; (w * h) as usize];
    let mut segments = Vec::new();

    let pixel_index = |x: i32, y: i32| (y as u32 * w + x as u32) as usize;
    let rho_index = |x: i32, y: i32, t: usize| -> usize {
        let rho = x as f64 * cos_t[t] + y as f64 * sin_t[t];
        (rho.round() as i32 + diag) as usize
    };

    for &(px, py) in &points {
        // Skip points consumed by an earlier segment
        if !mask[pixel_index(px, py)] {
            continue;
        }

        voted[pixel_index(px, py)] = true;
        let mut best_votes = 0;
        let mut best_theta = 0usize;
        for t in 0..THETA_STEPS {
            let r = rho_index(px, py, t);
            accum[[t, r]] += 1;
            if accum[[t, r]] > best_votes {
                best_votes = accum[[t, r]];
                best_theta = t;
            }
        }
        if best_votes < params.threshold {
            continue;
        }

        // Unit direction along the candidate line, scaled so the dominant
        // axis steps one pixel at a time
        let dir_x = -sin_t[best_theta];
        let dir_y = cos_t[best_theta];
        let scale = dir_x.abs().max(dir_y.abs());
        let step_x = dir_x / scale;
        let step_y = dir_y / scale;

        let mut line_pixels: Vec<(i32, i32)> = vec![(px, py)];
        let mut endpoints = [(px, py); 2];
        for (end, sign) in endpoints.iter_mut().zip([1.0f64, -1.0]) {
            let mut fx = px as f64;
            let mut fy = py as f64;
            let mut gap = 0u32;
            loop {
                fx += step_x * sign;
                fy += step_y * sign;
                let xi = fx.round() as i32;
                let yi = fy.round() as i32;
                if xi < 0 || yi < 0 || xi >= w as i32 || yi >= h as i32 {
                    break;
                }
                if mask[pixel_index(xi, yi)] {
                    gap = 0;
                    *end = (xi, yi);
                    line_pixels.push((xi, yi));
                } else {
                    gap += 1;
                    if gap > params.max_gap {
                        break;
                    }
                }
            }
        }

        let segment = Segment {
            x1: endpoints[1].0,
            y1: endpoints[1].1,
            x2: endpoints[0].0,
            y2: endpoints[0].1,
        };
        if segment.length() < params.min_length {
            continue;
        }

        // Consume the traced pixels and retract any votes they cast
        for &(qx, qy) in &line_pixels {
            let qi = pixel_index(qx, qy);
            if !mask[qi] {
                continue;
            }
            mask[qi] = false;
            if voted[qi] {
                voted[qi] = false;
                for t in 0..THETA_STEPS {
                    let r = rho_index(qx, qy, t);
                    accum[[t, r]] -= 1;
                }
            }
        }

        segments.push(segment);
    }

    debug!(
        edge_points = points.len(),
        segments = segments.len(),
        "line extraction complete"
    );
    segments
}
