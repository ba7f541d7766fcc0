//! Baked Catmull-Rom path
//!
//! The spline is sampled once into a dense polyline with a cumulative
//! arc-length table, so "where is distance D" is a binary search plus a lerp:
//! - `samples[k]`: world point of the k-th sample
//! - `cum_len[k]`: path length from the first sample to `samples[k]`

use glam::Vec2;

use crate::consts::MIN_PATH_SEGMENTS;
use crate::error::ChainError;

/// A spline path parameterized by arc length
#[derive(Debug, Clone)]
pub struct SplinePath {
    samples: Vec<Vec2>,
    cum_len: Vec<f32>,
    total_length: f32,
}

impl SplinePath {
    /// Bake `segments` samples per span across the control points
    ///
    /// Span `i` runs from `control_points[i + 1]` to `control_points[i + 2]`,
    /// so the first and last control points only shape the tangents.
    pub fn bake(control_points: &[Vec2], segments: u32) -> Result<Self, ChainError> {
        if control_points.len() < 4 {
            return Err(ChainError::TooFewControlPoints {
                found: control_points.len(),
            });
        }
        let segments = segments.max(MIN_PATH_SEGMENTS);
        let spans = control_points.len() - 3;

        let mut samples: Vec<Vec2> = Vec::with_capacity(spans * segments as usize + 1);
        let mut cum_len = Vec::with_capacity(samples.capacity());
        let mut total_length = 0.0;

        for (i, window) in control_points.windows(4).enumerate() {
            // Shared boundary sample between spans is emitted once
            let first = if i == 0 { 0 } else { 1 };
            for j in first..=segments {
                let t = j as f32 / segments as f32;
                let p = catmull_rom(t, window[0], window[1], window[2], window[3]);
                if let Some(&prev) = samples.last() {
                    total_length += prev.distance(p);
                }
                samples.push(p);
                cum_len.push(total_length);
            }
        }

        log::debug!(
            "Baked path: {} spans, {} samples, length {:.3}",
            spans,
            samples.len(),
            total_length
        );

        Ok(Self {
            samples,
            cum_len,
            total_length,
        })
    }

    /// Total arc length of the baked polyline
    #[inline]
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn samples(&self) -> &[Vec2] {
        &self.samples
    }

    /// World point at arc-length `distance`, clamped to the path
    pub fn position_at(&self, distance: f32) -> Vec2 {
        let distance = crate::clamp_distance(distance, 0.0, self.total_length);

        let j = self.first_at_or_after(distance);
        if j == 0 {
            return self.samples[0];
        }
        let i = j - 1;

        let seg_start = self.cum_len[i];
        let seg_len = self.cum_len[j] - seg_start;
        let u = if seg_len > 1e-6 {
            (distance - seg_start) / seg_len
        } else {
            0.0
        };
        self.samples[i].lerp(self.samples[j], u)
    }

    /// Arc-length distance and world point on the path closest to `point`
    ///
    /// Linear scan over the polyline segments, projecting onto each one.
    pub fn closest_distance(&self, point: Vec2) -> (f32, Vec2) {
        let mut best_dist = 0.0;
        let mut best_point = self.samples[0];
        let mut best_sqr = point.distance_squared(best_point);

        for i in 0..self.samples.len() - 1 {
            let a = self.samples[i];
            let b = self.samples[i + 1];
            let ab = b - a;
            let len_sqr = ab.length_squared();
            let u = if len_sqr > 1e-12 {
                ((point - a).dot(ab) / len_sqr).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let candidate = a + ab * u;
            let sqr = point.distance_squared(candidate);
            if sqr < best_sqr {
                best_sqr = sqr;
                best_point = candidate;
                best_dist = self.cum_len[i] + (self.cum_len[i + 1] - self.cum_len[i]) * u;
            }
        }

        (best_dist, best_point)
    }

    /// First index whose cumulative length is `>= distance`
    fn first_at_or_after(&self, distance: f32) -> usize {
        self.cum_len
            .partition_point(|&len| len < distance)
            .min(self.cum_len.len() - 1)
    }
}

/// Uniform Catmull-Rom blend between `p1` (t = 0) and `p2` (t = 1)
#[inline]
pub fn catmull_rom(t: f32, p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;

    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}
