// src/geometry.rs - Planar vector helpers shared by feature extraction and strum detection
use nalgebra::Vector2;
use tracing::warn;

use crate::landmarks::Landmark;

/// Euclidean distance on the image plane. Depth is ignored.
pub fn distance(p1: &Vector2<f64>, p2: &Vector2<f64>) -> f64 {
    (p1 - p2).norm()
}

/// Angle between two vectors in degrees.
///
/// Returns 180° when either vector has zero length, so callers never see NaN.
pub fn angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> f64 {
    let mag1 = v1.norm();
    let mag2 = v2.norm();

    if mag1 == 0.0 || mag2 == 0.0 || !mag1.is_finite() || !mag2.is_finite() {
        return 180.0;
    }

    let cos_angle = (v1.dot(v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// `a - b` on the image plane; `(0, 0)` if either landmark is incomplete.
pub fn vector_from(a: &Landmark, b: &Landmark) -> Vector2<f64> {
    match (a.planar(), b.planar()) {
        (Some(a), Some(b)) => a - b,
        _ => {
            warn!("Incomplete landmark in vector_from: {:?} / {:?}", a.0, b.0);
            Vector2::zeros()
        }
    }
}

/// Clamp `value` into `[in_min, in_max]` and rescale linearly onto `[out_min, out_max]`.
///
/// Output ranges may be inverted (`out_min > out_max`), which is how strum speed
/// maps a faster swing onto a shorter note spacing.
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if in_max == in_min {
        return out_min;
    }
    let (lo, hi) = if in_min < in_max { (in_min, in_max) } else { (in_max, in_min) };
    let clamped = value.clamp(lo, hi);
    out_min + (clamped - in_min) * (out_max - out_min) / (in_max - in_min)
}
