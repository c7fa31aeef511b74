//! Numeric guards shared by every pass.

/// `true` when `value` is neither NaN nor infinite.
#[inline]
pub fn is_finite(value: f64) -> bool {
    value.is_finite()
}

#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

#[inline]
pub fn clamp01(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Returns `0.0` instead of dividing by a (near-)zero divisor.
#[inline]
pub fn safe_divide(numerator: f64, divisor: f64) -> f64 {
    if divisor.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / divisor
    }
}

#[inline]
pub fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

/// Hermite ramp from `edge0` to `edge1`. Degenerate (or inverted) edges are widened to a tiny
/// positive span so the ramp stays a step function instead of producing NaN.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = clamp01((x - edge0) / (edge1 - edge0).max(0.0001));
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn hypot(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}
