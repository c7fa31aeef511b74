//! Energy, density and stuckness gates.

use crate::num::{clamp01, is_finite};

/// Energy ramps below this are treated as closed.
pub const GATE_FLOOR: f64 = 0.01;
/// Closure floor for the diffusion-ramped passes.
pub const MICRO_GATE_FLOOR: f64 = 0.001;

#[inline]
pub fn is_dense(neighbor_count: usize, threshold: usize) -> bool {
    neighbor_count >= threshold
}

#[inline]
pub fn is_open(gate: f64, floor: f64) -> bool {
    is_finite(gate) && gate > floor
}

/// 1 when a value is zero, falling linearly to 0 at `eps`.
#[inline]
pub fn below_ramp(value: f64, eps: f64) -> f64 {
    clamp01(1.0 - value / eps)
}

/// Jam score in `[0, 1]`: the node is neither moving nor being pushed.
#[inline]
pub fn stuckness(speed: f64, force: f64, speed_eps: f64, force_eps: f64) -> f64 {
    below_ramp(speed, speed_eps) * below_ramp(force, force_eps)
}
