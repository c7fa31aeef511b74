//! Every per-frame threshold, derived from the motion state and the config.
//!
//! `MotionPolicy::compute` is pure: it can be called without a running engine to inspect how
//! sensitive jam detection is under a given load.

use crate::config::ForceConfig;
use crate::motion::state::{MotionAuthority, UnifiedMotionState};
use crate::num::{clamp01, smoothstep};
use serde::Serialize;

/// Settle-ladder transition bands. These are load independent on purpose: they only depend on
/// normalized speed/correction, never on node count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SettleBands {
    pub moving_temp: f64,
    pub moving_speed: f64,
    pub moving_correction: f64,
    pub cooling_temp: f64,
    pub cooling_speed: f64,
    pub cooling_correction: f64,
    pub micro_speed: f64,
    pub micro_correction: f64,
    pub sleep_speed: f64,
    pub sleep_correction: f64,
    pub sleep_jitter: f64,
    pub micro_kill_strength: f64,
}

impl SettleBands {
    pub const DEFAULT: Self = Self {
        moving_temp: 0.5,
        moving_speed: 0.2,
        moving_correction: 0.2,
        cooling_temp: 0.2,
        cooling_speed: 0.05,
        cooling_correction: 0.05,
        micro_speed: 0.01,
        micro_correction: 0.01,
        sleep_speed: 0.01,
        sleep_correction: 0.01,
        sleep_jitter: 0.01,
        micro_kill_strength: 0.1,
    };
}

impl Default for SettleBands {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Drag handoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InteractionBands {
    pub local_boost_frames: u32,
    pub local_boost_strength: f64,
    pub local_boost_radius: f64,
    pub release_damping: f64,
    pub max_release_speed: f64,
}

/// Temperature ramps that fade the correction passes in and out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassGates {
    /// `smoothstep(0.72, 0.9, T)`: only the hottest, earliest phase of a layout.
    pub early_expansion: f64,
    /// `smoothstep(0.55, 0.75, T)`. No pass reads it; reported for hosts that gate their own
    /// expansion-phase forces.
    pub expansion: f64,
    /// `smoothstep(0.05, 0.2, T)`.
    pub diffusion: f64,
    pub micro_slip: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassGeometry {
    pub density_radius: f64,
    pub density_threshold: usize,
    /// How close to its rest length an edge must be to count as "satisfied".
    pub rest_epsilon: f64,
    /// Pairs closer than this are skipped (no stable edge direction).
    pub min_pair_distance: f64,
    /// A neighborhood moving faster than this is drifting, not locked.
    pub delock_max_group_speed: f64,
    pub micro_slip_cooldown_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionPolicy {
    pub distance_epsilon: f64,
    pub speed_epsilon: f64,
    pub stuck_speed_epsilon: f64,
    pub stuck_force_epsilon: f64,
    /// `(min, max)` rotation in radians for angular decoherence.
    pub decoherence_angle: (f64, f64),
    pub gates: PassGates,
    pub geometry: PassGeometry,
    pub settle: SettleBands,
    pub interaction: InteractionBands,
    pub link_rest_length: f64,
}

impl MotionPolicy {
    pub fn compute(
        state: &UnifiedMotionState,
        config: &ForceConfig,
        max_velocity_effective: f64,
    ) -> Self {
        let density = clamp01(state.density);
        let t = state.temperature;
        let max_velocity = config.max_velocity.max(0.0);

        let distance_epsilon = (config.min_node_distance * 0.001).max(0.001);
        let speed_epsilon = (max_velocity * 0.00125).max(1e-4);
        let stuck_speed_epsilon = (max_velocity * 0.00625).max(1e-4);
        let stuck_force_epsilon = (0.8 * config.spring_stiffness).max(1e-4);

        let crowding = 0.7 + 0.6 * density;
        let decoherence_angle = (
            0.5_f64.to_radians() * crowding,
            1.5_f64.to_radians() * crowding,
        );

        let diffusion = smoothstep(0.05, 0.2, t);
        let gates = PassGates {
            early_expansion: smoothstep(0.72, 0.9, t),
            expansion: smoothstep(0.55, 0.75, t),
            diffusion,
            micro_slip: diffusion,
        };

        let geometry = PassGeometry {
            density_radius: config.density_radius,
            density_threshold: config.density_threshold,
            rest_epsilon: (config.min_node_distance * 0.05).max(distance_epsilon),
            min_pair_distance: 0.1,
            delock_max_group_speed: (max_velocity * 0.025).max(speed_epsilon),
            micro_slip_cooldown_ms: config.micro_slip_cooldown_ms,
        };

        let authority_factor = match state.authority {
            MotionAuthority::Dragged => 1.0,
            MotionAuthority::Normal => 0.85,
            MotionAuthority::Sleeping => 0.7,
        };
        let effective_cap = if max_velocity_effective.is_finite() && max_velocity_effective > 0.0
        {
            max_velocity_effective
        } else {
            max_velocity
        };
        let interaction = InteractionBands {
            local_boost_frames: 8 + (4.0 * density).round() as u32,
            local_boost_strength: (1.0 + 0.5 * density) * authority_factor,
            local_boost_radius: config.min_node_distance * (1.5 + density),
            release_damping: 0.6 - 0.2 * density,
            max_release_speed: (0.5 * max_velocity * (1.0 - 0.4 * density)).min(effective_cap),
        };

        Self {
            distance_epsilon,
            speed_epsilon,
            stuck_speed_epsilon,
            stuck_force_epsilon,
            decoherence_angle,
            gates,
            geometry,
            settle: SettleBands::DEFAULT,
            interaction,
            link_rest_length: config.link_rest_length,
        }
    }
}
