//! Settle ladder: `Moving -> Cooling -> MicroKill -> Sleep`.

use crate::config::ForceConfig;
use crate::graph::Node;
use crate::motion::{MotionAuthority, MotionPolicy, UnifiedMotionState};
use crate::num::hypot;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettleState {
    #[default]
    Moving,
    Cooling,
    #[serde(rename = "microkill")]
    MicroKill,
    Sleep,
}

impl SettleState {
    /// States in which the micro-correction passes are allowed to run.
    pub fn allows_corrections(self) -> bool {
        matches!(self, Self::Moving | Self::Cooling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SettleDebugStats {
    pub settle_state: SettleState,
    pub time_to_sleep_ms: f64,
    pub jitter_avg: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SettleFrame<'a> {
    pub motion: &'a UnifiedMotionState,
    pub policy: &'a MotionPolicy,
    pub config: &'a ForceConfig,
    pub dragged: Option<usize>,
    pub dt: f64,
    pub max_velocity_effective: f64,
}

/// Cross-frame ladder state.
#[derive(Debug, Clone, Default)]
pub struct SettleLadder {
    state: SettleState,
    state_ms: f64,
    jitter_avg: f64,
    // Last sampled `(x, y)` per node slot; `None` until the slot has been seen once.
    position_cache: Vec<Option<(f64, f64)>>,
}

impl SettleLadder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SettleState {
        self.state
    }

    pub fn state_ms(&self) -> f64 {
        self.state_ms
    }

    pub fn jitter_avg(&self) -> f64 {
        self.jitter_avg
    }

    /// Drops the position samples (call after the node arena is rebuilt).
    pub fn reset_positions(&mut self) {
        self.position_cache.clear();
    }

    pub fn apply(&mut self, nodes: &mut [Node], frame: &SettleFrame<'_>) -> SettleDebugStats {
        let bands = &frame.policy.settle;
        let min_distance = frame.config.min_node_distance.max(1.0);
        let speed_scale = frame.max_velocity_effective.max(1.0);

        let mut speed_sum = 0.0;
        let mut correction_sum = 0.0;
        let mut counted = 0usize;
        for n in nodes.iter() {
            if !n.is_finite() {
                continue;
            }
            speed_sum += n.speed();
            if n.last_correction_mag.is_finite() {
                correction_sum += n.last_correction_mag;
            }
            counted += 1;
        }
        let (avg_speed, avg_correction) = if counted > 0 {
            (speed_sum / counted as f64, correction_sum / counted as f64)
        } else {
            (0.0, 0.0)
        };
        let speed_norm = avg_speed / speed_scale;
        let correction_norm = avg_correction / min_distance;
        let temperature = frame.motion.temperature;

        let next = if temperature > bands.moving_temp
            || speed_norm > bands.moving_speed
            || correction_norm > bands.moving_correction
        {
            SettleState::Moving
        } else if temperature > bands.cooling_temp
            || speed_norm > bands.cooling_speed
            || correction_norm > bands.cooling_correction
        {
            SettleState::Cooling
        } else if speed_norm > bands.micro_speed || correction_norm > bands.micro_correction {
            SettleState::MicroKill
        } else {
            SettleState::Sleep
        };

        if next != self.state {
            self.state = next;
            self.state_ms = 0.0;
        } else {
            self.state_ms += frame.dt * 1000.0;
        }

        self.sample_jitter(nodes);

        let jitter_norm = self.jitter_avg / min_distance;
        let damp = 1.0 - bands.micro_kill_strength;
        let threshold = frame.config.sleep_frames_threshold;
        let dragged_authority = frame.motion.authority == MotionAuthority::Dragged;

        for (idx, n) in nodes.iter_mut().enumerate() {
            if n.is_fixed || frame.dragged == Some(idx) {
                continue;
            }

            if matches!(next, SettleState::MicroKill | SettleState::Sleep) {
                n.vx *= damp;
                n.vy *= damp;
            }

            if next != SettleState::Sleep || dragged_authority {
                n.sleep_frames = 0;
                n.is_sleeping = false;
                continue;
            }

            let node_speed_norm = n.speed() / speed_scale;
            let node_correction_norm = n.last_correction_mag / min_distance;
            let should_sleep = node_speed_norm < bands.sleep_speed
                && node_correction_norm < bands.sleep_correction
                && jitter_norm < bands.sleep_jitter;

            if should_sleep {
                n.sleep_frames = n.sleep_frames.saturating_add(1);
                if n.sleep_frames >= threshold {
                    n.is_sleeping = true;
                    n.vx = 0.0;
                    n.vy = 0.0;
                }
            } else {
                n.sleep_frames = 0;
                n.is_sleeping = false;
            }
        }

        SettleDebugStats {
            settle_state: self.state,
            time_to_sleep_ms: self.state_ms,
            jitter_avg: self.jitter_avg,
        }
    }

    fn sample_jitter(&mut self, nodes: &[Node]) {
        if self.position_cache.len() != nodes.len() {
            self.position_cache.resize(nodes.len(), None);
        }

        let mut jitter_sum = 0.0;
        for (slot, n) in self.position_cache.iter_mut().zip(nodes) {
            if !(n.x.is_finite() && n.y.is_finite()) {
                continue;
            }
            if let Some((px, py)) = *slot {
                jitter_sum += hypot(n.x - px, n.y - py);
            }
            *slot = Some((n.x, n.y));
        }
        let frame_avg = if nodes.is_empty() {
            0.0
        } else {
            jitter_sum / nodes.len() as f64
        };
        self.jitter_avg = self.jitter_avg * 0.9 + frame_avg * 0.1;
    }
}
