use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Per-frame tunables supplied by the host.
///
/// Field names deserialize from camelCase so a host can hand over the same JSON object it feeds
/// its own integrator; unknown keys are ignored and missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForceConfig {
    /// Hard minimum spacing between nodes (px). Also the normalization unit for correction and
    /// jitter magnitudes.
    pub min_node_distance: f64,
    pub max_velocity: f64,
    pub spring_stiffness: f64,
    pub target_spacing: f64,
    /// Rest length used for links whose own `length` is unset.
    pub link_rest_length: f64,

    pub perf_mode_n_stressed: f64,
    pub perf_mode_n_fatal: f64,
    pub perf_mode_e_stressed: f64,
    pub perf_mode_e_fatal: f64,

    pub sleep_frames_threshold: u32,

    /// Radius of the neighbor scan that classifies a node as "dense".
    pub density_radius: f64,
    /// Minimum neighbor count (strictly inside `density_radius`) for a dense node.
    pub density_threshold: usize,
    /// Minimum time between pairwise micro-slips on the same node.
    pub micro_slip_cooldown_ms: f64,
    /// Enables the angular decoherence pass (off by default).
    pub angular_decoherence: bool,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            min_node_distance: 100.0,
            max_velocity: 80.0,
            spring_stiffness: 1.0,
            target_spacing: 270.0,
            link_rest_length: 93.6,
            perf_mode_n_stressed: 250.0,
            perf_mode_n_fatal: 900.0,
            perf_mode_e_stressed: 1200.0,
            perf_mode_e_fatal: 3000.0,
            sleep_frames_threshold: 30,
            density_radius: 30.0,
            density_threshold: 4,
            micro_slip_cooldown_ms: 1000.0,
            angular_decoherence: false,
        }
    }
}

impl ForceConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let cfg: Self = serde_json::from_value(value)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values that would poison every downstream threshold (NaN, infinities, negative
    /// lengths). Zero is allowed where the policy already floors the value.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("minNodeDistance", self.min_node_distance),
            ("maxVelocity", self.max_velocity),
            ("springStiffness", self.spring_stiffness),
            ("targetSpacing", self.target_spacing),
            ("linkRestLength", self.link_rest_length),
            ("perfModeNStressed", self.perf_mode_n_stressed),
            ("perfModeNFatal", self.perf_mode_n_fatal),
            ("perfModeEStressed", self.perf_mode_e_stressed),
            ("perfModeEFatal", self.perf_mode_e_fatal),
            ("densityRadius", self.density_radius),
            ("microSlipCooldownMs", self.micro_slip_cooldown_ms),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig { field, value });
            }
        }
        Ok(())
    }
}
