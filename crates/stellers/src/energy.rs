/// Exponential cooling envelope a host can use to derive the per-frame `energy` and velocity cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyEnvelope {
    pub energy: f64,
    pub force_scale: f64,
    pub effective_damping: f64,
    pub max_velocity_effective: f64,
}

impl EnergyEnvelope {
    /// Time constant of the decay, in seconds.
    pub const TAU: f64 = 0.3;
    const BASE_DAMPING: f64 = 0.3;
    const MAX_DAMPING: f64 = 0.98;

    /// Envelope at `lifecycle` seconds since the layout started. Energy never reaches zero.
    pub fn at(lifecycle: f64) -> Self {
        let energy = (-lifecycle.max(0.0) / Self::TAU).exp();
        Self {
            energy,
            force_scale: energy,
            effective_damping: Self::BASE_DAMPING
                + (Self::MAX_DAMPING - Self::BASE_DAMPING) * (1.0 - energy),
            max_velocity_effective: 50.0 + 1450.0 * energy,
        }
    }
}
