//! Density-gated velocity corrections that break jammed configurations.
//!
//! Every pass mutates velocities in place and reports a [`PassStats`]. None of them can fail:
//! a gate that is not satisfied simply leaves the node or edge untouched for the frame.

use crate::graph::{Node, ResolvedLink};
use crate::motion::MotionPolicy;
use serde::Serialize;

pub mod decoherence;
pub mod delocking;
pub mod density;
pub mod edge_shear;
pub mod gates;
pub mod inertia;
pub mod phase_diffusion;
pub mod relative_velocity;
pub mod static_friction;

pub use decoherence::apply_angular_velocity_decoherence;
pub use delocking::apply_dense_core_velocity_delocking;
pub use density::DensityField;
pub use edge_shear::apply_edge_shear_stagnation_escape;
pub use inertia::apply_dense_core_inertia_relaxation;
pub use phase_diffusion::apply_local_phase_diffusion;
pub use static_friction::apply_static_friction_bypass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PassKind {
    VelocityDeLocking,
    InertiaRelax,
    AngularDecoherence,
    PhaseDiffusion,
    EdgeShearEscape,
    StaticFrictionBypass,
}

impl PassKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::VelocityDeLocking => "VelocityDeLocking",
            Self::InertiaRelax => "InertiaRelax",
            Self::AngularDecoherence => "AngularDecoherence",
            Self::PhaseDiffusion => "PhaseDiffusion",
            Self::EdgeShearEscape => "EdgeShearEscape",
            Self::StaticFrictionBypass => "StaticFrictionBypass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassStats {
    pub pass: PassKind,
    pub nodes_affected: usize,
    pub velocity_delta_sum: f64,
}

impl PassStats {
    pub fn new(pass: PassKind) -> Self {
        Self {
            pass,
            nodes_affected: 0,
            velocity_delta_sum: 0.0,
        }
    }

    pub(crate) fn record(&mut self, dvx: f64, dvy: f64) -> bool {
        let d = crate::num::hypot(dvx, dvy);
        if d > 0.0 {
            self.velocity_delta_sum += d;
            self.nodes_affected += 1;
            true
        } else {
            false
        }
    }
}

/// Read-only inputs shared by the passes of one frame.
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    pub links: &'a [ResolvedLink],
    pub policy: &'a MotionPolicy,
    pub density: &'a DensityField,
    /// Arena index of the node the user is holding.
    pub dragged: Option<usize>,
    /// Engine clock, used for the pairwise micro-slip cooldown.
    pub now_ms: f64,
    pub angular_decoherence: bool,
}

impl PassContext<'_> {
    /// Nodes no pass may write to: fixed, held, asleep, or carrying non-finite state.
    pub fn is_excluded(&self, idx: usize, node: &Node) -> bool {
        node.is_fixed || node.is_sleeping || self.dragged == Some(idx) || !node.is_finite()
    }

    pub fn is_dense(&self, idx: usize) -> bool {
        gates::is_dense(
            self.density.neighbor_count(idx),
            self.policy.geometry.density_threshold,
        )
    }

    pub(crate) fn cooled_down(&self, node: &Node) -> bool {
        match node.last_micro_slip_ms {
            Some(t) => self.now_ms - t >= self.policy.geometry.micro_slip_cooldown_ms,
            None => true,
        }
    }
}

/// Runs the correction passes in their fixed order. Later passes read velocities written by
/// earlier ones, so the order is part of the contract.
pub fn run_correction_passes(nodes: &mut [Node], ctx: &PassContext<'_>) -> Vec<PassStats> {
    let mut out = Vec::with_capacity(6);
    out.push(apply_dense_core_velocity_delocking(nodes, ctx));
    out.push(apply_dense_core_inertia_relaxation(nodes, ctx));
    if ctx.angular_decoherence {
        out.push(apply_angular_velocity_decoherence(nodes, ctx));
    }
    out.push(apply_local_phase_diffusion(nodes, ctx));
    out.push(apply_edge_shear_stagnation_escape(nodes, ctx));
    out.push(apply_static_friction_bypass(nodes, ctx));
    out
}
