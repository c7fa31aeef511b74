use super::gates::{GATE_FLOOR, is_open};
use super::relative_velocity::with_speed;
use super::{PassContext, PassKind, PassStats};
use crate::graph::Node;
use crate::hash::{PHASE_DIFFUSION_SEED, hash_str_seeded, unit_fraction};

const MIN_ANGLE_DEG: f64 = 0.3;
const MAX_ANGLE_DEG: f64 = 0.8;

/// Signed rotation (radians) for a node at full gate. Derived only from the id, so the same node
/// always turns the same way by the same amount.
pub fn phase_offset(id: &str) -> f64 {
    let h = hash_str_seeded(id, PHASE_DIFFUSION_SEED);
    let min = MIN_ANGLE_DEG.to_radians();
    let max = MAX_ANGLE_DEG.to_radians();
    let angle = min + unit_fraction(h) * (max - min);
    if (h >> 1) % 2 == 0 { angle } else { -angle }
}

/// Local phase diffusion.
///
/// Dense cores can lock into synchronized oscillation and form rings instead of diffusing.
/// Rotating each moving dense node by a small id-derived angle decorrelates the phase while
/// keeping |v| exact.
pub fn apply_local_phase_diffusion(nodes: &mut [Node], ctx: &PassContext<'_>) -> PassStats {
    let mut stats = PassStats::new(PassKind::PhaseDiffusion);
    let strength = ctx.policy.gates.early_expansion;
    if !is_open(strength, GATE_FLOOR) {
        return stats;
    }
    let min_speed = ctx.policy.speed_epsilon;

    for i in 0..nodes.len() {
        if ctx.is_excluded(i, &nodes[i]) || !ctx.is_dense(i) {
            continue;
        }
        let node = &mut nodes[i];
        let speed = node.speed();
        if speed < min_speed {
            continue;
        }

        let theta = phase_offset(&node.id) * strength;
        let (sin, cos) = theta.sin_cos();
        let (before_vx, before_vy) = (node.vx, node.vy);
        let vx = before_vx * cos - before_vy * sin;
        let vy = before_vx * sin + before_vy * cos;
        (node.vx, node.vy) = with_speed(vx, vy, speed);

        stats.record(node.vx - before_vx, node.vy - before_vy);
    }

    stats
}
