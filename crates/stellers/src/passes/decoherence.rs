use super::gates::{GATE_FLOOR, is_open};
use super::relative_velocity::with_speed;
use super::{PassContext, PassKind, PassStats};
use crate::graph::Node;
use crate::hash::{hash_str, unit_fraction};

/// Angular velocity decoherence (micro-vorticity seeding).
///
/// Same shape as phase diffusion but with the seedless hash, parity sign, and the wider,
/// density-scaled `decoherence_angle` band, so a dense core swirls instead of translating.
pub fn apply_angular_velocity_decoherence(nodes: &mut [Node], ctx: &PassContext<'_>) -> PassStats {
    let mut stats = PassStats::new(PassKind::AngularDecoherence);
    let strength = ctx.policy.gates.early_expansion;
    if !is_open(strength, GATE_FLOOR) {
        return stats;
    }
    let (min_angle, max_angle) = ctx.policy.decoherence_angle;
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

        let h = hash_str(&node.id);
        let angle = (min_angle + unit_fraction(h) * (max_angle - min_angle)) * strength;
        let theta = if h % 2 == 0 { angle } else { -angle };
        let (sin, cos) = theta.sin_cos();
        let (before_vx, before_vy) = (node.vx, node.vy);
        let vx = before_vx * cos - before_vy * sin;
        let vy = before_vx * sin + before_vy * cos;
        (node.vx, node.vy) = with_speed(vx, vy, speed);

        stats.record(node.vx - before_vx, node.vy - before_vy);
    }

    stats
}
