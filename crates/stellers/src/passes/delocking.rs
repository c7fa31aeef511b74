use super::gates::{MICRO_GATE_FLOOR, is_open};
use super::relative_velocity::{average_neighbor_velocity, project_velocity};
use super::{PassContext, PassKind, PassStats};
use crate::graph::Node;
use crate::num::{hypot, in_range, safe_divide};

/// Fraction of the aligned velocity component removed at full strength.
const PARALLEL_REDUCTION: f64 = 0.2;

/// Dense-core velocity de-locking (micro-slip).
///
/// A dense node moving with its neighborhood as one rigid body keeps its perpendicular
/// velocity but loses part of the component parallel to the neighborhood's mean velocity, so the
/// cluster can shear instead of drifting as a unit. This intentionally removes energy.
pub fn apply_dense_core_velocity_delocking(nodes: &mut [Node], ctx: &PassContext<'_>) -> PassStats {
    let mut stats = PassStats::new(PassKind::VelocityDeLocking);
    let strength = ctx.policy.gates.early_expansion;
    if !is_open(strength, MICRO_GATE_FLOOR) {
        return stats;
    }

    let reduction = PARALLEL_REDUCTION * strength;
    let min_group_speed = ctx.policy.speed_epsilon;
    let max_group_speed = ctx.policy.geometry.delock_max_group_speed;

    for i in 0..nodes.len() {
        if ctx.is_excluded(i, &nodes[i]) || !ctx.is_dense(i) {
            continue;
        }
        let Some((avg_vx, avg_vy)) = average_neighbor_velocity(nodes, ctx.density.neighbors(i))
        else {
            continue;
        };

        // A still group has nothing to unlock; a fast one is travelling, not locked.
        let group_speed = hypot(avg_vx, avg_vy);
        if !in_range(group_speed, min_group_speed, max_group_speed) {
            continue;
        }

        let node = &mut nodes[i];
        let p = project_velocity(
            node.vx,
            node.vy,
            safe_divide(avg_vx, group_speed),
            safe_divide(avg_vy, group_speed),
        );
        let (before_vx, before_vy) = (node.vx, node.vy);
        node.vx = p.perp_x + p.parallel_x * (1.0 - reduction);
        node.vy = p.perp_y + p.parallel_y * (1.0 - reduction);
        stats.record(node.vx - before_vx, node.vy - before_vy);
    }

    stats
}
