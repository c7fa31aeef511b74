use super::gates::{GATE_FLOOR, is_open, stuckness};
use super::relative_velocity::{average_neighbor_velocity, with_speed};
use super::{PassContext, PassKind, PassStats};
use crate::graph::Node;

const RELAX_STRENGTH: f64 = 0.12;
const MIN_STUCKNESS: f64 = 0.1;
const MIN_RESCALE_SPEED: f64 = 0.01;
const MIN_REPORTED_DELTA: f64 = 0.001;

/// Dense-core inertia relaxation.
///
/// Jammed nodes tend to carry the direction of their early momentum and keep re-projecting onto
/// their starting position. This blends their heading toward the local flow and restores the
/// original speed afterwards: energy is unchanged, only directional memory is erased.
pub fn apply_dense_core_inertia_relaxation(nodes: &mut [Node], ctx: &PassContext<'_>) -> PassStats {
    let mut stats = PassStats::new(PassKind::InertiaRelax);
    let gate = ctx.policy.gates.early_expansion;
    if !is_open(gate, GATE_FLOOR) {
        return stats;
    }

    let speed_eps = ctx.policy.stuck_speed_epsilon;
    let force_eps = ctx.policy.stuck_force_epsilon;

    for i in 0..nodes.len() {
        if ctx.is_excluded(i, &nodes[i]) || !ctx.is_dense(i) {
            continue;
        }

        let speed = nodes[i].speed();
        let stuck = stuckness(speed, nodes[i].force_mag(), speed_eps, force_eps);
        if stuck < MIN_STUCKNESS {
            continue;
        }

        let Some((avg_vx, avg_vy)) = average_neighbor_velocity(nodes, ctx.density.neighbors(i))
        else {
            continue;
        };

        let relax = RELAX_STRENGTH * stuck * gate;
        let node = &mut nodes[i];
        let (before_vx, before_vy) = (node.vx, node.vy);
        let vx = before_vx * (1.0 - relax) + avg_vx * relax;
        let vy = before_vy * (1.0 - relax) + avg_vy * relax;

        // Below this there is no heading to rotate, and blending alone would change |v|.
        if crate::num::hypot(vx, vy) <= MIN_RESCALE_SPEED || speed <= MIN_RESCALE_SPEED {
            continue;
        }
        (node.vx, node.vy) = with_speed(vx, vy, speed);

        let (dvx, dvy) = (node.vx - before_vx, node.vy - before_vy);
        if crate::num::hypot(dvx, dvy) > MIN_REPORTED_DELTA {
            stats.record(dvx, dvy);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::DensityField;
    use crate::passes::test_support::{cluster, ctx, policy};

    #[test]
    fn turns_toward_local_flow_without_changing_speed() {
        let mut nodes = cluster("n", 0.0, 0.0, 5);
        for n in &mut nodes[1..] {
            n.vy = 0.3;
        }
        nodes[0].vx = 0.2;
        let before = nodes[0].speed();
        let field = DensityField::compute(&nodes, 30.0);
        let p = policy(1.0);
        let stats = apply_dense_core_inertia_relaxation(&mut nodes, &ctx(&[], &p, &field));

        assert!(stats.nodes_affected >= 1);
        assert!((nodes[0].speed() - before).abs() < 1e-12);
        assert!(nodes[0].vy > 0.0, "heading should rotate toward +y");
    }

    #[test]
    fn pushed_nodes_are_not_stuck() {
        let mut nodes = cluster("n", 0.0, 0.0, 5);
        for n in &mut nodes {
            n.vx = 0.2;
            n.fx = 5.0;
        }
        nodes[1].vy = 0.2;
        let snapshot = nodes.clone();
        let field = DensityField::compute(&nodes, 30.0);
        let p = policy(1.0);
        let stats = apply_dense_core_inertia_relaxation(&mut nodes, &ctx(&[], &p, &field));
        assert_eq!(stats.nodes_affected, 0);
        assert_eq!(nodes, snapshot);
    }
}
