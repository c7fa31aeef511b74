use super::gates::{MICRO_GATE_FLOOR, is_open, stuckness};
use super::relative_velocity::relative_velocity;
use super::{PassContext, PassKind, PassStats};
use crate::graph::Node;
use crate::hash::cmp_utf16;
use crate::num::safe_divide;
use std::cmp::Ordering;
use rustc_hash::FxHashSet;

const SLIP_SCALE: f64 = 0.01;
const STUCK_THRESHOLD: f64 = 0.5;

/// Static friction bypass (zero-velocity unlock).
///
/// Connected dense pairs at rest relative to each other get a tiny perpendicular micro-shear,
/// equal and opposite on the two endpoints. The perpendicular's sign comes from comparing the
/// two ids, so a pair always shears the same way. Disabled while the user is dragging.
pub fn apply_static_friction_bypass(nodes: &mut [Node], ctx: &PassContext<'_>) -> PassStats {
    let mut stats = PassStats::new(PassKind::StaticFrictionBypass);
    let strength = ctx.policy.gates.micro_slip;
    if !is_open(strength, MICRO_GATE_FLOOR) || ctx.dragged.is_some() {
        return stats;
    }

    let micro_slip = SLIP_SCALE * strength;
    let speed_eps = ctx.policy.stuck_speed_epsilon;
    let force_eps = ctx.policy.stuck_force_epsilon;
    let rel_eps = ctx.policy.speed_epsilon;
    let min_dist = ctx.policy.geometry.min_pair_distance;

    let mut processed: FxHashSet<(usize, usize)> = FxHashSet::default();

    for link in ctx.links {
        let (s, t) = (link.source, link.target);
        if s == t || s >= nodes.len() || t >= nodes.len() {
            continue;
        }
        if !processed.insert((s.min(t), s.max(t))) {
            continue;
        }
        if ctx.is_excluded(s, &nodes[s]) || ctx.is_excluded(t, &nodes[t]) {
            continue;
        }
        if !ctx.is_dense(s) && !ctx.is_dense(t) {
            continue;
        }

        let (source, target) = (&nodes[s], &nodes[t]);
        let src_stuck = stuckness(source.speed(), source.force_mag(), speed_eps, force_eps);
        let tgt_stuck = stuckness(target.speed(), target.force_mag(), speed_eps, force_eps);
        if src_stuck < STUCK_THRESHOLD && tgt_stuck < STUCK_THRESHOLD {
            continue;
        }
        if !ctx.cooled_down(source) || !ctx.cooled_down(target) {
            continue;
        }

        let (rvx, rvy) = relative_velocity(source, target);
        if crate::num::hypot(rvx, rvy) >= rel_eps {
            continue;
        }

        let dx = target.x - source.x;
        let dy = target.y - source.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < min_dist {
            continue;
        }

        let sign = if cmp_utf16(&source.id, &target.id) == Ordering::Less {
            1.0
        } else {
            -1.0
        };
        let ix = -safe_divide(dy, dist) * sign * micro_slip;
        let iy = safe_divide(dx, dist) * sign * micro_slip;

        nodes[s].vx += ix;
        nodes[s].vy += iy;
        nodes[t].vx -= ix;
        nodes[t].vy -= iy;
        nodes[s].last_micro_slip_ms = Some(ctx.now_ms);
        nodes[t].last_micro_slip_ms = Some(ctx.now_ms);

        stats.record(ix, iy);
        stats.record(-ix, -iy);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ResolvedLink;
    use crate::passes::DensityField;
    use crate::passes::test_support::{cluster, ctx, policy};

    #[test]
    fn perpendicular_sign_follows_id_order() {
        let mut nodes = cluster("a", 0.0, 0.0, 4);
        let b0 = nodes.len();
        nodes.extend(cluster("b", 50.0, 0.0, 4));
        let forward = vec![ResolvedLink {
            source: 0,
            target: b0,
            length: None,
        }];
        let field = DensityField::compute(&nodes, 30.0);
        let p = policy(1.0);

        let mut a = nodes.clone();
        let stats = apply_static_friction_bypass(&mut a, &ctx(&forward, &p, &field));
        assert_eq!(stats.nodes_affected, 2);
        // "a0" < "b0": source gets +perp = +y for an edge along +x.
        assert!((a[0].vy - 0.01).abs() < 1e-12);
        assert!((a[b0].vy + 0.01).abs() < 1e-12);

        // Reversing the link flips both the edge direction and the id sign: same motion.
        let backward = vec![ResolvedLink {
            source: b0,
            target: 0,
            length: None,
        }];
        let mut b = nodes.clone();
        apply_static_friction_bypass(&mut b, &ctx(&backward, &p, &field));
        assert_eq!(a[0].vy, b[0].vy);
        assert_eq!(a[b0].vy, b[b0].vy);
    }

    #[test]
    fn moving_pairs_are_left_alone() {
        let mut nodes = cluster("a", 0.0, 0.0, 4);
        let b0 = nodes.len();
        nodes.extend(cluster("b", 50.0, 0.0, 4));
        nodes[0].vx = 0.3;
        let links = vec![ResolvedLink {
            source: 0,
            target: b0,
            length: None,
        }];
        let field = DensityField::compute(&nodes, 30.0);
        let p = policy(1.0);
        let stats = apply_static_friction_bypass(&mut nodes, &ctx(&links, &p, &field));
        assert_eq!(stats.nodes_affected, 0);
    }
}
