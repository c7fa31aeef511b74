use super::gates::{GATE_FLOOR, is_open, stuckness};
use super::{PassContext, PassKind, PassStats};
use crate::graph::Node;
use crate::hash::{hash_str, pair_key};
use crate::num::safe_divide;
use rustc_hash::FxHashSet;

/// Shear magnitude (px/frame) at full gate and full stuckness.
const BASE_SLIP: f64 = 0.03;
const MIN_STUCKNESS: f64 = 0.1;
/// Relative-velocity threshold as a fraction of `stuck_speed_epsilon`.
const REL_SPEED_FRACTION: f64 = 0.6;
const OPPOSING_CORRECTION_EPS: f64 = 1e-4;

/// Edge shear stagnation escape.
///
/// A spring sitting at its rest length with both endpoints still and unpushed has a null
/// gradient: nothing will ever move it. This applies an equal-and-opposite impulse perpendicular
/// to the edge (never along it), sized by how stuck the pair is. The sign comes from a hash of
/// the canonical id pair, flipped when it would fight the constraint solver's last corrections.
pub fn apply_edge_shear_stagnation_escape(nodes: &mut [Node], ctx: &PassContext<'_>) -> PassStats {
    let mut stats = PassStats::new(PassKind::EdgeShearEscape);
    let gate = ctx.policy.gates.early_expansion;
    if !is_open(gate, GATE_FLOOR) {
        return stats;
    }

    let geometry = &ctx.policy.geometry;
    let speed_eps = ctx.policy.stuck_speed_epsilon;
    let force_eps = ctx.policy.stuck_force_epsilon;
    let rel_eps = speed_eps * REL_SPEED_FRACTION;
    let base_slip = BASE_SLIP * gate;

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
        let dx = target.x - source.x;
        let dy = target.y - source.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < geometry.min_pair_distance {
            continue;
        }

        let rest = link.rest_length(ctx.policy.link_rest_length);
        if (dist - rest).abs() > geometry.rest_epsilon {
            continue;
        }

        let (ex, ey) = (safe_divide(dx, dist), safe_divide(dy, dist));
        let (px, py) = (-ey, ex);

        let rel_vx = target.vx - source.vx;
        let rel_vy = target.vy - source.vy;
        let rel_along = (rel_vx * ex + rel_vy * ey).abs();
        let rel_perp = (rel_vx * px + rel_vy * py).abs();
        if rel_along >= rel_eps || rel_perp >= rel_eps {
            continue;
        }

        if !ctx.cooled_down(source) || !ctx.cooled_down(target) {
            continue;
        }

        let src_force = source.force_mag();
        let tgt_force = target.force_mag();
        if src_force >= force_eps && tgt_force >= force_eps {
            continue;
        }

        let avg_speed = (source.speed() + target.speed()) / 2.0;
        let avg_force = (src_force + tgt_force) / 2.0;
        let stuck = stuckness(avg_speed, avg_force, rel_eps, force_eps);
        if stuck < MIN_STUCKNESS {
            continue;
        }

        let slip = base_slip * stuck;
        let mut sign = if hash_str(&pair_key(&source.id, &target.id)) % 2 == 0 {
            1.0
        } else {
            -1.0
        };

        // Source receives +impulse, target -impulse. If that opposes the solver's last
        // corrections on balance, shear the other way instead.
        let (sx, sy) = (px * slip * sign, py * slip * sign);
        let assist = sx * source.last_correction_dx + sy * source.last_correction_dy
            - sx * target.last_correction_dx
            - sy * target.last_correction_dy;
        if assist < -OPPOSING_CORRECTION_EPS {
            sign = -sign;
        }

        let (ix, iy) = (px * slip * sign, py * slip * sign);
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
